//! A small tensor library with reverse-mode automatic differentiation,
//! in the spirit of the big frameworks but readable in an afternoon.

pub mod nn;
pub mod optim;
pub mod tensor;
