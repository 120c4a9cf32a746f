pub mod autograd;
pub mod functional;
mod numeric;
mod raw_tensor;
mod rc_tensor;
mod tensor_like;
mod tensor_view;
mod types;
mod utils;

pub use autograd::Derivative;
pub use numeric::*;
pub use raw_tensor::*;
pub use rc_tensor::*;
pub use tensor_like::*;
pub use tensor_view::*;
pub use types::*;
pub use utils::{ElementIterator, IndexIterator};
