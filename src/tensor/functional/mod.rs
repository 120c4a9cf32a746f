mod element_wise_ops;
mod misc;
mod shape_ops;

pub use element_wise_ops::*;
pub use misc::*;
pub use shape_ops::*;
