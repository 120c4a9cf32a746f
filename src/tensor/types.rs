use crate::tensor::RcTensor;

// Aliases kept for readability while the API is still moving around.
pub type TensorList<T> = Vec<RcTensor<T>>;

pub type Scalar<T> = RcTensor<T>;
