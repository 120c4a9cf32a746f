use num::traits::real::Real;

use crate::nn::Module;
use crate::tensor::{Neg, Numeric, RcTensor, Scalar};

/// One step of plain stochastic gradient descent: walk every parameter a
/// small step against its accumulated gradient, then install the results as
/// fresh leaves.
pub fn sgd_step<T, M>(module: &mut M, step_size: Scalar<T>)
where
    T: Numeric + Real + Neg<Output = T>,
    M: Module<T>,
{
    let new_params = module
        .params()
        .iter()
        .map(|param| {
            let update = &step_size * &param.grad();
            RcTensor::variable(param - &update, true)
        })
        .collect();
    module.update_params(new_params);
}

#[test]
fn test_sgd_step_moves_against_the_gradient() {
    use crate::nn::Linear;
    use crate::tensor::TensorLike;

    let mut layer = Linear::new(
        RcTensor::from([[1.0, 1.0], [1.0, 1.0]]),
        RcTensor::from([[0.0, 0.0]]),
        None,
    );
    let input = RcTensor::new(vec![1.0, 2.0], vec![1, 2]);
    layer.forward(input).sum().backward();
    sgd_step(&mut layer, RcTensor::scalar(0.5));
    // weight grads are [[1, 1], [2, 2]], bias grads are [[1, 1]]
    assert_eq!(layer.weights, RcTensor::from([[0.5, 0.5], [0.0, 0.0]]));
    assert_eq!(layer.bias, RcTensor::from([[-0.5, -0.5]]));
    assert!(layer.weights.requires_grad());
    assert!(layer.weights.opt_grad().is_none());
}
