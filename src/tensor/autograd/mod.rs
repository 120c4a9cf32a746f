use super::numeric::*;
use crate::tensor::{RcTensor, TensorLike, TensorList};

use std::fmt;

/// One recorded step of history: the tensors an operation consumed and the
/// function that maps the operation's output gradient back onto them.
///
/// Gradients passed through `compute_jvp` always have the shape of the
/// producing operation's output.
#[derive(Clone)]
pub struct Derivative<T: Numeric> {
    inputs: TensorList<T>,
    /// signature: jvp(inputs, output_grads) -> input_grads
    jacobian_vector_product: fn(TensorList<T>, TensorList<T>) -> TensorList<T>,
    debug_info: String,
}

impl<T: Numeric> fmt::Debug for Derivative<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Derivative({})", self.debug_info)
    }
}

impl<T: Numeric> Derivative<T> {
    pub(crate) fn new(
        inputs: TensorList<T>,
        jacobian_vector_product: fn(TensorList<T>, TensorList<T>) -> TensorList<T>,
        debug_info: String,
    ) -> Derivative<T> {
        Derivative {
            inputs,
            jacobian_vector_product,
            debug_info,
        }
    }

    /// The tensors this operation consumed. Following these walks backwards
    /// through the computation graph.
    pub fn inputs(&self) -> &TensorList<T> {
        &self.inputs
    }

    /// Push `outer_grads` one step backwards. Interior results forward the
    /// gradient to their own recorded history; leaves that require grad
    /// accumulate it; everything else is skipped.
    pub(crate) fn compute_jvp(&self, outer_grads: TensorList<T>) {
        let input_grads = (self.jacobian_vector_product)(self.inputs.clone(), outer_grads);
        for (grad, input) in input_grads.iter().zip(self.inputs.iter()) {
            if !input.requires_grad() {
                continue;
            }
            debug_assert_eq!(
                grad.count(),
                input.count(),
                "grad and input must have the same number of elements"
            );
            let shaped_grad = RcTensor::new(grad.0.array.clone(), input.shape().to_vec());
            match input.grad_fn() {
                Some(derivative) => derivative.compute_jvp(vec![shaped_grad]),
                None => input.update_grad(shaped_grad),
            }
        }
    }
}

#[test]
fn test_gradients_reach_leaves_through_shared_inputs() {
    let x = RcTensor::variable(RcTensor::from([1.0, -2.0]), true);
    let y = RcTensor::variable(RcTensor::from([3.0, 5.0]), true);
    // x appears twice, so its gradient is the sum over both paths
    let s = (&(&x + &y) + &x).sum();
    s.backward();
    assert_eq!(x.grad(), RcTensor::from([2.0, 2.0]));
    assert_eq!(y.grad(), RcTensor::from([1.0, 1.0]));
}

#[test]
fn test_untracked_inputs_are_skipped() {
    let x = RcTensor::variable(RcTensor::from([1.0, 2.0]), true);
    let y = RcTensor::from([4.0, 5.0]);
    let s = (&x + &y).sum();
    s.backward();
    assert_eq!(x.grad(), RcTensor::from([1.0, 1.0]));
    assert!(y.opt_grad().is_none());
}
