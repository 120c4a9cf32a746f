use num::traits::real::Real;

use crate::nn::Module;
use crate::tensor::{Numeric, RcTensor, TensorLike, TensorList};

/// A fully connected layer: `activation(x @ weights + bias)`.
#[derive(Debug)]
pub struct Linear<T>
where
    T: Numeric,
{
    pub weights: RcTensor<T>,
    pub bias: RcTensor<T>,
    activation: fn(RcTensor<T>) -> RcTensor<T>,
}

impl<T> Linear<T>
where
    T: Numeric + Real,
{
    pub fn new(
        weights: RcTensor<T>,
        bias: RcTensor<T>,
        activation: Option<fn(RcTensor<T>) -> RcTensor<T>>,
    ) -> Self {
        Linear {
            weights: RcTensor::variable(weights, true),
            bias: RcTensor::variable(bias, true),
            activation: match activation {
                Some(f) => f,
                None => |t| t,
            },
        }
    }
}

impl<T: Numeric> crate::nn::module::private::Private for Linear<T> {}

impl<T: Numeric> Module<T> for Linear<T> {
    type InputType = RcTensor<T>;
    type OutputType = RcTensor<T>;

    fn forward(&self, batch: RcTensor<T>) -> RcTensor<T> {
        let y = batch.bmm(&self.weights);
        (self.activation)(&y + &self.bias)
    }

    fn params(&self) -> TensorList<T> {
        vec![self.weights.clone(), self.bias.clone()]
    }

    fn update_params(&mut self, mut new_params: TensorList<T>) {
        self.bias = new_params.remove(1);
        self.weights = new_params.remove(0);
    }
}

#[test]
fn test_layer_no_grad() {
    let layer = Linear::new(
        RcTensor::new_with_filler(vec![2, 2], 1.0),
        RcTensor::new_with_filler(vec![1, 2], 1.0),
        None,
    );
    let input = RcTensor::new(vec![1.0, 2.0], vec![1, 2]);
    let res = layer.forward(input);
    let expected = RcTensor::new(vec![4.0, 4.0], vec![1, 2]);

    assert_eq!(res, expected);
}

#[test]
fn test_layer_backward_sets_param_grads() {
    let layer = Linear::new(
        RcTensor::from([[1.0, -2.0], [-1.1, 0.7]]),
        RcTensor::new_with_filler(vec![1, 2], 1.0),
        None,
    );
    let input = RcTensor::new(vec![1.0, 2.0], vec![1, 2]);
    let res = layer.forward(input.clone());
    res.sum().backward();
    assert_eq!(layer.bias.grad(), RcTensor::from([[1.0, 1.0]]));
    assert_eq!(layer.weights.grad(), RcTensor::from([[1.0, 1.0], [2.0, 2.0]]));
}

#[test]
fn test_layer_grads_accumulate_over_two_passes() {
    let layer = Linear::new(
        RcTensor::from([[1.0, -2.0], [-1.1, 0.7]]),
        RcTensor::new_with_filler(vec![1, 2], 1.0),
        None,
    );
    let input = RcTensor::new(vec![1.0, 2.0], vec![1, 2]);
    layer.forward(input.clone()).sum().backward();
    layer.forward(input).sum().backward();
    assert_eq!(layer.bias.grad(), RcTensor::from([[2.0, 2.0]]));
}
