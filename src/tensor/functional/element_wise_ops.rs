use crate::tensor::numeric::*;

use crate::tensor::autograd::Derivative;
use crate::tensor::utils::{global_index, ElementIterator, IndexIterator};
use crate::tensor::{RawTensor, RcTensor, TensorLike, TensorList};

use num::traits::real::Real;
use rayon::prelude::*;

use std::cmp::max;
use std::ops::Deref;

use itertools::EitherOrBoth::{Both, Left, Right};
use itertools::Itertools;

fn max_shape(left_shape: &[usize], right_shape: &[usize]) -> Vec<usize> {
    let mut max_shape = Vec::with_capacity(max(left_shape.len(), right_shape.len()));
    for pair in left_shape
        .iter()
        .rev()
        .zip_longest(right_shape.iter().rev())
        .rev()
    {
        let dim = match pair {
            Both(&l, &r) => max(l, r),
            Left(&l) => l,
            Right(&r) => r,
        };
        max_shape.push(dim);
    }
    max_shape
}

/// Sum a gradient with a broadcast shape back down to the shape of the input
/// it flowed from.
fn reduce_to_shape<T: Numeric>(grad: &RcTensor<T>, shape: &[usize]) -> RcTensor<T> {
    let mut result = RawTensor::new_with_filler(shape.to_vec(), T::zero());
    for idx in IndexIterator::new(grad.shape().to_vec()) {
        let pos = global_index(&idx, shape, None).unwrap();
        result.array[pos] += grad[&idx];
    }
    RcTensor::from_raw(result)
}

pub(crate) fn add<T, U1, U2, V1, V2>(left: U1, right: U2) -> RcTensor<T>
where
    T: Numeric,
    U1: Deref<Target = V1> + std::fmt::Debug + Clone,
    V1: TensorLike<Elem = T>,
    U2: Deref<Target = V2> + Clone + std::fmt::Debug,
    V2: TensorLike<Elem = T>,
{
    let left_res = left.to_tensor();
    let right_res = right.to_tensor();
    let mut raw_tensor = add_raw(left, right);
    if left_res.requires_grad() || right_res.requires_grad() {
        raw_tensor.requires_grad = true;
        raw_tensor.grad_fn = Some(Derivative::new(
            vec![left_res, right_res],
            add_jvp,
            format!("add, file: {}, line: {}", file!(), line!()),
        ));
    }
    RcTensor::from_raw(raw_tensor)
}

fn add_jvp<T: Numeric>(inputs: TensorList<T>, grads: TensorList<T>) -> TensorList<T> {
    assert_eq!(inputs.len(), 2);
    assert_eq!(grads.len(), 1);
    let grad = grads[0].clone();
    inputs
        .iter()
        .map(|input| reduce_to_shape(&grad, &input.shape()[..]))
        .collect()
}

pub(crate) fn add_raw<T, U1, U2, V1, V2>(left: U1, right: U2) -> RawTensor<T>
where
    T: Numeric,
    U1: Deref<Target = V1> + std::fmt::Debug + Clone,
    V1: TensorLike<Elem = T>,
    U2: Deref<Target = V2> + Clone + std::fmt::Debug,
    V2: TensorLike<Elem = T>,
{
    assert!(
        left.broadcastable(right.shape()),
        "shapes are not broadcastable: {:?} vs {:?}",
        left.shape().to_vec(),
        right.shape().to_vec(),
    );
    let max_shape = max_shape(&left.shape()[..], &right.shape()[..]);
    let index_iter = IndexIterator::new(max_shape.clone());
    let mut result = RawTensor::new_with_filler(max_shape, T::zero());
    for idx in index_iter {
        let v = *left.deref().get(&idx).unwrap() + *right.deref().get(&idx).unwrap();
        if let Err(e) = result.set(&idx, v) {
            panic!("{}", e)
        }
    }
    result
}

pub(crate) fn neg<T, U, V>(tensor_like: U) -> RcTensor<T>
where
    T: Numeric + Neg<Output = T>,
    U: Deref<Target = V> + std::fmt::Debug + Clone,
    V: TensorLike<Elem = T>,
{
    let tensor = tensor_like.to_tensor();
    let mut raw_tensor = -tensor.deref();
    if tensor.requires_grad() {
        raw_tensor.requires_grad = true;
        raw_tensor.grad_fn = Some(Derivative::new(
            vec![tensor.clone()],
            neg_jvp,
            format!("neg, file: {}, line: {}", file!(), line!()),
        ));
    }
    RcTensor::from_raw(raw_tensor)
}

fn neg_jvp<T: Numeric + Neg<Output = T>>(
    inputs: TensorList<T>,
    grads: TensorList<T>,
) -> TensorList<T> {
    assert_eq!(inputs.len(), 1);
    assert_eq!(grads.len(), 1);
    vec![RcTensor::from_raw(-grads[0].deref())]
}

pub(crate) fn sub<T, U1, U2, V1, V2>(left: U1, right: U2) -> RcTensor<T>
where
    T: Numeric + Neg<Output = T>,
    U1: Deref<Target = V1> + std::fmt::Debug + Clone,
    V1: TensorLike<Elem = T>,
    U2: Deref<Target = V2> + Clone + std::fmt::Debug,
    V2: TensorLike<Elem = T>,
{
    let negated = neg(right);
    add(left, &negated)
}

pub(crate) fn mul<T, U1, U2, V1, V2>(left: U1, right: U2) -> RcTensor<T>
where
    T: Numeric,
    U1: Deref<Target = V1> + std::fmt::Debug + Clone,
    V1: TensorLike<Elem = T>,
    U2: Deref<Target = V2> + Clone + std::fmt::Debug,
    V2: TensorLike<Elem = T>,
{
    let left_res = left.to_tensor();
    let right_res = right.to_tensor();
    let mut raw_tensor = mul_raw(&left_res, &right_res);
    if left_res.requires_grad() || right_res.requires_grad() {
        raw_tensor.requires_grad = true;
        raw_tensor.grad_fn = Some(Derivative::new(
            vec![left_res, right_res],
            mul_jvp,
            format!("mul, file: {}, line: {}", file!(), line!()),
        ));
    }
    RcTensor::from_raw(raw_tensor)
}

fn mul_raw<T: Numeric>(left: &RcTensor<T>, right: &RcTensor<T>) -> RawTensor<T> {
    if left.shape().is_empty() {
        return right.left_scalar_multiplication(left.get_first_elem());
    }
    if right.shape().is_empty() {
        return left.right_scalar_multiplication(right.get_first_elem());
    }
    element_wise_multiplication(left, right)
}

fn mul_jvp<T: Numeric>(inputs: TensorList<T>, grads: TensorList<T>) -> TensorList<T> {
    assert_eq!(inputs.len(), 2);
    assert_eq!(grads.len(), 1);
    let (left, right) = (inputs[0].clone(), inputs[1].clone());
    let grad = grads[0].clone();
    // d(l*r)/dl = r and vice versa, summed back down over broadcast axes
    let left_grad = RcTensor::from_raw(mul_raw(&grad, &right));
    let right_grad = RcTensor::from_raw(mul_raw(&grad, &left));
    vec![
        reduce_to_shape(&left_grad, &left.shape()[..]),
        reduce_to_shape(&right_grad, &right.shape()[..]),
    ]
}

pub(crate) fn element_wise_multiplication<T, V1, V2>(left: &V1, right: &V2) -> RawTensor<T>
where
    T: Numeric,
    V1: TensorLike<Elem = T>,
    V2: TensorLike<Elem = T>,
{
    assert!(
        left.same_shape(&right),
        "element-wise multiplication needs matching shapes: {:?} vs {:?}",
        left.shape().to_vec(),
        right.shape().to_vec(),
    );
    let left_shape_vec = left.shape().to_vec();
    let length = left_shape_vec.iter().product();
    let mut array = Vec::with_capacity(length);
    for (x, y) in ElementIterator::new(left).zip(ElementIterator::new(right)) {
        array.push(x * y);
    }
    RawTensor::new(array, left_shape_vec)
}

pub fn tanh<T, U, V>(tensor_like: U) -> RcTensor<T>
where
    T: Numeric + Real,
    U: Deref<Target = V> + std::fmt::Debug + Clone,
    V: TensorLike<Elem = T>,
{
    let tensor = tensor_like.to_tensor();
    let array: Vec<T> = tensor.array.par_iter().map(|&x| x.tanh()).collect();
    let mut raw_tensor = RawTensor::new(array, tensor.shape().clone());
    if tensor.requires_grad() {
        raw_tensor.requires_grad = true;
        raw_tensor.grad_fn = Some(Derivative::new(
            vec![tensor.clone()],
            tanh_jvp,
            format!("tanh, file: {}, line: {}", file!(), line!()),
        ));
    }
    RcTensor::from_raw(raw_tensor)
}

fn tanh_jvp<T: Numeric + Real>(inputs: TensorList<T>, grads: TensorList<T>) -> TensorList<T> {
    assert_eq!(inputs.len(), 1);
    assert_eq!(grads.len(), 1);
    let derivative = tanh_derivative(&inputs[0]);
    vec![RcTensor::from_raw(element_wise_multiplication(
        &grads[0],
        &derivative,
    ))]
}

fn tanh_derivative<T: Numeric + Real>(tensor: &RcTensor<T>) -> RcTensor<T> {
    let array: Vec<T> = tensor
        .array
        .par_iter()
        .map(|&x| T::one() - x.tanh().powi(2))
        .collect();
    RcTensor::new(array, tensor.shape().clone())
}

pub fn relu<T, U, V>(tensor_like: U) -> RcTensor<T>
where
    T: Numeric,
    U: Deref<Target = V> + std::fmt::Debug + Clone,
    V: TensorLike<Elem = T>,
{
    let tensor = tensor_like.to_tensor();
    let array: Vec<T> = tensor
        .array
        .par_iter()
        .map(|&x| if x > T::zero() { x } else { T::zero() })
        .collect();
    let mut raw_tensor = RawTensor::new(array, tensor.shape().clone());
    if tensor.requires_grad() {
        raw_tensor.requires_grad = true;
        raw_tensor.grad_fn = Some(Derivative::new(
            vec![tensor.clone()],
            relu_jvp,
            format!("relu, file: {}, line: {}", file!(), line!()),
        ));
    }
    RcTensor::from_raw(raw_tensor)
}

fn relu_jvp<T: Numeric>(inputs: TensorList<T>, grads: TensorList<T>) -> TensorList<T> {
    assert_eq!(inputs.len(), 1);
    assert_eq!(grads.len(), 1);
    let mask: Vec<T> = inputs[0]
        .array
        .iter()
        .map(|&x| if x > T::zero() { T::one() } else { T::zero() })
        .collect();
    let mask = RcTensor::new(mask, inputs[0].shape().clone());
    vec![RcTensor::from_raw(element_wise_multiplication(
        &grads[0], &mask,
    ))]
}

pub fn abs<T, U, V>(tensor_like: U) -> RcTensor<T>
where
    T: Numeric + Real,
    U: Deref<Target = V> + std::fmt::Debug + Clone,
    V: TensorLike<Elem = T>,
{
    let tensor = tensor_like.to_tensor();
    let array: Vec<T> = tensor.array.par_iter().map(|&x| x.abs()).collect();
    let mut raw_tensor = RawTensor::new(array, tensor.shape().clone());
    if tensor.requires_grad() {
        raw_tensor.requires_grad = true;
        raw_tensor.grad_fn = Some(Derivative::new(
            vec![tensor.clone()],
            abs_jvp,
            format!("abs, file: {}, line: {}", file!(), line!()),
        ));
    }
    RcTensor::from_raw(raw_tensor)
}

fn abs_jvp<T: Numeric + Real>(inputs: TensorList<T>, grads: TensorList<T>) -> TensorList<T> {
    assert_eq!(inputs.len(), 1);
    assert_eq!(grads.len(), 1);
    let sign: Vec<T> = inputs[0].array.iter().map(|&x| x.signum()).collect();
    let sign = RcTensor::new(sign, inputs[0].shape().clone());
    vec![RcTensor::from_raw(element_wise_multiplication(
        &grads[0], &sign,
    ))]
}

#[test]
fn test_add() {
    let tensor1 = RcTensor::new_with_filler(vec![4, 4], 1);
    let tensor2 = RcTensor::new((0..32).collect(), vec![2, 4, 4]);
    let tensor3 = RcTensor::new((1..33).collect(), vec![2, 4, 4]);
    assert_eq!(&tensor2 + &tensor1, tensor3);
    assert_eq!(&tensor1 + &tensor2, tensor3);
    assert_eq!(tensor1 + tensor2, tensor3);
}

#[test]
fn test_add_reduces_gradients_over_broadcast_axes() {
    let x = RcTensor::variable(RcTensor::from([[1.0, 2.0], [3.0, 4.0]]), true);
    let b = RcTensor::variable(RcTensor::from([10.0, 20.0]), true);
    let s = (&x + &b).sum();
    s.backward();
    assert_eq!(x.grad(), RcTensor::new_with_filler(vec![2, 2], 1.0));
    assert_eq!(b.grad(), RcTensor::from([2.0, 2.0]));
}

#[test]
fn test_sum_backward() {
    let input = RcTensor::variable(RcTensor::from([1.0, 2.0, 3.0]), true);
    input.sum().backward();
    assert_eq!(input.grad(), RcTensor::from([1.0, 1.0, 1.0]));
}

#[test]
fn test_mul_gradients() {
    let x = RcTensor::variable(RcTensor::from([2.0, 3.0]), true);
    let y = RcTensor::variable(RcTensor::from([5.0, 7.0]), true);
    let s = (&x * &y).sum();
    s.backward();
    assert_eq!(x.grad(), RcTensor::from([5.0, 7.0]));
    assert_eq!(y.grad(), RcTensor::from([2.0, 3.0]));
}

#[test]
fn test_scalar_mul_gradient_sums_over_the_tensor() {
    let scale = RcTensor::variable(RcTensor::scalar(3.0), true);
    let x = RcTensor::from([1.0, 2.0, 4.0]);
    let s = (&scale * &x).sum();
    s.backward();
    assert_eq!(scale.grad(), RcTensor::scalar(7.0));
}

#[test]
fn test_tanh_matches_numerical_derivative() {
    let values = [0.666, -0.25, 1.5];
    let input = RcTensor::variable(RcTensor::from(values), true);
    tanh(&input).sum().backward();
    let grad = input.grad();
    let epsilon = 1e-6;
    for (i, &v) in values.iter().enumerate() {
        let numerical = ((v + epsilon).tanh() - v.tanh()) / epsilon;
        let analytic = *grad.get(&vec![i]).unwrap();
        assert!(
            (analytic - numerical).abs() < 1e-4,
            "component {i}: analytic={analytic} numerical={numerical}"
        );
    }
}

#[test]
fn test_tanh_of_tanh_chains_the_rule() {
    let v: f64 = 0.666;
    let input = RcTensor::variable(RcTensor::from([v]), true);
    tanh(&tanh(&input)).sum().backward();
    let inner = 1.0 - v.tanh().powi(2);
    let outer = 1.0 - v.tanh().tanh().powi(2);
    let expected = outer * inner;
    let analytic = *input.grad().get(&vec![0]).unwrap();
    assert!((analytic - expected).abs() < 1e-12);
}

#[test]
fn test_relu_masks_gradient() {
    let input = RcTensor::variable(RcTensor::from([-1.0, 2.0]), true);
    relu(&input).sum().backward();
    assert_eq!(input.grad(), RcTensor::from([0.0, 1.0]));
}

#[test]
fn test_abs_gradient_is_the_sign() {
    let input = RcTensor::variable(RcTensor::from([-3.0, 4.0]), true);
    input.abs().sum().backward();
    assert_eq!(input.grad(), RcTensor::from([-1.0, 1.0]));
}

#[test]
fn test_plain_tensors_record_no_history() {
    let x = RcTensor::from([1.0, 2.0]);
    let y = RcTensor::from([3.0, 4.0]);
    let z = &x + &y;
    assert!(z.grad_fn().is_none());
    assert!(!z.requires_grad());
}
