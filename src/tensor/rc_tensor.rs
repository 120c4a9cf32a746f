use std::rc::Rc;

use std::cell::RefCell;
use std::cmp::PartialEq;
use std::convert::From;
use std::fmt;
use std::ops::{Deref, Index};

use num::traits::real::Real;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use super::autograd::Derivative;
use super::functional;
use super::numeric::*;
use super::raw_tensor::*;
use super::tensor_like::*;
use super::tensor_view::*;
use super::types::*;

/// A cheaply clonable handle to a tensor. All operations produce and consume
/// these; cloning one clones the `Rc`, not the data.
#[derive(Debug, PartialEq, Clone)]
pub struct RcTensor<T: Numeric>(pub(in crate::tensor) Rc<RawTensor<T>>);

impl<T> Deref for RcTensor<T>
where
    T: Numeric,
{
    type Target = RawTensor<T>;

    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

impl<T: Numeric> RcTensor<T> {
    pub fn is_scalar(&self) -> bool {
        self.0.array.len() == 1 && self.0.shape.is_empty()
    }

    pub(in crate::tensor) fn from_raw(raw_tensor: RawTensor<T>) -> RcTensor<T> {
        RcTensor(Rc::new(raw_tensor))
    }

    pub fn new_with_filler(shape: Vec<usize>, filler: T) -> RcTensor<T> {
        RcTensor::from_raw(RawTensor::new_with_filler(shape, filler))
    }

    pub fn scalar(scalar: T) -> RcTensor<T> {
        RcTensor::from_raw(RawTensor::scalar(scalar))
    }

    pub fn new(array: Vec<T>, shape: Vec<usize>) -> RcTensor<T> {
        RcTensor::from_raw(RawTensor::new(array, shape))
    }

    /// A tensor of the given shape filled with standard normal samples.
    /// Seed the rng yourself if you want reproducible values.
    pub fn randn<R: Rng>(shape: Vec<usize>, rng: &mut R) -> RcTensor<T>
    where
        StandardNormal: Distribution<T>,
    {
        let length = shape.iter().product();
        let array = (0..length).map(|_| rng.sample(StandardNormal)).collect();
        RcTensor::new(array, shape)
    }

    /// Wrap a tensor for gradient tracking. The result is a leaf: it keeps
    /// the values but none of the history, and `backward()` accumulates
    /// gradients into its `grad`.
    pub fn variable(tensor: RcTensor<T>, requires_grad: bool) -> RcTensor<T> {
        let mut raw = tensor.0.deref().clone();
        raw.grad_fn = None;
        raw.grad = RefCell::new(None);
        raw.requires_grad = requires_grad;
        RcTensor::from_raw(raw)
    }

    /// The values of this tensor, cut loose from the graph that produced
    /// them. Anything built on the result cannot reach this tensor's
    /// ancestors during backpropagation.
    pub fn detach(&self) -> RcTensor<T> {
        let mut raw = self.0.deref().clone();
        raw.grad_fn = None;
        raw.grad = RefCell::new(None);
        raw.requires_grad = false;
        RcTensor::from_raw(raw)
    }

    /// The wrapped values without any computation history.
    pub fn data(&self) -> RcTensor<T> {
        self.detach()
    }

    pub fn requires_grad(&self) -> bool {
        self.0.requires_grad
    }

    /// The operation that produced this tensor, or `None` for leaves and
    /// for results no gradient needs to flow through.
    pub fn grad_fn(&self) -> Option<&Derivative<T>> {
        self.0.grad_fn.as_ref()
    }

    /// Run backpropagation from this tensor, which must hold a single
    /// element. Gradients accumulate into the leaves that require them.
    pub fn backward(&self) {
        assert_eq!(
            self.count(),
            1,
            "backward() needs a scalar output, got shape {:?}",
            self.shape(),
        );
        match self.0.grad_fn.as_ref() {
            Some(derivative) => derivative.compute_jvp(vec![RcTensor::new_with_filler(
                self.shape().clone(),
                T::one(),
            )]),
            None => panic!("called backward() on a tensor with no recorded history"),
        }
    }

    pub fn opt_grad(&self) -> Option<RcTensor<T>> {
        self.0.grad.borrow().clone()
    }

    pub fn grad(&self) -> RcTensor<T> {
        match self.opt_grad() {
            Some(grad) => grad,
            None => panic!("no gradient has been computed for this tensor, run backward() first"),
        }
    }

    pub fn view(&self, shape: Vec<SliceRange>) -> TensorView<T> {
        TensorView::new(self.clone(), shape)
    }

    /// Index along the first axis: a vector yields a scalar, a matrix a row,
    /// a 3D tensor a matrix. The result is a detached copy.
    pub fn select(&self, index: usize) -> RcTensor<T> {
        let shape = self.shape().clone();
        assert!(!shape.is_empty(), "cannot index into a scalar");
        assert!(
            index < shape[0],
            "index {index} is out of bounds for an axis of size {}",
            shape[0],
        );
        let mut offset = Vec::with_capacity(shape.len());
        offset.push(SliceRange::new(index, index + 1));
        for &dim in shape.iter().skip(1) {
            offset.push(SliceRange::new(0, dim));
        }
        let sub = self.slice(offset).to_tensor();
        // drop the leading axis of size one
        RcTensor::new(sub.0.array.clone(), shape[1..].to_vec())
    }

    /// Reshape into any shape holding the same number of elements. At most
    /// one dimension may be -1, and is inferred from the rest.
    pub fn reshape(&self, dims: &[isize]) -> Result<RcTensor<T>, String> {
        let count = self.count();
        let mut inferred = None;
        let mut known = 1usize;
        for (i, &dim) in dims.iter().enumerate() {
            if dim == -1 {
                if inferred.is_some() {
                    return Err(format!("can only infer one dimension, got {:?}", dims));
                }
                inferred = Some(i);
            } else if dim < 0 {
                return Err(format!("invalid dimension {dim} in shape {:?}", dims));
            } else {
                known *= dim as usize;
            }
        }
        let mut shape: Vec<usize> = dims.iter().map(|&d| d.max(0) as usize).collect();
        match inferred {
            Some(i) => {
                if known == 0 || count % known != 0 {
                    return Err(format!(
                        "cannot infer the missing dimension: {count} elements do not divide into {:?}",
                        dims,
                    ));
                }
                shape[i] = count / known;
            }
            None => {
                if known != count {
                    return Err(format!(
                        "shape {:?} is invalid for an input with {count} elements",
                        dims,
                    ));
                }
            }
        }
        let mut raw = RawTensor::new(self.0.array.clone(), shape);
        if self.requires_grad() {
            raw.requires_grad = true;
            raw.grad_fn = Some(Derivative::new(
                vec![self.clone()],
                functional::reshape_jvp,
                format!("reshape, file: {}, line: {}", file!(), line!()),
            ));
        }
        Ok(RcTensor::from_raw(raw))
    }

    pub(in crate::tensor) fn get_with_offset(
        &self,
        index: &Vec<usize>,
        offset: &Vec<SliceRange>,
    ) -> Result<&T, String> {
        self.deref().get_with_offset(index, offset)
    }
}

impl<T: Numeric + Real> RcTensor<T> {
    pub fn abs(&self) -> RcTensor<T> {
        functional::abs(self)
    }
}

fn sum_jvp<T: Numeric>(inputs: TensorList<T>, grads: TensorList<T>) -> TensorList<T> {
    assert_eq!(inputs.len(), 1);
    assert_eq!(grads.len(), 1);
    assert_eq!(grads[0].count(), 1);
    vec![RcTensor::new_with_filler(
        inputs[0].shape().to_vec(),
        *grads[0].get_first_elem(),
    )]
}

impl<T> TensorLikePrivate for RcTensor<T> where T: Numeric {}
impl<T> TensorLike for RcTensor<T>
where
    T: Numeric,
{
    type Elem = T;
    type ShapeReturn<'a> = &'a Vec<usize> where Self: 'a;
    type TensorRef<'a> = RcTensor<Self::Elem> where Self: 'a;
    type ResultTensorType<'a> = RcTensor<T> where Self: 'a;
    type SumType = Scalar<Self::Elem>;
    type GradType = RcTensor<T>;

    fn update_grad(&self, grad: Self::GradType) {
        let mut current = self.0.grad.borrow_mut();
        let updated = match current.take() {
            // gradients accumulate across backward passes
            Some(existing) => RcTensor::from_raw(functional::add_raw(&existing, &grad)),
            None => grad,
        };
        *current = Some(updated);
    }

    fn zero_grad(&self) {
        *self.0.grad.borrow_mut() = None;
    }

    fn shape(&self) -> Self::ShapeReturn<'_> {
        self.deref().shape()
    }

    fn get(&self, index: &Vec<usize>) -> Result<&Self::Elem, String> {
        self.deref().get(index)
    }

    fn sum(&self) -> Self::SumType {
        let mut raw_scalar = self.0.sum();
        if self.requires_grad() {
            raw_scalar.requires_grad = true;
            raw_scalar.grad_fn = Some(Derivative::new(
                vec![self.clone()],
                sum_jvp,
                format!("sum, file: {}, line: {}", file!(), line!()),
            ));
        }
        Scalar::from_raw(raw_scalar)
    }

    fn tensor(&self) -> Self::TensorRef<'_> {
        self.clone()
    }

    fn to_tensor(&self) -> RcTensor<Self::Elem> {
        self.clone()
    }

    fn slice(&self, offset: Vec<SliceRange>) -> TensorView<T> {
        TensorView::new(self.clone(), offset)
    }

    fn bmm<U>(&self, right: &U) -> Self::ResultTensorType<'_>
    where
        U: TensorLike<Elem = Self::Elem>,
    {
        functional::bmm(self, right)
    }
}

impl<T> From<T> for RcTensor<T>
where
    T: Numeric,
{
    fn from(value: T) -> Self {
        RcTensor::from_raw(RawTensor::from(value))
    }
}

impl<T, U> From<Vec<U>> for RcTensor<T>
where
    T: Numeric,
    RawTensor<T>: From<U>,
{
    fn from(value: Vec<U>) -> RcTensor<T> {
        let tmp = <RawTensor<T> as From<Vec<U>>>::from(value);
        RcTensor::from_raw(tmp)
    }
}

impl<T, U, const N: usize> From<[U; N]> for RcTensor<T>
where
    T: Numeric,
    RawTensor<T>: From<U>,
    U: Clone,
{
    fn from(value: [U; N]) -> RcTensor<T> {
        let raw_tensor = From::from(value.to_vec());
        RcTensor::from_raw(raw_tensor)
    }
}

impl<T, U, V> Mul<U> for RcTensor<T>
where
    T: Numeric,
    U: Deref<Target = V> + Clone + std::fmt::Debug,
    V: TensorLike<Elem = T>,
{
    type Output = RcTensor<T>;

    fn mul(self, right: U) -> Self::Output {
        functional::mul(&self, right)
    }
}

impl<T, U, V> Mul<U> for &RcTensor<T>
where
    T: Numeric,
    U: Deref<Target = V> + Clone + std::fmt::Debug,
    V: TensorLike<Elem = T>,
{
    type Output = RcTensor<T>;

    fn mul(self, right: U) -> Self::Output {
        functional::mul(self, right)
    }
}

impl<T: Numeric> Index<&Vec<usize>> for RcTensor<T> {
    type Output = T;

    fn index(&self, index: &Vec<usize>) -> &Self::Output {
        self.0.deref().index(index)
    }
}

impl<T: Numeric> fmt::Display for RcTensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0.deref(), f)
    }
}

#[test]
fn test_element_wise_multiplication() {
    let left = RcTensor::from([1, 2, 3]);
    let right = RcTensor::from([7, 2, 8]);
    assert_eq!(&left * &right, RcTensor::from([7, 4, 24]));
}

#[test]
fn test_scalar_multiplication() {
    let scalar = RcTensor::scalar(3);
    let tensor = RcTensor::from([1, 2, 3]);
    assert_eq!(&scalar * &tensor, RcTensor::from([3, 6, 9]));
    assert_eq!(&tensor * &scalar, RcTensor::from([3, 6, 9]));
    assert_eq!(tensor * &scalar, RcTensor::from([3, 6, 9]));
}

#[test]
fn test_variable_is_a_tracked_leaf() {
    let x = RcTensor::variable(RcTensor::from([1.0, 2.0]), true);
    assert!(x.requires_grad());
    assert!(x.grad_fn().is_none());
}

#[test]
fn test_grad_accumulates_across_backward_passes() {
    let x = RcTensor::variable(RcTensor::from([1.0, 2.0, 3.0]), true);
    let s = (&x + &x).sum();
    s.backward();
    assert_eq!(x.grad(), RcTensor::from([2.0, 2.0, 2.0]));
    s.backward();
    assert_eq!(x.grad(), RcTensor::from([4.0, 4.0, 4.0]));
    x.zero_grad();
    assert!(x.opt_grad().is_none());
}

#[test]
fn test_select_peels_one_axis() {
    let tensor = RcTensor::from([[[1, 2], [3, 4]], [[5, 6], [7, 8]]]);
    assert_eq!(tensor.select(1), RcTensor::from([[5, 6], [7, 8]]));
    let vector = RcTensor::from([1, 2, 3]);
    assert_eq!(vector.select(2), RcTensor::scalar(3));
}
