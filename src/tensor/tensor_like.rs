use super::numeric::*;
use super::utils::IndexIterator;
use super::{RawTensor, RcTensor, SliceRange, TensorView};
use std::ops::Deref;

pub(in crate::tensor) mod private {
    pub trait TensorLikePrivate {}
}
pub use private::TensorLikePrivate;

/// Everything that behaves like a tensor: owned tensors, shared handles and
/// views. Operations are written against this trait so they work for all
/// three.
pub trait TensorLike: TensorLikePrivate + std::fmt::Debug {
    type Elem: Numeric;
    type ShapeReturn<'a>: Deref<Target = Vec<usize>>
    where
        Self: 'a;
    type TensorRef<'a>: Deref<Target = RawTensor<Self::Elem>>
    where
        Self: 'a;
    type ResultTensorType<'a>: TensorLike
    where
        Self: 'a;
    type SumType: TensorLike<Elem = Self::Elem>;
    type GradType: TensorLike;

    fn update_grad(&self, _grad: Self::GradType) {
        todo!();
    }

    fn zero_grad(&self) {
        todo!();
    }

    /// Look up a single element. Axes of size 1 broadcast, and indices with
    /// more entries than the tensor has axes are accepted (the leading
    /// entries are ignored):
    ///
    /// ```
    /// # use torchlet::tensor::*;
    /// let matrix = RcTensor::new(vec![0, 1, 2, 3], vec![2, 2]);
    /// let tensor = RcTensor::new((0..16).collect(), vec![2, 2, 1, 2, 2]);
    ///
    /// assert_eq!(matrix.get(&vec![0, 1]), matrix.get(&vec![0, 0, 1]));
    /// assert_eq!(
    ///     tensor.get(&vec![0, 0, 0, 0, 1]),
    ///     tensor.get(&vec![0, 0, 10, 0, 1])
    /// );
    /// ```
    fn get(&self, index: &Vec<usize>) -> Result<&Self::Elem, String>;

    #[inline]
    fn get_first_elem(&self) -> &Self::Elem {
        let index = vec![0; self.shape().deref().len()];
        self.get(&index).unwrap()
    }

    fn elem(&self) -> Self::Elem {
        assert!(self.shape().is_empty());
        *self.get_first_elem()
    }

    fn shape(&self) -> Self::ShapeReturn<'_>;

    fn count(&self) -> usize {
        self.shape().iter().product()
    }

    fn sum(&self) -> Self::SumType;

    /// Return a reference to the underlying tensor.
    fn tensor(&self) -> Self::TensorRef<'_>;

    /// Convert self into a new Tensor -- if self is already a Tensor this is
    /// a clone. For a `TensorView` the new Tensor has the shape of the view.
    fn to_tensor(&self) -> RcTensor<Self::Elem>;

    fn slice(&self, offset: Vec<SliceRange>) -> TensorView<Self::Elem>;

    fn left_scalar_multiplication(&self, &scalar: &Self::Elem) -> RawTensor<Self::Elem> {
        let mut result = RawTensor::new_empty(self.shape().to_vec());
        for &elem in self.tensor().array.iter() {
            result.array.push(scalar * elem);
        }
        result
    }

    fn right_scalar_multiplication(&self, &scalar: &Self::Elem) -> RawTensor<Self::Elem> {
        let mut result = RawTensor::new_empty(self.shape().to_vec());
        for &elem in self.tensor().array.iter() {
            result.array.push(elem * scalar);
        }
        result
    }

    /// A naive batch matrix multiply operation.
    ///
    /// ```
    /// # use torchlet::tensor::*;
    /// let matrix = RcTensor::new(vec![0, 1, 2, 3], vec![2, 2]);
    /// let shape = vec![2, 1];
    /// let e1 = RcTensor::new(vec![0, 1], vec![2, 1]);
    /// let e2 = RcTensor::new(vec![1, 0], vec![2, 1]);
    /// let diag = RcTensor::new(vec![1, 1], vec![2, 1]);
    /// let r = matrix.bmm(&diag);
    ///
    /// assert_eq!(r.shape(), &shape);
    /// assert_eq!(r, RcTensor::new(vec![1, 5], shape.clone()));
    /// assert_eq!(matrix.bmm(&e1), RcTensor::new(vec![1, 3], shape.clone()));
    /// assert_eq!(matrix.bmm(&e2), RcTensor::new(vec![0, 2], shape.clone()));
    /// ```
    fn bmm<U>(&self, right: &U) -> Self::ResultTensorType<'_>
    where
        U: TensorLike<Elem = Self::Elem>;

    fn same_shape<U, V>(&self, other: &U) -> bool
    where
        U: Deref<Target = V> + std::fmt::Debug + Clone,
        V: TensorLike<Elem = Self::Elem>,
    {
        *self.shape() == *other.shape()
    }

    fn broadcastable<V: Deref<Target = Vec<usize>>>(&self, new_shape: V) -> bool {
        for (&d1, &d2) in self.shape().iter().rev().zip(new_shape.iter().rev()) {
            if d1 != d2 {
                if d1 == 1 || d2 == 1 {
                    continue;
                }
                return false;
            }
        }
        true
    }

    fn iter_indices(&self) -> IndexIterator {
        IndexIterator::new(self.shape().to_vec())
    }
}
