use super::numeric::*;
use crate::tensor::functional;
use crate::tensor::utils::{global_index, ElementIterator};
use crate::tensor::{RawTensor, RcTensor, Scalar, SliceRange, TensorLike, TensorLikePrivate};

use std::cmp::PartialEq;
use std::ops::Index;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct View {
    shape: Vec<usize>,
    offset: Vec<SliceRange>,
}

/// A window into a tensor: the same storage, restricted per-axis.
#[derive(Debug, Clone)]
pub struct TensorView<T>
where
    T: Numeric,
{
    tensor: RcTensor<T>,
    view: Rc<View>,
}

impl<T> Index<&Vec<usize>> for TensorView<T>
where
    T: Numeric,
{
    type Output = T;

    fn index(&self, index: &Vec<usize>) -> &Self::Output {
        self.tensor
            .get_with_offset(index, &self.view.offset)
            .unwrap()
    }
}

impl<T> TensorView<T>
where
    T: Numeric,
{
    pub fn new(tensor: RcTensor<T>, offset: Vec<SliceRange>) -> TensorView<T> {
        assert_eq!(offset.len(), tensor.shape().len());
        let mut shape = Vec::with_capacity(offset.len());
        for (slice_range, &tensor_dim) in offset.iter().zip(tensor.shape().iter()) {
            // NOTE: all intervals are half open, for now.
            assert!(slice_range.end <= tensor_dim);
            shape.push(slice_range.end - slice_range.start);
        }
        TensorView {
            tensor,
            view: View { offset, shape }.into(),
        }
    }
}

impl<T> TensorLikePrivate for TensorView<T> where T: Numeric {}

impl<T> TensorLike for TensorView<T>
where
    T: Numeric,
{
    type Elem = T;
    type ShapeReturn<'a> = &'a Vec<usize> where Self: 'a;
    type TensorRef<'a> = RcTensor<T> where Self: 'a;
    type ResultTensorType<'a> = RcTensor<T> where Self: 'a;
    type SumType = Scalar<Self::Elem>;
    type GradType = RcTensor<T>;

    fn shape(&self) -> Self::ShapeReturn<'_> {
        &self.view.shape
    }

    fn tensor(&self) -> Self::TensorRef<'_> {
        self.tensor.clone()
    }

    fn to_tensor(&self) -> RcTensor<T> {
        let mut array = Vec::with_capacity(self.view.shape.iter().product());
        for elem in ElementIterator::new(self) {
            array.push(elem);
        }
        RcTensor::new(array, self.view.shape.clone())
    }

    fn sum(&self) -> Scalar<Self::Elem> {
        let iter = ElementIterator::new(self);
        let v = iter.fold(Self::Elem::zero(), |acc, x| acc + x);
        Scalar::from(v)
    }

    fn get(&self, index: &Vec<usize>) -> Result<&T, String> {
        let idx = global_index(index, &self.tensor.shape()[..], Some(&self.view.offset))?;
        Ok(&self.tensor.array[idx])
    }

    fn slice(&self, offset: Vec<SliceRange>) -> TensorView<T> {
        TensorView::new(self.tensor(), offset)
    }

    fn bmm<U>(&self, right: &U) -> Self::ResultTensorType<'_>
    where
        U: TensorLike<Elem = Self::Elem>,
    {
        RcTensor::from_raw(functional::bmm_raw(self, right))
    }
}

impl<T, V> PartialEq<V> for TensorView<T>
where
    T: Numeric,
    V: TensorLike<Elem = T>,
{
    fn eq(&self, other: &V) -> bool {
        if *other.shape() != self.view.shape {
            return false;
        }

        for idx in self.iter_indices() {
            if self.get(&idx) != other.get(&idx) {
                return false;
            }
        }
        true
    }
}

#[test]
fn test_sum_tensor_view() {
    let tensor = RawTensor::from([
        [[0, 1, 2, 3], [2, 3, 4, 5], [3, 4, 5, 6]],
        [[0, 1, 2, 3], [2, 3, 4, 5], [3, 4, 5, 6]],
    ]);
    let view = tensor.slice(vec![
        SliceRange::new(0, 2),
        SliceRange::new(1, 2),
        SliceRange::new(2, 4),
    ]);

    assert_eq!(view.sum().elem(), 2 * (4 + 5));
}

#[test]
fn test_view_restricts_shape_and_elements() {
    let tensor = RcTensor::from([[1, 2, 3], [4, 5, 6]]);
    let view = tensor.view(vec![SliceRange::new(1, 2), SliceRange::new(0, 3)]);
    assert_eq!(view.shape(), &vec![1, 3]);
    assert_eq!(view.to_tensor(), RcTensor::from([[4, 5, 6]]));
    assert!(view == RcTensor::from([[4, 5, 6]]));
}
