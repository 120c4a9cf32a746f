use std::cell::RefCell;
use std::cmp::PartialEq;
use std::convert::From;
use std::fmt;
use std::ops::Index;

use super::autograd::Derivative;
use super::functional;
use super::numeric::*;
use super::rc_tensor::*;
use super::tensor_like::*;
use super::tensor_view::*;
use super::utils::global_index;

#[derive(Debug, PartialEq, Clone)]
pub struct SliceRange {
    /// inclusive
    pub(in crate::tensor) start: usize,
    /// exclusive
    pub(in crate::tensor) end: usize,
}

impl SliceRange {
    pub fn new(start: usize, end: usize) -> SliceRange {
        assert!(start <= end);
        SliceRange { start, end }
    }
}

/// The core `struct` in this library: a row-major array of elements, a shape,
/// and the autograd bookkeeping that records how the tensor was produced.
#[derive(Debug, Clone)]
pub struct RawTensor<T>
where
    T: Numeric,
{
    pub(in crate::tensor) array: Vec<T>,
    pub(in crate::tensor) shape: Vec<usize>,
    /// whether gradients should flow to (or through) this tensor
    pub(in crate::tensor) requires_grad: bool,
    pub(in crate::tensor) grad: RefCell<Option<RcTensor<T>>>,
    /// the recorded operation that produced this tensor, if any
    pub(in crate::tensor) grad_fn: Option<Derivative<T>>,
}

impl<T: Numeric> PartialEq for RawTensor<T> {
    // equality is about values, not about how the tensor was computed
    fn eq(&self, other: &Self) -> bool {
        if self.shape != other.shape {
            return false;
        }
        if self.array != other.array {
            return false;
        }
        true
    }
}

impl<T> Default for RawTensor<T>
where
    T: Numeric,
{
    fn default() -> Self {
        RawTensor {
            array: vec![],
            shape: vec![],
            requires_grad: false,
            grad: RefCell::new(None),
            grad_fn: None,
        }
    }
}

impl<T> From<T> for RawTensor<T>
where
    T: Numeric,
{
    fn from(value: T) -> Self {
        RawTensor {
            array: vec![value],
            shape: vec![],
            ..Default::default()
        }
    }
}

impl<T, U> From<Vec<U>> for RawTensor<T>
where
    T: Numeric,
    RawTensor<T>: From<U>,
{
    fn from(value: Vec<U>) -> RawTensor<T> {
        let tensors: Vec<_> = value.into_iter().map(RawTensor::from).collect();
        let (arrays, shapes): (Vec<_>, Vec<_>) =
            tensors.into_iter().map(|t| (t.array, t.shape)).unzip();
        if shapes.is_empty() {
            return RawTensor {
                array: vec![],
                shape: vec![0],
                ..Default::default()
            };
        }
        let valid = shapes.iter().all(|shape| *shape == shapes[0]);
        assert!(valid, "nested sequences must all have the same shape");

        let array = arrays.into_iter().flat_map(|arr| arr.into_iter()).collect();
        let mut shape = vec![shapes.len()];
        shape.extend_from_slice(&shapes[0]);
        RawTensor {
            array,
            shape,
            ..Default::default()
        }
    }
}

impl<T, U, const N: usize> From<[U; N]> for RawTensor<T>
where
    T: Numeric,
    RawTensor<T>: From<U>,
    U: Clone,
{
    fn from(value: [U; N]) -> RawTensor<T> {
        From::from(value.to_vec())
    }
}

impl<T> RawTensor<T>
where
    T: Numeric,
{
    pub fn is_scalar(&self) -> bool {
        self.array.len() == 1 && self.shape.is_empty()
    }

    pub(in crate::tensor) fn new_empty(shape: Vec<usize>) -> RawTensor<T> {
        let total = shape.iter().product();
        RawTensor {
            array: Vec::with_capacity(total),
            shape,
            ..Default::default()
        }
    }

    /// Note! Passing an empty shape constructs a scalar.
    pub fn new_with_filler(shape: Vec<usize>, filler: T) -> RawTensor<T> {
        if shape.is_empty() {
            return RawTensor {
                array: vec![filler],
                shape,
                ..Default::default()
            };
        }
        let total = shape.iter().product();
        RawTensor {
            array: vec![filler; total],
            shape,
            ..Default::default()
        }
    }

    pub fn scalar(scalar: T) -> RawTensor<T> {
        RawTensor {
            array: vec![scalar],
            shape: vec![],
            ..Default::default()
        }
    }

    pub fn new(array: Vec<T>, shape: Vec<usize>) -> RawTensor<T> {
        let len: usize = shape.iter().product();
        assert_eq!(
            len,
            array.len(),
            "shape {:?} does not describe an array of {} elements",
            shape,
            array.len(),
        );
        RawTensor {
            array,
            shape,
            ..Default::default()
        }
    }

    pub(in crate::tensor) fn set(&mut self, index: &Vec<usize>, value: T) -> Result<(), String> {
        match global_index(index, &self.shape, None) {
            Ok(global_idx) => {
                self.array[global_idx] = value;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub(in crate::tensor) fn get(&self, index: &Vec<usize>) -> Result<&T, String> {
        match global_index(index, &self.shape, None) {
            Ok(global_idx) => Ok(&self.array[global_idx]),
            Err(e) => Err(e),
        }
    }

    pub(super) fn get_with_offset(
        &self,
        index: &Vec<usize>,
        offset: &Vec<SliceRange>,
    ) -> Result<&T, String> {
        match global_index(index, &self.shape, Some(offset)) {
            Ok(global_idx) => Ok(&self.array[global_idx]),
            Err(e) => Err(e),
        }
    }
}

impl<T> Index<&Vec<usize>> for RawTensor<T>
where
    T: Numeric,
{
    type Output = T;

    fn index(&self, index: &Vec<usize>) -> &Self::Output {
        self.get(index).unwrap()
    }
}

impl<T> Neg for &RawTensor<T>
where
    T: Numeric + Neg<Output = T>,
{
    type Output = RawTensor<T>;
    fn neg(self) -> Self::Output {
        let mut result = RawTensor::new_empty(self.shape.clone());
        for &v in self.array.iter() {
            result.array.push(-v);
        }
        result
    }
}

fn fmt_slice<T: Numeric>(f: &mut fmt::Formatter<'_>, array: &[T], shape: &[usize]) -> fmt::Result {
    if shape.len() == 1 {
        write!(f, "[")?;
        for (i, v) in array.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    } else {
        let chunk = if shape[0] == 0 {
            0
        } else {
            array.len() / shape[0]
        };
        write!(f, "[")?;
        for i in 0..shape[0] {
            if i > 0 {
                write!(f, ",\n ")?;
            }
            fmt_slice(f, &array[i * chunk..(i + 1) * chunk], &shape[1..])?;
        }
        write!(f, "]")
    }
}

impl<T: Numeric> fmt::Display for RawTensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.is_empty() {
            if self.array.is_empty() {
                return write!(f, "[]");
            }
            return write!(f, "{}", self.array[0]);
        }
        fmt_slice(f, &self.array, &self.shape)
    }
}

impl<T> TensorLikePrivate for RawTensor<T> where T: Numeric {}
impl<T> TensorLike for RawTensor<T>
where
    T: Numeric,
{
    type Elem = T;
    type ShapeReturn<'a> = &'a Vec<usize> where Self: 'a;
    type TensorRef<'tensor> = &'tensor RawTensor<Self::Elem> where Self: 'tensor;
    type ResultTensorType<'a> = RawTensor<T> where Self: 'a;
    type SumType = Self;
    type GradType = RcTensor<T>;

    fn shape(&self) -> Self::ShapeReturn<'_> {
        &self.shape
    }

    fn sum(&self) -> Self::SumType {
        let total = self.array.iter().fold(T::zero(), |acc, &x| acc + x);
        RawTensor::scalar(total)
    }

    fn tensor(&self) -> Self::TensorRef<'_> {
        self
    }

    fn to_tensor(&self) -> RcTensor<Self::Elem> {
        RcTensor::from_raw(self.clone())
    }

    fn slice(&self, offset: Vec<SliceRange>) -> TensorView<T> {
        TensorView::new(RcTensor::from_raw(self.clone()), offset)
    }

    fn get(&self, index: &Vec<usize>) -> Result<&Self::Elem, String> {
        self.get(index)
    }

    fn bmm<U>(&self, right: &U) -> Self::ResultTensorType<'_>
    where
        U: TensorLike<Elem = Self::Elem>,
    {
        functional::bmm_raw(self, right)
    }
}

impl<T, U> Add<&U> for &RcTensor<T>
where
    T: Numeric,
    U: TensorLike<Elem = T>,
{
    type Output = RcTensor<T>;
    fn add(self, right: &U) -> Self::Output {
        functional::add(self, right)
    }
}

impl<T> Add<RcTensor<T>> for RcTensor<T>
where
    T: Numeric,
{
    type Output = RcTensor<T>;
    fn add(self, right: RcTensor<T>) -> Self::Output {
        functional::add(&self, &right)
    }
}

impl<T, U> Sub<&U> for &RcTensor<T>
where
    T: Numeric + Neg<Output = T>,
    U: TensorLike<Elem = T>,
{
    type Output = RcTensor<T>;
    fn sub(self, right: &U) -> Self::Output {
        functional::sub(self, right)
    }
}

impl<T> Sub<RcTensor<T>> for RcTensor<T>
where
    T: Numeric + Neg<Output = T>,
{
    type Output = RcTensor<T>;
    fn sub(self, right: RcTensor<T>) -> Self::Output {
        functional::sub(&self, &right)
    }
}

#[test]
fn test_nested_from_keeps_row_major_order() {
    let tensor = RawTensor::from([[[1, 2], [3, 4]], [[5, 6], [7, 8]]]);
    assert_eq!(tensor.shape(), &vec![2, 2, 2]);
    assert_eq!(tensor.array, (1..9).collect::<Vec<_>>());
}

#[test]
fn test_display_nests_brackets() {
    let matrix = RawTensor::from([[1, 2], [3, 4]]);
    assert_eq!(format!("{}", matrix), "[[1, 2],\n [3, 4]]");
    assert_eq!(format!("{}", RawTensor::scalar(7)), "7");
}

#[test]
#[should_panic]
fn test_new_rejects_mismatched_shape() {
    RawTensor::new(vec![1, 2, 3], vec![2, 2]);
}
