use crate::tensor::numeric::Numeric;
use crate::tensor::raw_tensor::SliceRange;
use crate::tensor::TensorLike;

/// Flatten a multi-dimensional index into a position in the backing array.
///
/// Axes of size 1 broadcast: any index is accepted there and reads element 0.
/// Indices longer than the shape are allowed, the leading entries are
/// ignored. `offset` shifts and bounds the index per-axis, which is how
/// views address their parent tensor.
pub(crate) fn global_index(
    index: &Vec<usize>,
    shape: &[usize],
    offset: Option<&Vec<SliceRange>>,
) -> Result<usize, String> {
    if index.len() < shape.len() {
        return Err(format!(
            "shapes do not match: shape={:?}, index={:?}
            Need index to be at least as long as shape.",
            shape, index,
        ));
    }
    let mut global_idx = 0;
    let mut multiplier = 1;
    for (i, (&dim, &idx_dim)) in shape.iter().rev().zip(index.iter().rev()).enumerate() {
        let i = shape.len() - i - 1;
        if dim == 1 {
            // we pick the 0th element during broadcasting
            continue;
        }
        let (shaped_dim, shifted_idx) = match offset {
            Some(range_vec) => (
                range_vec[i].end - range_vec[i].start,
                range_vec[i].start + idx_dim,
            ),
            None => (dim, idx_dim),
        };
        if shaped_dim <= idx_dim || dim <= shifted_idx {
            return Err(format!(
                "index out of bounds: shape={:?}, index={:?}, offset={:?},
                the {}th position is out-of-bounds!
                shaped_dim={shaped_dim}, shifted_idx={shifted_idx}, dim={dim}, idx_dim={idx_dim}",
                shape, index, offset, i,
            ));
        }
        global_idx += shifted_idx * multiplier;
        multiplier *= dim;
    }
    Ok(global_idx)
}

pub struct ElementIterator<'b, T, U>
where
    U: TensorLike<Elem = T>,
    T: Numeric,
{
    index: Vec<usize>,
    tensor_like: &'b U,
    first: bool,
}

impl<'b, T, U> ElementIterator<'b, T, U>
where
    U: TensorLike<Elem = T>,
    T: Numeric,
{
    pub fn new(tensor_like: &'b U) -> ElementIterator<'b, T, U> {
        ElementIterator {
            index: vec![0; tensor_like.shape().len()],
            tensor_like,
            first: true,
        }
    }
}

impl<'b, T, U> Iterator for ElementIterator<'b, T, U>
where
    U: TensorLike<Elem = T>,
    T: Numeric,
{
    type Item = T;
    fn next(&mut self) -> Option<Self::Item> {
        if self.first {
            self.first = false;
            return Some(*self.tensor_like.get(&self.index).unwrap());
        }
        if increment_index(&mut self.index, &self.tensor_like.shape()[..]) {
            return Some(*self.tensor_like.get(&self.index).unwrap());
        }
        None
    }
}

#[test]
fn test_element_iterator() {
    use crate::tensor::{RcTensor, SliceRange};
    let v = [1, 2, 3];
    let tensor = RcTensor::from(v);
    let view = tensor.view(vec![SliceRange::new(0, 3)]);
    let tensor_element_iterator = ElementIterator::new(&tensor);
    let element_iterator = ElementIterator::new(&view);
    for ((view_elem, tensor_elem), &expected) in
        element_iterator.zip(tensor_element_iterator).zip(v.iter())
    {
        assert_eq!(view_elem, expected);
        assert_eq!(tensor_elem, expected);
    }
}

pub struct IndexIterator {
    index: Vec<usize>,
    dimensions: Vec<usize>,
    first: bool,
}

impl IndexIterator {
    pub fn new(dimensions: Vec<usize>) -> IndexIterator {
        IndexIterator {
            index: vec![0; dimensions.len()],
            dimensions,
            first: true,
        }
    }
}

impl Iterator for IndexIterator {
    type Item = Vec<usize>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.first {
            self.first = false;
            return Some(self.index.clone());
        }
        if increment_index(&mut self.index, &self.dimensions) {
            return Some(self.index.clone());
        }
        None
    }
}

pub(crate) fn increment_index(index: &mut [usize], shape: &[usize]) -> bool {
    let mut carry = 1;
    for i in (0..index.len()).rev() {
        let v = index[i];
        let dim = shape[i];
        while v < dim - 1 && carry > 0 {
            index[i] = v + 1;
            carry -= 1;
        }
        if carry == 0 {
            reset_trailing_indices(index, i);
            return true;
        }
    }
    false
}

fn reset_trailing_indices(index: &mut [usize], position: usize) {
    for idx in index.iter_mut().skip(position + 1) {
        *idx = 0;
    }
}

#[test]
fn test_increment_index() {
    let mut index = vec![0, 0, 0];
    let dimensions = vec![2, 3, 2];
    let indices = vec![
        [0, 0, 1].to_vec(),
        [0, 1, 0].to_vec(),
        [0, 1, 1].to_vec(),
        [0, 2, 0].to_vec(),
        [0, 2, 1].to_vec(),
        [1, 0, 0].to_vec(),
        [1, 0, 1].to_vec(),
        [1, 1, 0].to_vec(),
        [1, 1, 1].to_vec(),
        [1, 2, 0].to_vec(),
        [1, 2, 1].to_vec(),
    ];
    for expected_idx in indices.into_iter() {
        let valid = increment_index(&mut index, &dimensions);
        assert!(valid);
        assert_eq!(index, expected_idx);
    }
}

#[test]
fn test_index_iterator() {
    let index_iter = IndexIterator::new(vec![2, 2, 2]);
    assert_eq!(
        index_iter.collect::<Vec<_>>(),
        vec![
            [0, 0, 0].to_vec(),
            [0, 0, 1].to_vec(),
            [0, 1, 0].to_vec(),
            [0, 1, 1].to_vec(),
            [1, 0, 0].to_vec(),
            [1, 0, 1].to_vec(),
            [1, 1, 0].to_vec(),
            [1, 1, 1].to_vec(),
        ]
    );
}

#[test]
fn test_global_index_broadcasts_unit_axes() {
    let shape = vec![2, 1, 3];
    assert_eq!(global_index(&vec![1, 0, 2], &shape, None).unwrap(), 5);
    // the middle axis has size one, so any index lands on the same element
    assert_eq!(
        global_index(&vec![1, 0, 2], &shape, None).unwrap(),
        global_index(&vec![1, 7, 2], &shape, None).unwrap(),
    );
    // longer indices than the shape are fine, leading entries are ignored
    assert_eq!(global_index(&vec![9, 9, 1, 0, 2], &shape, None).unwrap(), 5);
    assert!(global_index(&vec![2, 0, 0], &shape, None).is_err());
}
