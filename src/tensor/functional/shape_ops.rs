use crate::tensor::autograd::Derivative;
use crate::tensor::numeric::*;
use crate::tensor::utils::IndexIterator;
use crate::tensor::{RawTensor, RcTensor, TensorLike, TensorList};

/// Concatenate tensors along `dim`. All shapes must agree except along `dim`;
/// anything else is reported as an error rather than a panic.
pub fn cat<T: Numeric>(tensors: &[RcTensor<T>], dim: usize) -> Result<RcTensor<T>, String> {
    if tensors.is_empty() {
        return Err("cat: need at least one tensor".to_string());
    }
    let first_shape = tensors[0].shape().to_vec();
    if dim >= first_shape.len() {
        return Err(format!(
            "cat: dimension {dim} is out of range for shape {:?}",
            first_shape,
        ));
    }
    for (i, tensor) in tensors.iter().enumerate().skip(1) {
        let shape = tensor.shape();
        if shape.len() != first_shape.len() {
            return Err(format!(
                "cat: tensor {i} has {} dimensions but expected {}",
                shape.len(),
                first_shape.len(),
            ));
        }
        for (d, (&got, &expected)) in shape.iter().zip(first_shape.iter()).enumerate() {
            if d != dim && got != expected {
                return Err(format!(
                    "cat: tensor {i} has size {got} along dimension {d}, expected {expected}",
                ));
            }
        }
    }

    let mut out_shape = first_shape;
    out_shape[dim] = tensors.iter().map(|t| t.shape()[dim]).sum();
    let mut result = RawTensor::new_with_filler(out_shape, T::zero());
    let mut offset_along_dim = 0;
    for tensor in tensors.iter() {
        if tensor.count() > 0 {
            for idx in IndexIterator::new(tensor.shape().to_vec()) {
                let mut out_idx = idx.clone();
                out_idx[dim] += offset_along_dim;
                let v = *tensor.get(&idx).unwrap();
                if let Err(e) = result.set(&out_idx, v) {
                    panic!("{}", e)
                }
            }
        }
        offset_along_dim += tensor.shape()[dim];
    }
    if tensors.iter().any(|t| t.requires_grad()) {
        result.requires_grad = true;
        result.grad_fn = Some(Derivative::new(
            tensors.to_vec(),
            cat_jvp,
            format!("cat, file: {}, line: {}", file!(), line!()),
        ));
    }
    Ok(RcTensor::from_raw(result))
}

fn cat_jvp<T: Numeric>(inputs: TensorList<T>, grads: TensorList<T>) -> TensorList<T> {
    assert_eq!(grads.len(), 1);
    let grad = grads[0].clone();
    if inputs.len() == 1 {
        return vec![grad];
    }
    // the concatenation axis is the one where the output outgrew the first
    // input; if every axis matches, all the other inputs are empty
    let first_shape = inputs[0].shape().to_vec();
    let dim = grad
        .shape()
        .iter()
        .zip(first_shape.iter())
        .position(|(&g, &f)| g != f)
        .unwrap_or(0);
    let mut offset_along_dim = 0;
    let mut result = Vec::with_capacity(inputs.len());
    for input in inputs.iter() {
        let shape = input.shape().to_vec();
        let mut piece = RawTensor::new_with_filler(shape.clone(), T::zero());
        if input.count() > 0 {
            for idx in IndexIterator::new(shape.clone()) {
                let mut grad_idx = idx.clone();
                grad_idx[dim] += offset_along_dim;
                let pos = crate::tensor::utils::global_index(&idx, &shape, None).unwrap();
                piece.array[pos] = grad[&grad_idx];
            }
        }
        offset_along_dim += shape[dim];
        result.push(RcTensor::from_raw(piece));
    }
    result
}

/// The gradient of a reshape keeps every element in place; the caller gives
/// it back the input's shape.
pub(crate) fn reshape_jvp<T: Numeric>(
    inputs: TensorList<T>,
    grads: TensorList<T>,
) -> TensorList<T> {
    assert_eq!(inputs.len(), 1);
    assert_eq!(grads.len(), 1);
    vec![grads[0].clone()]
}

#[test]
fn test_cat_stacks_rows() {
    let top = RcTensor::from([[1, 2], [3, 4]]);
    let bottom = RcTensor::from([[5, 6]]);
    let stacked = cat(&[top, bottom], 0).unwrap();
    assert_eq!(stacked, RcTensor::from([[1, 2], [3, 4], [5, 6]]));
}

#[test]
fn test_cat_joins_columns() {
    let left = RcTensor::from([[1, 2], [3, 4]]);
    let right = RcTensor::from([[5], [6]]);
    let joined = cat(&[left, right], 1).unwrap();
    assert_eq!(joined, RcTensor::from([[1, 2, 5], [3, 4, 6]]));
}

#[test]
fn test_cat_rejects_mismatched_shapes() {
    let a = RcTensor::from([[1, 2], [3, 4]]);
    let b = RcTensor::from([[1, 2, 3], [4, 5, 6]]);
    let err = cat(&[a, b], 0).unwrap_err();
    assert!(err.contains("size 3 along dimension 1"), "got: {err}");
}

#[test]
fn test_cat_rejects_out_of_range_dim() {
    let a = RcTensor::from([1, 2]);
    assert!(cat(&[a], 1).is_err());
}

#[test]
fn test_cat_gradient_splits_between_inputs() {
    let x = RcTensor::variable(RcTensor::from([[1.0, 2.0], [3.0, 4.0]]), true);
    let y = RcTensor::variable(RcTensor::from([[5.0, 6.0]]), true);
    let joined = cat(&[x.clone(), y.clone()], 0).unwrap();
    joined.sum().backward();
    assert_eq!(x.grad(), RcTensor::new_with_filler(vec![2, 2], 1.0));
    assert_eq!(y.grad(), RcTensor::new_with_filler(vec![1, 2], 1.0));
}

#[test]
fn test_cat_gradient_splits_along_columns() {
    let x = RcTensor::variable(RcTensor::from([[1.0], [2.0]]), true);
    let y = RcTensor::variable(RcTensor::from([[3.0, 4.0], [5.0, 6.0]]), true);
    let joined = cat(&[x.clone(), y.clone()], 1).unwrap();
    // weight the columns so the split is visible
    let weights = RcTensor::from([[1.0, 10.0, 100.0], [1.0, 10.0, 100.0]]);
    (&joined * &weights).sum().backward();
    assert_eq!(x.grad(), RcTensor::from([[1.0], [1.0]]));
    assert_eq!(y.grad(), RcTensor::from([[10.0, 100.0], [10.0, 100.0]]));
}
