use crate::tensor::autograd::Derivative;
use crate::tensor::numeric::*;
use crate::tensor::{RawTensor, RcTensor, TensorLike, TensorList};

/// A naive batch matrix multiply: the left operand is a matrix or a batch of
/// matrices, the right operand a matrix.
pub(crate) fn bmm_raw<T, V1, V2>(left: &V1, right: &V2) -> RawTensor<T>
where
    T: Numeric,
    V1: TensorLike<Elem = T>,
    V2: TensorLike<Elem = T>,
{
    let left_shape = left.shape().to_vec();
    let right_shape = right.shape().to_vec();
    assert!(
        2 <= left_shape.len() && left_shape.len() <= 3,
        "bmm expects a matrix or a batch of matrices on the left, got shape {:?}",
        left_shape,
    );
    assert_eq!(
        right_shape.len(),
        2,
        "bmm expects a matrix on the right, got shape {:?}",
        right_shape,
    );
    assert_eq!(
        left_shape[left_shape.len() - 1],
        right_shape[0],
        "bmm shapes do not line up: {:?} x {:?}",
        left_shape,
        right_shape,
    );

    let batched = left_shape.len() == 3;
    let new_shape = if batched {
        vec![left_shape[0], left_shape[1], right_shape[1]]
    } else {
        vec![1, left_shape[0], right_shape[1]]
    };

    let mut result = RawTensor::new_empty(new_shape.clone());
    let mut left_index = left_shape.clone();
    let left_index_len = left_index.len();
    let mut right_index = right_shape.clone();
    for batch_idx in 0..new_shape[0] {
        if batched {
            left_index[0] = batch_idx;
        }
        for i in 0..new_shape[1] {
            left_index[left_index_len - 2] = i;
            for j in 0..new_shape[2] {
                right_index[1] = j;
                let mut val = T::zero();
                for k in 0..right_shape[0] {
                    left_index[left_index_len - 1] = k;
                    right_index[0] = k;
                    val = val + *left.get(&left_index).unwrap() * *right.get(&right_index).unwrap();
                }
                result.array.push(val);
            }
        }
    }
    if !batched {
        return RawTensor::new(result.array, new_shape[1..].to_vec());
    }
    result
}

pub(crate) fn bmm<T, U>(left: &RcTensor<T>, right: &U) -> RcTensor<T>
where
    T: Numeric,
    U: TensorLike<Elem = T>,
{
    let right_tensor = right.to_tensor();
    let mut raw_tensor = bmm_raw(left, right);
    if left.requires_grad() || right_tensor.requires_grad() {
        raw_tensor.requires_grad = true;
        raw_tensor.grad_fn = Some(Derivative::new(
            vec![left.clone(), right_tensor],
            bmm_jvp,
            format!("bmm, file: {}, line: {}", file!(), line!()),
        ));
    }
    RcTensor::from_raw(raw_tensor)
}

fn bmm_jvp<T: Numeric>(inputs: TensorList<T>, grads: TensorList<T>) -> TensorList<T> {
    assert_eq!(inputs.len(), 2);
    assert_eq!(grads.len(), 1);
    let (left, right) = (inputs[0].clone(), inputs[1].clone());
    let grad = grads[0].clone();
    assert_eq!(
        left.shape().len(),
        2,
        "bmm gradients are only defined for matrix operands, got shape {:?}",
        left.shape(),
    );
    let (n, k) = (left.shape()[0], left.shape()[1]);
    let m = right.shape()[1];

    // y = l @ r, so dL/dl = g @ r^T and dL/dr = l^T @ g
    let mut left_grad = vec![T::zero(); n * k];
    let mut right_grad = vec![T::zero(); k * m];
    for i in 0..n {
        for j in 0..m {
            let g = grad[&vec![i, j]];
            for p in 0..k {
                left_grad[i * k + p] += g * right[&vec![p, j]];
                right_grad[p * m + j] += left[&vec![i, p]] * g;
            }
        }
    }
    vec![
        RcTensor::new(left_grad, vec![n, k]),
        RcTensor::new(right_grad, vec![k, m]),
    ]
}

#[test]
fn test_bmm_gradients() {
    let x = RcTensor::variable(RcTensor::from([[1.0, 2.0]]), true);
    let w = RcTensor::variable(RcTensor::from([[3.0, 4.0], [5.0, 6.0]]), true);
    let y = x.bmm(&w);
    assert_eq!(y, RcTensor::from([[13.0, 16.0]]));
    y.sum().backward();
    // dL/dx sums each row of w, dL/dw repeats x down the columns
    assert_eq!(x.grad(), RcTensor::from([[7.0, 11.0]]));
    assert_eq!(w.grad(), RcTensor::from([[1.0, 1.0], [2.0, 2.0]]));
}

#[test]
fn test_batched_bmm_keeps_the_batch_axis() {
    let batch = RcTensor::new((0..8).collect(), vec![2, 2, 2]);
    let identity = RcTensor::from([[1, 0], [0, 1]]);
    assert_eq!(batch.bmm(&identity), batch);
}
