use torchlet::tensor::functional;
use torchlet::tensor::*;

use rand::prelude::*;

#[test]
fn test_from_vec() {
    let tensor1 = RcTensor::from(vec![vec![0, 1, 2], vec![3, 4, 5]]);
    let tensor2 = RcTensor::new((0..6).collect(), vec![2, 3]);
    assert_eq!(tensor1, tensor2);
}

#[test]
fn test_new_with_filler() {
    let vec = RcTensor::new_with_filler(vec![4], 4);
    let shape = vec.shape();
    assert_eq!(shape, &vec![4]);
    assert_eq!(vec.get(&vec![0]).unwrap(), &4);
}

#[test]
fn test_get_2x2x2() {
    let matrix = RcTensor::new(vec![0, 1, 2, 3, 4, 5, 6, 7], vec![2, 2, 2]);
    assert_eq!(*matrix.get(&vec![0, 0, 0]).unwrap(), 0);
    assert_eq!(*matrix.get(&vec![0, 1, 0]).unwrap(), 2);
    assert_eq!(*matrix.get(&vec![1, 1, 1]).unwrap(), 7);
}

#[test]
fn test_get_3x3() {
    let matrix = RcTensor::new(vec![0, 1, 2, 3, 4, 5, 6, 7, 8], vec![3, 3]);
    let mut prev = -1;
    for i in 0..3 {
        for j in 0..3 {
            let &curr = matrix.get(&vec![i, j]).unwrap();
            assert_eq!(prev + 1, curr);
            prev = curr;
        }
    }
    assert_eq!(matrix.get(&vec![0, 0]).unwrap(), &0);
    assert_eq!(matrix.get(&vec![2, 2]).unwrap(), &8);
}

#[test]
fn test_add_scalar() {
    let val = 42;
    let tensor1 = RcTensor::new((0..32).collect(), vec![2, 4, 4]);
    let tensor2 = RcTensor::new((42..(32 + 42)).collect(), vec![2, 4, 4]);
    let scalar = RcTensor::scalar(val);
    assert_eq!(&tensor1 + &scalar, tensor2);
    assert_eq!(&scalar + &tensor1, tensor2);
}

#[test]
fn test_add() {
    let tensor1 = RcTensor::new_with_filler(vec![4, 4], 1);
    let tensor2 = RcTensor::new((0..32).collect(), vec![2, 4, 4]);
    let tensor3 = RcTensor::new((1..33).collect(), vec![2, 4, 4]);
    assert_eq!(&tensor2 + &tensor1, tensor3);
    assert_eq!(&tensor1 + &tensor2, tensor3);
}

#[test]
fn test_sub() {
    let a = RcTensor::from([5.0, 7.0]);
    let b = RcTensor::from([2.0, 3.0]);
    assert_eq!(&a - &b, RcTensor::from([3.0, 4.0]));
    assert_eq!(a - b, RcTensor::from([3.0, 4.0]));
}

#[test]
fn test_bmm_2x2() {
    let v = vec![0, 1, 2, 3];
    let matrix = RcTensor::new(v, vec![2, 2]);
    let shape = vec![2, 1];
    let e1 = RcTensor::new(vec![0, 1], vec![2, 1]);
    let e2 = RcTensor::new(vec![1, 0], vec![2, 1]);
    let diag = RcTensor::new(vec![1, 1], vec![2, 1]);

    let r = matrix.bmm(&diag);
    assert_eq!(r.shape(), &shape);
    assert_eq!(r, RcTensor::new(vec![1, 5], shape.clone()));
    assert_eq!(matrix.bmm(&e1), RcTensor::new(vec![1, 3], shape.clone()));
    assert_eq!(matrix.bmm(&e2), RcTensor::new(vec![0, 2], shape.clone()));
}

#[test]
fn test_right_scalar_multiplication() {
    let vec = RcTensor::new_with_filler(vec![4], 1);
    assert_eq!(
        vec.right_scalar_multiplication(&42),
        RawTensor::new(vec![42, 42, 42, 42], vec![4])
    );
}

#[test]
fn test_select_matches_the_indexing_story() {
    let v = RcTensor::from([1, 2, 3]);
    let m = RcTensor::from([[1, 2, 3], [4, 5, 6]]);
    let t = RcTensor::from([[[1, 2], [3, 4]], [[5, 6], [7, 8]]]);
    assert_eq!(v.select(0), RcTensor::scalar(1));
    assert_eq!(m.select(0), RcTensor::from([1, 2, 3]));
    assert_eq!(t.select(0), RcTensor::from([[1, 2], [3, 4]]));
}

#[test]
fn test_cat_rows_and_columns() {
    let x1 = RcTensor::new_with_filler(vec![2, 5], 1);
    let y1 = RcTensor::new_with_filler(vec![3, 5], 2);
    let z1 = functional::cat(&[x1, y1], 0).unwrap();
    assert_eq!(z1.shape(), &vec![5, 5]);

    let x2 = RcTensor::new_with_filler(vec![2, 3], 1);
    let y2 = RcTensor::new_with_filler(vec![2, 5], 2);
    let z2 = functional::cat(&[x2.clone(), y2], 1).unwrap();
    assert_eq!(z2.shape(), &vec![2, 8]);

    // mixing the two left-hand sides cannot work
    assert!(functional::cat(&[z2, x2], 0).is_err());
}

#[test]
fn test_reshape_preserves_count_and_infers_dims() {
    let x = RcTensor::new((0..24).collect(), vec![2, 3, 4]);
    let flat = x.reshape(&[2, 12]).unwrap();
    assert_eq!(flat.shape(), &vec![2, 12]);
    assert_eq!(flat, x.reshape(&[2, -1]).unwrap());
    assert_eq!(*flat.get(&vec![1, 11]).unwrap(), 23);

    assert!(x.reshape(&[5, 5]).is_err());
    assert!(x.reshape(&[-1, -1]).is_err());
    assert!(x.reshape(&[7, -1]).is_err());
}

#[test]
fn test_reshape_backward_restores_the_input_shape() {
    let x = RcTensor::variable(RcTensor::new((0..6).map(f64::from).collect(), vec![2, 3]), true);
    let flat = x.reshape(&[6]).unwrap();
    flat.sum().backward();
    assert_eq!(x.grad(), RcTensor::new_with_filler(vec![2, 3], 1.0));
}

#[test]
fn test_variables_record_history_and_plain_tensors_do_not() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    let x = RcTensor::<f64>::randn(vec![2, 2], &mut rng);
    let y = RcTensor::<f64>::randn(vec![2, 2], &mut rng);
    let z = &x + &y;
    assert!(z.grad_fn().is_none());

    let var_x = RcTensor::variable(x, true);
    let var_y = RcTensor::variable(y, true);
    let var_z = &var_x + &var_y;
    assert!(var_z.grad_fn().is_some());
}

#[test]
fn test_backward_through_a_sum_of_an_addition() {
    let x = RcTensor::variable(RcTensor::from([1.0, 2.0, 3.0]), true);
    let y = RcTensor::variable(RcTensor::from([4.0, 5.0, 6.0]), true);
    let z = &x + &y;
    let s = z.sum();
    s.backward();
    assert_eq!(x.grad(), RcTensor::from([1.0, 1.0, 1.0]));
    assert_eq!(y.grad(), RcTensor::from([1.0, 1.0, 1.0]));
}

#[test]
fn test_detaching_severs_the_chain() {
    let var_x = RcTensor::variable(RcTensor::from([1.0, 2.0]), true);
    let var_y = RcTensor::variable(RcTensor::from([3.0, 4.0]), true);
    let var_z = &var_x + &var_y;
    assert!(var_z.grad_fn().is_some());

    // re-wrapping the raw values loses the history
    let new_var_z = RcTensor::variable(var_z.data(), true);
    assert!(new_var_z.grad_fn().is_none());
    assert_eq!(new_var_z, var_z);

    // so backpropagating through it never reaches var_x
    new_var_z.sum().backward();
    assert!(var_x.opt_grad().is_none());
}

#[test]
fn test_randn_is_reproducible_under_a_seed() {
    let mut rng1 = rand::rngs::StdRng::seed_from_u64(7);
    let mut rng2 = rand::rngs::StdRng::seed_from_u64(7);
    let a = RcTensor::<f64>::randn(vec![3, 4, 5], &mut rng1);
    let b = RcTensor::<f64>::randn(vec![3, 4, 5], &mut rng2);
    assert_eq!(a.shape(), &vec![3, 4, 5]);
    assert_eq!(a, b);
}
