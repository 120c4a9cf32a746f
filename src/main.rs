//! A guided tour of the library: tensors first, then the computation graph
//! and automatic differentiation, ending with a single trained layer.

use torchlet::nn::{Linear, Module};
use torchlet::optim::sgd::sgd_step;
use torchlet::tensor::functional;
use torchlet::tensor::{RcTensor, TensorLike};

use rand::prelude::*;

fn main() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);

    // -- creating tensors -----------------------------------------------
    // Nested arrays become tensors: a vector, a matrix, a 2x2x2 tensor.
    let v = RcTensor::from([1.0, 2.0, 3.0]);
    println!("v = {v}");
    let m = RcTensor::from([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    println!("m = {m}");
    let t = RcTensor::from([[[1.0, 2.0], [3.0, 4.0]], [[5.0, 6.0], [7.0, 8.0]]]);
    println!("t = {t}");

    // Any Numeric element type works; integers give the Long flavour.
    let counts = RcTensor::from([[1i64, 2], [3, 4]]);
    println!("counts = {counts}");

    // Indexing the first axis peels one dimension off: a scalar out of a
    // vector, a row out of a matrix, a matrix out of a 3D tensor.
    println!("v[0] = {}", v.select(0));
    println!("m[0] = {}", m.select(0));
    println!("t[0] = {}", t.select(0));

    // Random normal tensors, reproducible because the rng is seeded.
    let x = RcTensor::<f64>::randn(vec![3, 4, 5], &mut rng);
    println!("x = {x}");

    // -- operations -----------------------------------------------------
    let x = RcTensor::from([1.0, 2.0, 3.0]);
    let y = RcTensor::from([4.0, 5.0, 6.0]);
    println!("x + y = {}", &x + &y);

    // Concatenation glues tensors along an axis: rows first, columns next.
    let x_1 = RcTensor::<f64>::randn(vec![2, 5], &mut rng);
    let y_1 = RcTensor::<f64>::randn(vec![3, 5], &mut rng);
    let z_1 = functional::cat(&[x_1.clone(), y_1], 0).unwrap();
    println!("z_1 = {z_1}");

    let x_2 = RcTensor::<f64>::randn(vec![2, 3], &mut rng);
    let y_2 = RcTensor::<f64>::randn(vec![2, 5], &mut rng);
    let z_2 = functional::cat(&[x_2.clone(), y_2], 1).unwrap();
    println!("z_2 = {z_2}");

    // Incompatible shapes are rejected with an explanation.
    match functional::cat(&[x_1, x_2], 0) {
        Ok(_) => unreachable!(),
        Err(e) => println!("cat failed as expected: {e}"),
    }

    // -- reshaping ------------------------------------------------------
    // Reshape to anything with the same element count. A -1 dimension is
    // inferred from the others, which saves arithmetic at call sites.
    let x = RcTensor::<f64>::randn(vec![2, 3, 4], &mut rng);
    println!("{}", x.reshape(&[2, 12]).unwrap());
    println!("{}", x.reshape(&[2, -1]).unwrap());

    // -- computation graphs and automatic differentiation ---------------
    // A variable remembers how it was made; a plain tensor holds values
    // and nothing else. The recorded history is what makes gradients
    // possible without writing the backward pass by hand.
    let x = RcTensor::variable(RcTensor::from([1.0, 2.0, 3.0]), true);
    println!("x.data = {}", x.data());
    let y = RcTensor::variable(RcTensor::from([4.0, 5.0, 6.0]), true);
    let z = &x + &y;
    println!("z.data = {}", z.data());
    // z knows it came from an addition, and of what.
    println!("z.grad_fn = {:?}", z.grad_fn());

    let s = z.sum();
    println!("s = {s}");
    println!("s.grad_fn = {:?}", s.grad_fn());

    // s = (x_0 + y_0) + (x_1 + y_1) + (x_2 + y_2), so ds/dx_i = 1.
    // backward() runs the recorded history in reverse; gradients
    // accumulate into .grad, so a second call would double them.
    s.backward();
    println!("x.grad = {}", x.grad());

    // Plain tensors record nothing.
    let x = RcTensor::<f64>::randn(vec![2, 2], &mut rng);
    let y = RcTensor::<f64>::randn(vec![2, 2], &mut rng);
    let z = &x + &y;
    println!("z.grad_fn = {:?}", z.grad_fn());

    let var_x = RcTensor::variable(x, true);
    let var_y = RcTensor::variable(y, true);
    let var_z = &var_x + &var_y;
    println!("var_z.grad_fn = {:?}", var_z.grad_fn());

    // Taking .data() extracts the values without the history that made
    // them. Wrap the result in a new variable and it cannot reach var_x or
    // var_y any more: the chain is severed, and no gradient will ever flow
    // back to them through it.
    let new_var_z = RcTensor::variable(var_z.data(), true);
    println!("new_var_z.grad_fn = {:?}", new_var_z.grad_fn());

    // -- where this leads -----------------------------------------------
    // Gradients exist so parameters can learn from a loss.
    let mut layer = Linear::new(
        RcTensor::randn(vec![2, 2], &mut rng),
        RcTensor::randn(vec![1, 2], &mut rng),
        None,
    );
    let input = RcTensor::new(vec![1.0, 2.0], vec![1, 2]);
    let target = RcTensor::new(vec![-1.0, 1.0], vec![1, 2]);
    for step in 0..5 {
        let output = layer.forward(input.clone());
        let loss = (&output - &target).abs().sum();
        loss.backward();
        sgd_step(&mut layer, RcTensor::scalar(0.1));
        println!("step {step}: loss = {loss}");
    }
}
