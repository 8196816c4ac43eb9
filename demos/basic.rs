use kusari::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let a = Variable::named(NdArray::from_vec(vec![1.0f32, 2.0, 3.0], &[3])?, "a");
    let b = Variable::named(NdArray::from_vec(vec![4.0f32, 5.0, 6.0], &[3])?, "b");
    let c = Variable::named(NdArray::from_vec(vec![7.0f32, 8.0, 9.0], &[3])?, "c");

    let d = a.add(&a.mul(&b)?)?.add(&a.mul(&c)?)?.add(&b.mul(&c)?)?;
    d.backward()?;

    println!("d: {}", d);
    print_grad(&a)?;
    print_grad(&b)?;
    print_grad(&c)?;

    a.cleargrad();
    b.cleargrad();
    c.cleargrad();

    let e = a.mul(&b)?.square()?.add(&a.exp()?)?.sum()?;
    e.backward()?;

    println!("e: {}", e);
    print_grad(&a)?;
    print_grad(&b)?;

    Ok(())
}

fn print_grad(var: &Variable) -> Result<(), Box<dyn std::error::Error>> {
    match var.grad() {
        Some(grad) => println!(
            "{}.grad: {:?}",
            var.name().unwrap_or_default(),
            grad.to_flat_vec::<f32>()?
        ),
        None => println!("{}.grad: none", var.name().unwrap_or_default()),
    }
    Ok(())
}
