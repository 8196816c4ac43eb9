use kusari::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let x = Variable::named(NdArray::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], &[2, 2])?, "x");
    let y = x.square()?.sum()?;
    y.backward()?;

    println!("x: {}", x);
    println!(
        "x.grad: {:?}",
        x.grad().map(|g| g.to_flat_vec::<f32>()).transpose()?
    );

    // Data, name and requires_grad survive the round trip. Graph edges and
    // gradients are runtime state and are dropped.
    let json = serde_json::to_string(&x)?;
    println!("serialized: {}", json);

    let restored: Variable = serde_json::from_str(&json)?;
    println!("restored: {}", restored);
    println!("restored.requires_grad: {}", restored.requires_grad());
    println!("restored.grad: {:?}", restored.grad().is_some());

    Ok(())
}
