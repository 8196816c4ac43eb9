use kusari::prelude::*;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Training on CPU:");
    train_scalar_regression(Device::CPU)?;

    #[cfg(feature = "cuda")]
    {
        println!("\nTraining on CUDA:");
        train_scalar_regression(Device::CUDA(0))?;
    }

    Ok(())
}

fn train_scalar_regression(device: Device) -> Result<(), Box<dyn std::error::Error>> {
    set_default_device(device);

    // Samples from y = 2x + 1.
    let xs = Variable::constant(NdArray::from_vec_with_spec(
        vec![1.0f32, 2.0, 3.0, 4.0],
        &[4],
        device,
    )?);
    let ys = Variable::constant(NdArray::from_vec_with_spec(
        vec![3.0f32, 5.0, 7.0, 9.0],
        &[4],
        device,
    )?);

    let mut weight = Parameter::from_initializer(Initializer::Normal {
        mean: 0.0,
        stddev: 0.1,
    });
    weight.initialize(&[1])?;
    weight.set_update_rule(Box::new(Sgd { lr: 0.02 }));

    let mut bias = Parameter::from_constant(0.0f32);
    bias.initialize(&[1])?;
    bias.set_update_rule(Box::new(Sgd { lr: 0.02 }));

    let epochs = 25;
    for epoch in 0..epochs {
        let start_time = Instant::now();

        let pred = weight.broadcast_to(&[4])?.mul(&xs)?.add(&bias.broadcast_to(&[4])?)?;
        let loss = pred.sub(&ys)?.square()?.sum()?.mul_scalar(0.25)?;

        loss.backward()?;

        weight.update()?;
        bias.update()?;
        weight.cleargrad();
        bias.cleargrad();

        let elapsed = start_time.elapsed();
        println!(
            "Epoch {}: Loss = {:.4}, Time = {:?}, Weight = {:?}, Bias = {:?}",
            epoch,
            loss.item()?.as_f64_any(),
            elapsed,
            weight.array().map(|w| w.to_flat_vec::<f32>()).transpose()?,
            bias.array().map(|b| b.to_flat_vec::<f32>()).transpose()?,
        );
    }

    Ok(())
}
