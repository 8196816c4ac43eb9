#![cfg(feature = "serde")]

mod utils;

use kusari_autograd::Variable;
use kusari_core::{error::Result, DType, NdArray};
use utils::{data_vec, setup_device};

#[test]
fn variable_json_round_trip() -> Result<()> {
    setup_device();
    let x = Variable::named(NdArray::from_vec(vec![1.0f32, 2.0], &[2])?, "weight");

    let json = serde_json::to_string(&x).unwrap();
    let back: Variable = serde_json::from_str(&json).unwrap();

    assert_eq!(data_vec(&back), vec![1.0, 2.0]);
    assert_eq!(back.dtype(), Some(DType::F32));
    assert_eq!(back.name(), Some("weight".to_string()));
    assert!(back.requires_grad());
    Ok(())
}

#[test]
fn gradients_and_history_do_not_serialize() -> Result<()> {
    setup_device();
    let x = Variable::new(NdArray::from_vec(vec![2.0f32], &[])?);
    let y = x.square()?;
    y.backward()?;

    let json = serde_json::to_string(&x).unwrap();
    let back: Variable = serde_json::from_str(&json).unwrap();

    assert!(back.grad().is_none());
    assert!(back.creator().is_none());
    Ok(())
}

#[test]
fn uninitialized_variable_round_trip() -> Result<()> {
    setup_device();
    let x = Variable::uninitialized();

    let json = serde_json::to_string(&x).unwrap();
    let back: Variable = serde_json::from_str(&json).unwrap();

    assert!(!back.is_initialized());
    assert!(back.requires_grad());
    Ok(())
}
