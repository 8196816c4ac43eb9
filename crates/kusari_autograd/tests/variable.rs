mod utils;

use kusari_autograd::Variable;
use kusari_core::{error::Result, DType, Error, NdArray};
use utils::{data_vec, grad_vec, setup_device, setup_var};

#[test]
fn float_variables_require_grad_by_default() -> Result<()> {
    setup_device();
    let x = Variable::new(NdArray::from_vec(vec![1.0f32, 2.0], &[2])?);
    assert!(x.requires_grad());

    let i = Variable::new(NdArray::from_vec(vec![1i32, 2], &[2])?);
    assert!(!i.requires_grad());
    Ok(())
}

#[test]
fn requires_grad_cannot_return_for_int_data() -> Result<()> {
    setup_device();
    let i = Variable::with_requires_grad(NdArray::from_vec(vec![1i64, 2], &[2])?, true);
    assert!(!i.requires_grad());
    Ok(())
}

#[test]
fn metadata_accessors() -> Result<()> {
    setup_device();
    let x = setup_var(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3], DType::F32)?;
    assert_eq!(x.shape(), Some(vec![2, 3]));
    assert_eq!(x.ndim(), Some(2));
    assert_eq!(x.size(), Some(6));
    assert_eq!(x.dtype(), Some(DType::F32));
    assert_eq!(x.rank(), 0);
    assert!(x.creator().is_none());
    Ok(())
}

#[test]
fn named_variables_render_in_display() -> Result<()> {
    setup_device();
    let x = Variable::named(NdArray::from_vec(vec![1.0f32], &[])?, "loss");
    assert_eq!(x.name(), Some("loss".to_string()));
    assert!(format!("{}", x).starts_with("loss("));
    Ok(())
}

#[test]
fn uninitialized_variable_has_no_metadata() {
    setup_device();
    let x = Variable::uninitialized();
    assert!(!x.is_initialized());
    assert_eq!(x.shape(), None);
    assert_eq!(x.dtype(), None);
    assert!(x.array().is_none());
}

#[test]
fn set_grad_accepts_matching_array() -> Result<()> {
    setup_device();
    let x = setup_var(vec![1.0, 2.0], &[2], DType::F32)?;
    x.set_grad(Some(NdArray::from_vec(vec![0.5f32, 0.5], &[2])?))?;
    assert_eq!(grad_vec(&x), vec![0.5, 0.5]);
    Ok(())
}

#[test]
fn set_grad_rejects_wrong_dtype() -> Result<()> {
    setup_device();
    let x = setup_var(vec![1.0, 2.0], &[2], DType::F32)?;
    let wrong = NdArray::from_vec(vec![0.5f64, 0.5], &[2])?;
    assert!(matches!(
        x.set_grad(Some(wrong)),
        Err(Error::DTypeMismatch { expected: DType::F32, got: DType::F64 })
    ));
    Ok(())
}

#[test]
fn set_grad_rejects_wrong_shape() -> Result<()> {
    setup_device();
    let x = setup_var(vec![1.0, 2.0], &[2], DType::F32)?;
    let wrong = NdArray::from_vec(vec![0.5f32, 0.5, 0.5], &[3])?;
    assert!(matches!(x.set_grad(Some(wrong)), Err(Error::ShapeMismatch { .. })));
    Ok(())
}

#[test]
fn set_grad_rejects_uninitialized_target() -> Result<()> {
    setup_device();
    let x = Variable::uninitialized();
    let grad = NdArray::from_vec(vec![1.0f32], &[1])?;
    assert!(matches!(x.set_grad(Some(grad)), Err(Error::Uninitialized { .. })));
    Ok(())
}

#[test]
fn cleargrad_drops_the_gradient() -> Result<()> {
    setup_device();
    let x = setup_var(vec![1.0, 2.0], &[2], DType::F32)?;
    x.set_grad(Some(NdArray::ones_like(&x.array().unwrap())?))?;
    assert!(x.grad().is_some());

    x.cleargrad();
    assert!(x.grad().is_none());
    Ok(())
}

#[test]
#[allow(deprecated)]
fn zerograd_resets_to_zeros() -> Result<()> {
    setup_device();
    let x = setup_var(vec![1.0, 2.0], &[2], DType::F32)?;
    x.set_grad(Some(NdArray::from_vec(vec![3.0f32, 4.0], &[2])?))?;

    x.zerograd()?;
    assert_eq!(grad_vec(&x), vec![0.0, 0.0]);

    // works without a pre-existing gradient too
    let y = setup_var(vec![1.0], &[1], DType::F32)?;
    y.zerograd()?;
    assert_eq!(grad_vec(&y), vec![0.0]);
    Ok(())
}

#[test]
fn addgrad_sums_into_existing_gradient() -> Result<()> {
    setup_device();
    let a = setup_var(vec![1.0, 2.0], &[2], DType::F32)?;
    let b = setup_var(vec![3.0, 4.0], &[2], DType::F32)?;
    a.set_grad(Some(NdArray::from_vec(vec![1.0f32, 1.0], &[2])?))?;
    b.set_grad(Some(NdArray::from_vec(vec![2.0f32, 3.0], &[2])?))?;

    a.addgrad(&b)?;
    assert_eq!(grad_vec(&a), vec![3.0, 4.0]);
    // the source is untouched
    assert_eq!(grad_vec(&b), vec![2.0, 3.0]);
    Ok(())
}

#[test]
fn addgrad_copies_when_destination_has_none() -> Result<()> {
    setup_device();
    let a = setup_var(vec![1.0, 2.0], &[2], DType::F32)?;
    let b = setup_var(vec![3.0, 4.0], &[2], DType::F32)?;
    b.set_grad(Some(NdArray::from_vec(vec![2.0f32, 3.0], &[2])?))?;

    a.addgrad(&b)?;
    assert_eq!(grad_vec(&a), vec![2.0, 3.0]);

    // a copy, not an alias
    b.grad_var().unwrap().array().unwrap().fill_(9.0).ok();
    assert_eq!(grad_vec(&a), vec![2.0, 3.0]);
    Ok(())
}

#[test]
fn addgrad_without_source_gradient_is_a_noop() -> Result<()> {
    setup_device();
    let a = setup_var(vec![1.0], &[1], DType::F32)?;
    let b = setup_var(vec![2.0], &[1], DType::F32)?;
    a.addgrad(&b)?;
    assert!(a.grad().is_none());
    Ok(())
}

#[test]
fn copydata_overwrites_values() -> Result<()> {
    setup_device();
    let a = setup_var(vec![0.0, 0.0], &[2], DType::F32)?;
    let b = setup_var(vec![5.0, 6.0], &[2], DType::F32)?;

    a.copydata(&b)?;
    assert_eq!(data_vec(&a), vec![5.0, 6.0]);
    Ok(())
}

#[test]
fn copydata_initializes_an_empty_variable() -> Result<()> {
    setup_device();
    let a = Variable::uninitialized();
    let b = setup_var(vec![5.0, 6.0], &[2], DType::F32)?;

    a.copydata(&b)?;
    assert!(a.is_initialized());
    assert_eq!(data_vec(&a), vec![5.0, 6.0]);
    Ok(())
}

#[test]
fn copydata_from_empty_source_is_a_noop() -> Result<()> {
    setup_device();
    let a = Variable::uninitialized();
    let b = Variable::uninitialized();
    a.copydata(&b)?;
    assert!(!a.is_initialized());
    Ok(())
}

#[test]
fn clones_share_the_node() -> Result<()> {
    setup_device();
    let a = setup_var(vec![1.0], &[1], DType::F32)?;
    let b = a.clone();
    b.set_grad(Some(NdArray::from_vec(vec![7.0f32], &[1])?))?;
    assert_eq!(grad_vec(&a), vec![7.0]);
    assert!(a.node().ptr_eq(b.node()));
    Ok(())
}

#[test]
fn unchain_cuts_only_the_last_edge() -> Result<()> {
    setup_device();
    let x = setup_var(vec![2.0], &[], DType::F32)?;
    let y = x.square()?;
    let z = y.exp()?;

    z.unchain();
    assert!(z.creator().is_none());
    assert!(y.creator().is_some());
    Ok(())
}

#[test]
fn unchain_backward_cuts_the_whole_history() -> Result<()> {
    setup_device();
    let x = setup_var(vec![2.0], &[], DType::F32)?;
    let y = x.square()?;
    let z = y.exp()?;

    z.unchain_backward();
    assert!(z.creator().is_none());
    assert!(y.creator().is_none());

    // backward now stops at z itself
    z.backward()?;
    assert!(x.grad().is_none());
    Ok(())
}

#[test]
fn set_creator_adopts_rank_from_the_function() -> Result<()> {
    setup_device();
    let x = setup_var(vec![2.0], &[], DType::F32)?;
    let y = x.square()?;
    assert_eq!(y.rank(), 1);

    let orphan = setup_var(vec![1.0], &[], DType::F32)?;
    let creator = y.creator().unwrap();
    orphan.set_creator(&creator);
    assert_eq!(orphan.rank(), creator.rank() + 1);
    assert!(orphan.creator().is_some());

    let sibling = setup_var(vec![1.0], &[], DType::F32)?;
    sibling.set_creator_node(&creator);
    assert_eq!(sibling.rank(), orphan.rank());
    Ok(())
}

#[test]
fn item_reads_a_scalar() -> Result<()> {
    setup_device();
    let x = setup_var(vec![4.5], &[], DType::F32)?;
    assert_eq!(x.item()?.as_f32(), 4.5);
    Ok(())
}
