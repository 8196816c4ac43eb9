mod utils;

use kusari_core::{error::Result, DType, Error, NdArray};
use utils::{setup_array, setup_device};

mod test_functions {
    use super::*;

    pub fn broadcast_to_test(dtype: DType) -> Result<()> {
        setup_device();
        let x = setup_array(vec![1.0, 2.0, 3.0], &[3], dtype)?;

        let result = x.broadcast_to(&[2, 3])?;

        assert_eq!(result.shape(), &[2, 3]);
        assert_eq!(result.to_flat_vec::<f32>()?, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        Ok(())
    }

    pub fn reshape_test(dtype: DType) -> Result<()> {
        setup_device();
        let x = setup_array(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3], dtype)?;

        let result = x.reshape(&[3, 2])?;

        assert_eq!(result.shape(), &[3, 2]);
        assert_eq!(result.to_flat_vec::<f32>()?, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        Ok(())
    }
}

test_ops_with_dtype!([
    broadcast_to: [BF16, F16, F32, F64, U8, U32, I8, I32, I64],
    reshape: [F32, F64, I32],
]);

#[test]
fn broadcast_stretches_size_one_axes() -> Result<()> {
    setup_device();
    let x = NdArray::from_vec(vec![1.0f32, 2.0], &[2, 1])?;
    let result = x.broadcast_to(&[2, 3])?;
    assert_eq!(result.to_flat_vec::<f32>()?, vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    Ok(())
}

#[test]
fn broadcast_incompatible_shape_is_rejected() -> Result<()> {
    setup_device();
    let x = NdArray::from_vec(vec![1.0f32, 2.0, 3.0], &[3])?;
    assert!(matches!(x.broadcast_to(&[2, 4]), Err(Error::IncompatibleShape(_))));
    Ok(())
}

#[test]
fn reshape_keeps_element_count() -> Result<()> {
    setup_device();
    let x = NdArray::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], &[4])?;
    assert!(x.reshape(&[3]).is_err());
    Ok(())
}

#[test]
fn to_dtype_converts_values() -> Result<()> {
    setup_device();
    let x = NdArray::from_vec(vec![1.0f32, 2.0, 3.0], &[3])?;

    let as_f64 = x.to_dtype(DType::F64)?;
    assert_eq!(as_f64.dtype(), DType::F64);
    assert_eq!(as_f64.to_flat_vec::<f64>()?, vec![1.0, 2.0, 3.0]);

    let as_i32 = x.to_dtype(DType::I32)?;
    assert_eq!(as_i32.to_flat_vec::<i32>()?, vec![1, 2, 3]);
    Ok(())
}

#[test]
fn clone_shares_until_write() -> Result<()> {
    setup_device();
    let x = NdArray::from_vec(vec![1.0f32, 2.0], &[2])?;
    let mut y = x.clone();

    y.fill_(5.0)?;

    assert_eq!(x.to_flat_vec::<f32>()?, vec![1.0, 2.0]);
    assert_eq!(y.to_flat_vec::<f32>()?, vec![5.0, 5.0]);
    Ok(())
}

#[test]
fn deep_copy_is_independent() -> Result<()> {
    setup_device();
    let x = NdArray::from_vec(vec![1.0f32, 2.0], &[2])?;
    let mut y = x.deep_copy()?;
    y.fill_(0.0)?;
    assert_eq!(x.to_flat_vec::<f32>()?, vec![1.0, 2.0]);
    Ok(())
}

#[test]
fn copy_from_checks_shape_and_dtype() -> Result<()> {
    setup_device();
    let mut dst = NdArray::zeros(&[2], DType::F32)?;
    let src = NdArray::from_vec(vec![3.0f32, 4.0], &[2])?;
    dst.copy_from(&src)?;
    assert_eq!(dst.to_flat_vec::<f32>()?, vec![3.0, 4.0]);

    let wrong_shape = NdArray::from_vec(vec![1.0f32], &[1])?;
    assert!(matches!(dst.copy_from(&wrong_shape), Err(Error::ShapeMismatch { .. })));

    let wrong_dtype = NdArray::from_vec(vec![1.0f64, 2.0], &[2])?;
    assert!(matches!(dst.copy_from(&wrong_dtype), Err(Error::DTypeMismatch { .. })));
    Ok(())
}

#[test]
fn allclose_tolerates_small_error() -> Result<()> {
    setup_device();
    let x = NdArray::from_vec(vec![1.0f32, 2.0], &[2])?;
    let y = NdArray::from_vec(vec![1.0f32 + 1e-6, 2.0], &[2])?;
    assert!(x.allclose(&y, 1e-4, 1e-5)?);

    let z = NdArray::from_vec(vec![1.5f32, 2.0], &[2])?;
    assert!(!x.allclose(&z, 1e-4, 1e-5)?);
    Ok(())
}

#[test]
fn has_nonfinite_detects_nan_and_inf() -> Result<()> {
    setup_device();
    let finite = NdArray::from_vec(vec![1.0f32, 2.0], &[2])?;
    assert!(!finite.has_nonfinite());

    let with_nan = NdArray::from_vec(vec![1.0f32, f32::NAN], &[2])?;
    assert!(with_nan.has_nonfinite());

    let with_inf = NdArray::from_vec(vec![f32::INFINITY, 0.0], &[2])?;
    assert!(with_inf.has_nonfinite());
    Ok(())
}
