mod utils;

use kusari_core::{error::Result, DType, Error, NdArray};
use utils::{setup_array, setup_device};

mod test_functions {
    use super::*;

    pub fn sum_test(dtype: DType) -> Result<()> {
        setup_device();
        let x = setup_array(vec![1.0, 2.0, 3.0, 4.0], &[2, 2], dtype)?;

        let result = x.sum()?;

        assert_eq!(result.shape(), &[] as &[usize]);
        assert_eq!(result.dtype(), dtype);
        assert_eq!(result.item()?.as_f32(), 10.0);
        Ok(())
    }

    pub fn sum_to_test(dtype: DType) -> Result<()> {
        setup_device();
        let x = setup_array(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3], dtype)?;

        // collapse the first axis
        let rows = x.sum_to(&[3])?;
        assert_eq!(rows.to_flat_vec::<f32>()?, vec![5.0, 7.0, 9.0]);

        // collapse the second axis, keeping it as size 1
        let cols = x.sum_to(&[2, 1])?;
        assert_eq!(cols.to_flat_vec::<f32>()?, vec![6.0, 15.0]);

        // collapse everything
        let all = x.sum_to(&[])?;
        assert_eq!(all.item()?.as_f32(), 21.0);
        Ok(())
    }
}

test_ops_with_dtype!([
    sum: [BF16, F16, F32, F64, U8, U32, I8, I32, I64],
    sum_to: [F32, F64, I32, I64],
]);

#[test]
fn sum_to_same_shape_is_identity() -> Result<()> {
    setup_device();
    let x = NdArray::from_vec(vec![1.0f32, 2.0], &[2])?;
    assert_eq!(x.sum_to(&[2])?.to_flat_vec::<f32>()?, vec![1.0, 2.0]);
    Ok(())
}

#[test]
fn sum_to_incompatible_shape_is_rejected() -> Result<()> {
    setup_device();
    let x = NdArray::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])?;
    assert!(matches!(x.sum_to(&[4]), Err(Error::IncompatibleShape(_))));
    Ok(())
}
