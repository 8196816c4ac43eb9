#![allow(unreachable_patterns)]

use crate::{
    be::{typed_slice, typed_slice_mut},
    buffer::Buffer,
    dtype::DType,
    error::{Error, Result},
};

macro_rules! declare_binary_op {
    ($name:ident, [$($dtype:ident),* $(,)?]) => {
        /// # Safety
        /// Each buffer must hold at least `size` elements of its declared dtype.
        pub unsafe fn $name(output: &mut dyn Buffer, lhs: &dyn Buffer, rhs: &dyn Buffer, size: usize) -> Result<()> {
            if lhs.dtype() != rhs.dtype() {
                return Err(Error::DTypeMismatch {
                    expected: lhs.dtype(),
                    got: rhs.dtype(),
                });
            }
            if output.dtype() != lhs.dtype() {
                return Err(Error::DTypeMismatch {
                    expected: lhs.dtype(),
                    got: output.dtype(),
                });
            }
            if lhs.len() < size || rhs.len() < size || output.len() < size {
                return Err(Error::InvalidArgument("Buffer shorter than requested size".into()));
            }

            match lhs.dtype() {
                $(
                    DType::$dtype => paste::paste! {
                        kusari_cpu::ops::binary::[<$name _ $dtype:lower>](
                            &mut typed_slice_mut(output)[..size],
                            &typed_slice(lhs)[..size],
                            &typed_slice(rhs)[..size],
                        )
                    },
                )*
                _ => return Err(Error::UnsupportedDType),
            }

            Ok(())
        }
    };
}

declare_binary_op!(add, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);
declare_binary_op!(sub, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);
declare_binary_op!(mul, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);
declare_binary_op!(div, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);
declare_binary_op!(maximum, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);
