#![allow(unreachable_patterns)]

use crate::{
    be::{typed_slice, typed_slice_mut},
    buffer::Buffer,
    dtype::DType,
    error::{Error, Result},
    scalar::Scalar,
};

macro_rules! declare_sum_all_op {
    ($name:ident, [$($dtype:ident),* $(,)?]) => {
        /// # Safety
        /// The buffer must hold at least `size` elements of its declared dtype.
        pub unsafe fn $name(input: &dyn Buffer, size: usize) -> Result<Scalar> {
            if input.len() < size {
                return Err(Error::InvalidArgument("Buffer shorter than requested size".into()));
            }

            let result = match input.dtype() {
                $(
                    DType::$dtype => paste::paste! {
                        Scalar::from(kusari_cpu::ops::reduction::[<$name _ $dtype:lower>](
                            &typed_slice(input)[..size],
                        ))
                    },
                )*
                _ => return Err(Error::UnsupportedDType),
            };

            Ok(result)
        }
    };
}

macro_rules! declare_sum_to_op {
    ($name:ident, [$($dtype:ident),* $(,)?]) => {
        /// # Safety
        /// `input` must hold the product of `in_shape` elements and `output`
        /// the product of `out_shape`, each of the declared dtype.
        pub unsafe fn $name(
            output: &mut dyn Buffer,
            input: &dyn Buffer,
            in_shape: &[usize],
            out_shape: &[usize],
        ) -> Result<()> {
            if output.dtype() != input.dtype() {
                return Err(Error::DTypeMismatch {
                    expected: input.dtype(),
                    got: output.dtype(),
                });
            }

            match input.dtype() {
                $(
                    DType::$dtype => paste::paste! {
                        kusari_cpu::ops::reduction::[<$name _ $dtype:lower>](
                            typed_slice_mut(output),
                            typed_slice(input),
                            in_shape,
                            out_shape,
                        )
                    },
                )*
                _ => return Err(Error::UnsupportedDType),
            }

            Ok(())
        }
    };
}

declare_sum_all_op!(sum_all, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);
declare_sum_to_op!(sum_to, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);
