#![allow(unreachable_patterns)]

use crate::{
    be::{typed_slice, typed_slice_mut},
    buffer::Buffer,
    dtype::DType,
    error::{Error, Result},
    scalar::Scalar,
};

macro_rules! declare_unary_op {
    ($name:ident, [$($dtype:ident),* $(,)?]) => {
        /// # Safety
        /// Both buffers must hold at least `size` elements of their declared dtype.
        pub unsafe fn $name(output: &mut dyn Buffer, input: &dyn Buffer, size: usize) -> Result<()> {
            if output.dtype() != input.dtype() {
                return Err(Error::DTypeMismatch {
                    expected: input.dtype(),
                    got: output.dtype(),
                });
            }
            if input.len() < size || output.len() < size {
                return Err(Error::InvalidArgument("Buffer shorter than requested size".into()));
            }

            match input.dtype() {
                $(
                    DType::$dtype => paste::paste! {
                        kusari_cpu::ops::unary::[<$name _ $dtype:lower>](
                            &mut typed_slice_mut(output)[..size],
                            &typed_slice(input)[..size],
                        )
                    },
                )*
                _ => return Err(Error::UnsupportedDType),
            }

            Ok(())
        }
    };
}

macro_rules! declare_unary_const_op {
    ($name:ident, [$($dtype:ident),* $(,)?]) => {
        /// # Safety
        /// Both buffers must hold at least `size` elements of their declared dtype.
        pub unsafe fn $name(output: &mut dyn Buffer, input: &dyn Buffer, size: usize, constant: Scalar) -> Result<()> {
            if output.dtype() != input.dtype() {
                return Err(Error::DTypeMismatch {
                    expected: input.dtype(),
                    got: output.dtype(),
                });
            }
            if input.len() < size || output.len() < size {
                return Err(Error::InvalidArgument("Buffer shorter than requested size".into()));
            }

            match input.dtype() {
                $(
                    DType::$dtype => paste::paste! {
                        kusari_cpu::ops::unary::[<$name _ $dtype:lower>](
                            &mut typed_slice_mut(output)[..size],
                            &typed_slice(input)[..size],
                            constant.[<as_ $dtype:lower>](),
                        )
                    },
                )*
                _ => return Err(Error::UnsupportedDType),
            }

            Ok(())
        }
    };
}

macro_rules! declare_fill_op {
    ($name:ident, [$($dtype:ident),* $(,)?]) => {
        /// # Safety
        /// The buffer must hold at least `size` elements of its declared dtype.
        pub unsafe fn $name(output: &mut dyn Buffer, size: usize, constant: Scalar) -> Result<()> {
            if output.len() < size {
                return Err(Error::InvalidArgument("Buffer shorter than requested size".into()));
            }

            match output.dtype() {
                $(
                    DType::$dtype => paste::paste! {
                        kusari_cpu::ops::unary::[<$name _ $dtype:lower>](
                            &mut typed_slice_mut(output)[..size],
                            constant.[<as_ $dtype:lower>](),
                        )
                    },
                )*
                _ => return Err(Error::UnsupportedDType),
            }

            Ok(())
        }
    };
}

macro_rules! declare_broadcast_op {
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
                        kusari_cpu::ops::unary::[<$name _ $dtype:lower>](
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

declare_unary_op!(neg, [BF16, F16, F32, F64, I8, I32, I64]);
declare_unary_op!(abs, [BF16, F16, F32, F64, I8, I32, I64]);
declare_unary_op!(exp, [BF16, F16, F32, F64]);
declare_unary_op!(sqrt, [BF16, F16, F32, F64]);
declare_unary_op!(square, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);

declare_unary_const_op!(mul_scalar, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);
declare_unary_const_op!(add_scalar, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);
declare_unary_const_op!(pow_scalar, [BF16, F16, F32, F64]);

declare_fill_op!(fill, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);

declare_broadcast_op!(broadcast_to, [BF16, F16, F32, F64, U8, U32, I8, I32, I64]);
