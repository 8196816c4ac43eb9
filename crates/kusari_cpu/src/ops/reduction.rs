use crate::utils::{broadcast_source_index, unravel};
use half::{bf16, f16};

macro_rules! sum_all_op {
    ($name:ident, $type:ty, $zero:expr) => {
        pub fn $name(input: &[$type]) -> $type {
            input.iter().fold($zero, |acc, &x| acc + x)
        }
    };
}

macro_rules! sum_to_op {
    ($name:ident, $type:ty, $zero:expr) => {
        /// Reduces `input` onto `out_shape` by summing over the dims that
        /// `out_shape` would stretch under broadcasting. Sequential: the
        /// scatter-add pattern is not worth racing over.
        pub fn $name(out: &mut [$type], input: &[$type], in_shape: &[usize], out_shape: &[usize]) {
            for v in out.iter_mut() {
                *v = $zero;
            }
            let mut coords = vec![0usize; in_shape.len()];
            for (i, &x) in input.iter().enumerate() {
                unravel(i, in_shape, &mut coords);
                let j = broadcast_source_index(&coords, out_shape, in_shape);
                out[j] = out[j] + x;
            }
        }
    };
}

sum_all_op!(sum_all_bf16, bf16, bf16::ZERO);
sum_all_op!(sum_all_f16, f16, f16::ZERO);
sum_all_op!(sum_all_f32, f32, 0.0f32);
sum_all_op!(sum_all_f64, f64, 0.0f64);
sum_all_op!(sum_all_u8, u8, 0u8);
sum_all_op!(sum_all_u32, u32, 0u32);
sum_all_op!(sum_all_i8, i8, 0i8);
sum_all_op!(sum_all_i32, i32, 0i32);
sum_all_op!(sum_all_i64, i64, 0i64);

sum_to_op!(sum_to_bf16, bf16, bf16::ZERO);
sum_to_op!(sum_to_f16, f16, f16::ZERO);
sum_to_op!(sum_to_f32, f32, 0.0f32);
sum_to_op!(sum_to_f64, f64, 0.0f64);
sum_to_op!(sum_to_u8, u8, 0u8);
sum_to_op!(sum_to_u32, u32, 0u32);
sum_to_op!(sum_to_i8, i8, 0i8);
sum_to_op!(sum_to_i32, i32, 0i32);
sum_to_op!(sum_to_i64, i64, 0i64);
