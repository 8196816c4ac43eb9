#![allow(clippy::comparison_chain)]

use half::{bf16, f16};
use rayon::prelude::*;

macro_rules! binary_op {
    ($name:ident, $type:ty, $func:expr) => {
        /// Elementwise over contiguous same-length slices; caller checks lengths.
        pub fn $name(out: &mut [$type], lhs: &[$type], rhs: &[$type]) {
            out.par_iter_mut().enumerate().for_each(|(i, out_val)| {
                *out_val = $func(lhs[i], rhs[i]);
            });
        }
    };
}

binary_op!(add_bf16, bf16, |a: bf16, b: bf16| a + b);
binary_op!(add_f16, f16, |a: f16, b: f16| a + b);
binary_op!(add_f32, f32, |a: f32, b: f32| a + b);
binary_op!(add_f64, f64, |a: f64, b: f64| a + b);
binary_op!(add_u8, u8, |a: u8, b: u8| a.wrapping_add(b));
binary_op!(add_u32, u32, |a: u32, b: u32| a.wrapping_add(b));
binary_op!(add_i8, i8, |a: i8, b: i8| a.wrapping_add(b));
binary_op!(add_i32, i32, |a: i32, b: i32| a.wrapping_add(b));
binary_op!(add_i64, i64, |a: i64, b: i64| a.wrapping_add(b));

binary_op!(sub_bf16, bf16, |a: bf16, b: bf16| a - b);
binary_op!(sub_f16, f16, |a: f16, b: f16| a - b);
binary_op!(sub_f32, f32, |a: f32, b: f32| a - b);
binary_op!(sub_f64, f64, |a: f64, b: f64| a - b);
binary_op!(sub_u8, u8, |a: u8, b: u8| a.wrapping_sub(b));
binary_op!(sub_u32, u32, |a: u32, b: u32| a.wrapping_sub(b));
binary_op!(sub_i8, i8, |a: i8, b: i8| a.wrapping_sub(b));
binary_op!(sub_i32, i32, |a: i32, b: i32| a.wrapping_sub(b));
binary_op!(sub_i64, i64, |a: i64, b: i64| a.wrapping_sub(b));

binary_op!(mul_bf16, bf16, |a: bf16, b: bf16| a * b);
binary_op!(mul_f16, f16, |a: f16, b: f16| a * b);
binary_op!(mul_f32, f32, |a: f32, b: f32| a * b);
binary_op!(mul_f64, f64, |a: f64, b: f64| a * b);
binary_op!(mul_u8, u8, |a: u8, b: u8| a.wrapping_mul(b));
binary_op!(mul_u32, u32, |a: u32, b: u32| a.wrapping_mul(b));
binary_op!(mul_i8, i8, |a: i8, b: i8| a.wrapping_mul(b));
binary_op!(mul_i32, i32, |a: i32, b: i32| a.wrapping_mul(b));
binary_op!(mul_i64, i64, |a: i64, b: i64| a.wrapping_mul(b));

binary_op!(div_bf16, bf16, |a: bf16, b: bf16| a / b);
binary_op!(div_f16, f16, |a: f16, b: f16| a / b);
binary_op!(div_f32, f32, |a: f32, b: f32| a / b);
binary_op!(div_f64, f64, |a: f64, b: f64| a / b);
binary_op!(div_u8, u8, |a: u8, b: u8| if b == 0 { 0 } else { a / b });
binary_op!(div_u32, u32, |a: u32, b: u32| if b == 0 { 0 } else { a / b });
binary_op!(div_i8, i8, |a: i8, b: i8| if b == 0 { 0 } else { a.wrapping_div(b) });
binary_op!(div_i32, i32, |a: i32, b: i32| if b == 0 { 0 } else { a.wrapping_div(b) });
binary_op!(div_i64, i64, |a: i64, b: i64| if b == 0 { 0 } else { a.wrapping_div(b) });

binary_op!(maximum_bf16, bf16, |a: bf16, b: bf16| if a > b { a } else { b });
binary_op!(maximum_f16, f16, |a: f16, b: f16| if a > b { a } else { b });
binary_op!(maximum_f32, f32, |a: f32, b: f32| if a > b { a } else { b });
binary_op!(maximum_f64, f64, |a: f64, b: f64| if a > b { a } else { b });
binary_op!(maximum_u8, u8, |a: u8, b: u8| if a > b { a } else { b });
binary_op!(maximum_u32, u32, |a: u32, b: u32| if a > b { a } else { b });
binary_op!(maximum_i8, i8, |a: i8, b: i8| if a > b { a } else { b });
binary_op!(maximum_i32, i32, |a: i32, b: i32| if a > b { a } else { b });
binary_op!(maximum_i64, i64, |a: i64, b: i64| if a > b { a } else { b });
