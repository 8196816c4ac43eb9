#![allow(clippy::excessive_precision)]

use crate::utils::{broadcast_source_index, unravel};
use half::{bf16, f16};
use rayon::prelude::*;

macro_rules! unary_op {
    ($name:ident, $type:ty, $func:expr) => {
        pub fn $name(out: &mut [$type], input: &[$type]) {
            out.par_iter_mut().enumerate().for_each(|(i, out_val)| {
                *out_val = $func(input[i]);
            });
        }
    };
}

macro_rules! unary_op_with_constant {
    ($name:ident, $type:ty, $func:expr) => {
        pub fn $name(out: &mut [$type], input: &[$type], constant: $type) {
            out.par_iter_mut().enumerate().for_each(|(i, out_val)| {
                *out_val = $func(input[i], constant);
            });
        }
    };
}

macro_rules! fill_op {
    ($name:ident, $type:ty) => {
        pub fn $name(out: &mut [$type], constant: $type) {
            out.par_iter_mut().for_each(|out_val| {
                *out_val = constant;
            });
        }
    };
}

macro_rules! broadcast_op {
    ($name:ident, $type:ty) => {
        /// Materializes a right-aligned broadcast of `input` into `out`.
        pub fn $name(out: &mut [$type], input: &[$type], in_shape: &[usize], out_shape: &[usize]) {
            out.par_iter_mut().enumerate().for_each(|(i, out_val)| {
                let mut coords = vec![0usize; out_shape.len()];
                unravel(i, out_shape, &mut coords);
                *out_val = input[broadcast_source_index(&coords, in_shape, out_shape)];
            });
        }
    };
}

unary_op!(neg_bf16, bf16, |x: bf16| -x);
unary_op!(neg_f16, f16, |x: f16| -x);
unary_op!(neg_f32, f32, |x: f32| -x);
unary_op!(neg_f64, f64, |x: f64| -x);
unary_op!(neg_i8, i8, |x: i8| x.wrapping_neg());
unary_op!(neg_i32, i32, |x: i32| x.wrapping_neg());
unary_op!(neg_i64, i64, |x: i64| x.wrapping_neg());

unary_op!(abs_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().abs()));
unary_op!(abs_f16, f16, |x: f16| f16::from_f32(x.to_f32().abs()));
unary_op!(abs_f32, f32, |x: f32| x.abs());
unary_op!(abs_f64, f64, |x: f64| x.abs());
unary_op!(abs_i8, i8, |x: i8| x.wrapping_abs());
unary_op!(abs_i32, i32, |x: i32| x.wrapping_abs());
unary_op!(abs_i64, i64, |x: i64| x.wrapping_abs());

unary_op!(exp_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().exp()));
unary_op!(exp_f16, f16, |x: f16| f16::from_f32(x.to_f32().exp()));
unary_op!(exp_f32, f32, |x: f32| x.exp());
unary_op!(exp_f64, f64, |x: f64| x.exp());

unary_op!(sqrt_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().sqrt()));
unary_op!(sqrt_f16, f16, |x: f16| f16::from_f32(x.to_f32().sqrt()));
unary_op!(sqrt_f32, f32, |x: f32| x.sqrt());
unary_op!(sqrt_f64, f64, |x: f64| x.sqrt());

unary_op!(square_bf16, bf16, |x: bf16| x * x);
unary_op!(square_f16, f16, |x: f16| x * x);
unary_op!(square_f32, f32, |x: f32| x * x);
unary_op!(square_f64, f64, |x: f64| x * x);
unary_op!(square_u8, u8, |x: u8| x.wrapping_mul(x));
unary_op!(square_u32, u32, |x: u32| x.wrapping_mul(x));
unary_op!(square_i8, i8, |x: i8| x.wrapping_mul(x));
unary_op!(square_i32, i32, |x: i32| x.wrapping_mul(x));
unary_op!(square_i64, i64, |x: i64| x.wrapping_mul(x));

unary_op_with_constant!(mul_scalar_bf16, bf16, |x: bf16, c: bf16| x * c);
unary_op_with_constant!(mul_scalar_f16, f16, |x: f16, c: f16| x * c);
unary_op_with_constant!(mul_scalar_f32, f32, |x: f32, c: f32| x * c);
unary_op_with_constant!(mul_scalar_f64, f64, |x: f64, c: f64| x * c);
unary_op_with_constant!(mul_scalar_u8, u8, |x: u8, c: u8| x.wrapping_mul(c));
unary_op_with_constant!(mul_scalar_u32, u32, |x: u32, c: u32| x.wrapping_mul(c));
unary_op_with_constant!(mul_scalar_i8, i8, |x: i8, c: i8| x.wrapping_mul(c));
unary_op_with_constant!(mul_scalar_i32, i32, |x: i32, c: i32| x.wrapping_mul(c));
unary_op_with_constant!(mul_scalar_i64, i64, |x: i64, c: i64| x.wrapping_mul(c));

unary_op_with_constant!(add_scalar_bf16, bf16, |x: bf16, c: bf16| x + c);
unary_op_with_constant!(add_scalar_f16, f16, |x: f16, c: f16| x + c);
unary_op_with_constant!(add_scalar_f32, f32, |x: f32, c: f32| x + c);
unary_op_with_constant!(add_scalar_f64, f64, |x: f64, c: f64| x + c);
unary_op_with_constant!(add_scalar_u8, u8, |x: u8, c: u8| x.wrapping_add(c));
unary_op_with_constant!(add_scalar_u32, u32, |x: u32, c: u32| x.wrapping_add(c));
unary_op_with_constant!(add_scalar_i8, i8, |x: i8, c: i8| x.wrapping_add(c));
unary_op_with_constant!(add_scalar_i32, i32, |x: i32, c: i32| x.wrapping_add(c));
unary_op_with_constant!(add_scalar_i64, i64, |x: i64, c: i64| x.wrapping_add(c));

unary_op_with_constant!(pow_scalar_bf16, bf16, |x: bf16, c: bf16| bf16::from_f32(
    x.to_f32().powf(c.to_f32())
));
unary_op_with_constant!(pow_scalar_f16, f16, |x: f16, c: f16| f16::from_f32(
    x.to_f32().powf(c.to_f32())
));
unary_op_with_constant!(pow_scalar_f32, f32, |x: f32, c: f32| x.powf(c));
unary_op_with_constant!(pow_scalar_f64, f64, |x: f64, c: f64| x.powf(c));

fill_op!(fill_bf16, bf16);
fill_op!(fill_f16, f16);
fill_op!(fill_f32, f32);
fill_op!(fill_f64, f64);
fill_op!(fill_u8, u8);
fill_op!(fill_u32, u32);
fill_op!(fill_i8, i8);
fill_op!(fill_i32, i32);
fill_op!(fill_i64, i64);

broadcast_op!(broadcast_to_bf16, bf16);
broadcast_op!(broadcast_to_f16, f16);
broadcast_op!(broadcast_to_f32, f32);
broadcast_op!(broadcast_to_f64, f64);
broadcast_op!(broadcast_to_u8, u8);
broadcast_op!(broadcast_to_u32, u32);
broadcast_op!(broadcast_to_i8, i8);
broadcast_op!(broadcast_to_i32, i32);
broadcast_op!(broadcast_to_i64, i64);
