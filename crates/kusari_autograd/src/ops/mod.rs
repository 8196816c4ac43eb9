mod binary;
mod reduction;
mod transform;
mod unary;

pub use binary::{add, div, mul, sub, Add, Div, Mul, Sub};
pub use reduction::{sum, sum_to, Sum, SumTo};
pub use transform::{broadcast_to, reshape, BroadcastTo, Reshape};
pub use unary::{
    add_scalar, exp, identity, mul_scalar, neg, pow, square, AddScalar, Exp, Identity, MulScalar,
    Neg, PowConst, Square,
};

use crate::function::ArgInfo;
use crate::variable::Variable;
use kusari_core::{Error, Result};

impl Variable {
    pub fn add(&self, rhs: &Variable) -> Result<Variable> {
        add(self, rhs)
    }

    pub fn sub(&self, rhs: &Variable) -> Result<Variable> {
        sub(self, rhs)
    }

    pub fn mul(&self, rhs: &Variable) -> Result<Variable> {
        mul(self, rhs)
    }

    pub fn div(&self, rhs: &Variable) -> Result<Variable> {
        div(self, rhs)
    }

    pub fn neg(&self) -> Result<Variable> {
        neg(self)
    }

    pub fn exp(&self) -> Result<Variable> {
        exp(self)
    }

    pub fn square(&self) -> Result<Variable> {
        square(self)
    }

    pub fn pow(&self, exponent: f64) -> Result<Variable> {
        pow(self, exponent)
    }

    pub fn mul_scalar(&self, value: f64) -> Result<Variable> {
        mul_scalar(self, value)
    }

    pub fn add_scalar(&self, value: f64) -> Result<Variable> {
        add_scalar(self, value)
    }

    pub fn sum(&self) -> Result<Variable> {
        sum(self)
    }

    pub fn sum_to(&self, shape: &[usize]) -> Result<Variable> {
        sum_to(self, shape)
    }

    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Variable> {
        broadcast_to(self, shape)
    }

    pub fn reshape(&self, shape: &[usize]) -> Result<Variable> {
        reshape(self, shape)
    }
}

pub(crate) fn check_arity(in_types: &[ArgInfo], expected: usize) -> Result<()> {
    if in_types.len() != expected {
        return Err(Error::InvalidArgument(format!(
            "expected {} inputs, got {}",
            expected,
            in_types.len()
        )));
    }
    Ok(())
}

pub(crate) fn check_operands_match(in_types: &[ArgInfo]) -> Result<()> {
    let Some(first) = in_types.first() else {
        return Ok(());
    };
    for info in &in_types[1..] {
        if info.dtype != first.dtype {
            return Err(Error::DTypeMismatch {
                expected: first.dtype,
                got: info.dtype,
            });
        }
        if info.shape != first.shape {
            return Err(Error::ShapeMismatch {
                expected: first.shape.clone(),
                got: info.shape.clone(),
            });
        }
        if !info.device.is_compatible_with(&first.device) {
            return Err(Error::DeviceMismatch {
                expected: first.device,
                got: info.device,
            });
        }
    }
    Ok(())
}

pub(crate) fn check_float(in_types: &[ArgInfo]) -> Result<()> {
    for info in in_types {
        if !info.dtype.is_float() {
            return Err(Error::UnsupportedDType);
        }
    }
    Ok(())
}
