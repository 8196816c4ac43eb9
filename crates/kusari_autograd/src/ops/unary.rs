use super::{check_arity, check_float};
use crate::function::{apply, apply_single, ApplyContext, ArgInfo, BackwardContext, Function};
use crate::variable::Variable;
use kusari_core::{NdArray, Result};

pub struct Neg;

impl Function for Neg {
    fn name(&self) -> &'static str {
        "neg"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 1)
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].neg()?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None]);
        };
        Ok(vec![Some(neg(gy)?)])
    }
}

/// Elementwise exponential. Backward reuses the forward output, so the output
/// is retained rather than the input.
pub struct Exp;

impl Function for Exp {
    fn name(&self) -> &'static str {
        "exp"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 1)?;
        check_float(in_types)
    }

    fn forward(&self, ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        ctx.retain_outputs(&[0]);
        Ok(vec![inputs[0].exp()?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None]);
        };
        let y = ctx.retained_output(0)?;
        Ok(vec![Some(super::mul(gy, &y)?)])
    }
}

pub struct Square;

impl Function for Square {
    fn name(&self) -> &'static str {
        "square"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 1)
    }

    fn forward(&self, ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        ctx.retain_inputs(&[0]);
        Ok(vec![inputs[0].square()?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None]);
        };
        let x = ctx.retained_input(0)?;
        Ok(vec![Some(mul_scalar(&super::mul(gy, &x)?, 2.0)?)])
    }
}

/// Raises to a fixed real exponent.
pub struct PowConst {
    pub exponent: f64,
}

impl Function for PowConst {
    fn name(&self) -> &'static str {
        "pow"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 1)?;
        check_float(in_types)
    }

    fn forward(&self, ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        ctx.retain_inputs(&[0]);
        Ok(vec![inputs[0].pow_scalar(self.exponent)?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None]);
        };
        let x = ctx.retained_input(0)?;
        let lowered = pow(&x, self.exponent - 1.0)?;
        let gx = mul_scalar(&super::mul(gy, &lowered)?, self.exponent)?;
        Ok(vec![Some(gx)])
    }
}

pub struct MulScalar {
    pub value: f64,
}

impl Function for MulScalar {
    fn name(&self) -> &'static str {
        "mul_scalar"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 1)
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].mul_scalar(self.value)?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None]);
        };
        Ok(vec![Some(mul_scalar(gy, self.value)?)])
    }
}

pub struct AddScalar {
    pub value: f64,
}

impl Function for AddScalar {
    fn name(&self) -> &'static str {
        "add_scalar"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 1)
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].add_scalar(self.value)?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        Ok(vec![ctx.grad_output(0).cloned()])
    }
}

/// Passes any number of inputs through unchanged. Useful as a graph splice
/// point and for pinning several variables to a common rank.
pub struct Identity;

impl Function for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(inputs.to_vec())
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        Ok((0..ctx.num_outputs())
            .map(|i| ctx.grad_output(i).cloned())
            .collect())
    }
}

pub fn neg(x: &Variable) -> Result<Variable> {
    apply_single(Neg, &[x.clone()])
}

pub fn exp(x: &Variable) -> Result<Variable> {
    apply_single(Exp, &[x.clone()])
}

pub fn square(x: &Variable) -> Result<Variable> {
    apply_single(Square, &[x.clone()])
}

pub fn pow(x: &Variable, exponent: f64) -> Result<Variable> {
    apply_single(PowConst { exponent }, &[x.clone()])
}

pub fn mul_scalar(x: &Variable, value: f64) -> Result<Variable> {
    apply_single(MulScalar { value }, &[x.clone()])
}

pub fn add_scalar(x: &Variable, value: f64) -> Result<Variable> {
    apply_single(AddScalar { value }, &[x.clone()])
}

pub fn identity(inputs: &[Variable]) -> Result<Vec<Variable>> {
    apply(Identity, inputs)
}
