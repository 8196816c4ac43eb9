use super::{check_arity, check_operands_match};
use crate::function::{apply_single, ApplyContext, ArgInfo, BackwardContext, Function};
use crate::variable::Variable;
use kusari_core::{NdArray, Result};

/// Elementwise addition. Operands are same-shaped; broadcasting is expressed
/// with an explicit `broadcast_to` on the smaller operand.
pub struct Add;

impl Function for Add {
    fn name(&self) -> &'static str {
        "add"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 2)?;
        check_operands_match(in_types)
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].add(&inputs[1])?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None, None]);
        };
        Ok(vec![Some(gy.clone()), Some(gy.clone())])
    }
}

pub struct Sub;

impl Function for Sub {
    fn name(&self) -> &'static str {
        "sub"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 2)?;
        check_operands_match(in_types)
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].sub(&inputs[1])?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None, None]);
        };
        Ok(vec![Some(gy.clone()), Some(super::neg(gy)?)])
    }
}

pub struct Mul;

impl Function for Mul {
    fn name(&self) -> &'static str {
        "mul"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 2)?;
        check_operands_match(in_types)
    }

    fn forward(&self, ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        ctx.retain_inputs(&[0, 1]);
        Ok(vec![inputs[0].mul(&inputs[1])?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None, None]);
        };
        let x0 = ctx.retained_input(0)?;
        let x1 = ctx.retained_input(1)?;
        Ok(vec![Some(mul(gy, &x1)?), Some(mul(gy, &x0)?)])
    }
}

pub struct Div;

impl Function for Div {
    fn name(&self) -> &'static str {
        "div"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 2)?;
        check_operands_match(in_types)
    }

    fn forward(&self, ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        ctx.retain_inputs(&[0, 1]);
        Ok(vec![inputs[0].div(&inputs[1])?])
    }

    // d(x0/x1) = gy / x1, -gy * x0 / x1^2
    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None, None]);
        };
        let x0 = ctx.retained_input(0)?;
        let x1 = ctx.retained_input(1)?;
        let gx0 = div(gy, &x1)?;
        let gx1 = super::neg(&div(&mul(gy, &x0)?, &super::square(&x1)?)?)?;
        Ok(vec![Some(gx0), Some(gx1)])
    }
}

pub fn add(lhs: &Variable, rhs: &Variable) -> Result<Variable> {
    apply_single(Add, &[lhs.clone(), rhs.clone()])
}

pub fn sub(lhs: &Variable, rhs: &Variable) -> Result<Variable> {
    apply_single(Sub, &[lhs.clone(), rhs.clone()])
}

pub fn mul(lhs: &Variable, rhs: &Variable) -> Result<Variable> {
    apply_single(Mul, &[lhs.clone(), rhs.clone()])
}

pub fn div(lhs: &Variable, rhs: &Variable) -> Result<Variable> {
    apply_single(Div, &[lhs.clone(), rhs.clone()])
}
