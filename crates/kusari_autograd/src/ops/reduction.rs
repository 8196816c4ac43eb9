use super::check_arity;
use crate::function::{apply_single, ApplyContext, ArgInfo, BackwardContext, Function};
use crate::variable::Variable;
use kusari_core::{Error, NdArray, Result};

/// Full reduction to a scalar of shape `[]`.
pub struct Sum;

impl Function for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 1)
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].sum()?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None]);
        };
        let shape = ctx.input_shape(0)?;
        Ok(vec![Some(super::broadcast_to(gy, &shape)?)])
    }
}

/// Reduces to a broadcast-compatible smaller shape by summing the stretched
/// axes. The adjoint of `broadcast_to`.
pub struct SumTo {
    pub shape: Vec<usize>,
}

impl Function for SumTo {
    fn name(&self) -> &'static str {
        "sum_to"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 1)?;
        if !kusari_core::layout::broadcast_compatible(&self.shape, &in_types[0].shape) {
            return Err(Error::IncompatibleShape(format!(
                "cannot reduce {:?} to {:?}",
                in_types[0].shape, self.shape
            )));
        }
        Ok(())
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].sum_to(&self.shape)?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None]);
        };
        let shape = ctx.input_shape(0)?;
        Ok(vec![Some(super::broadcast_to(gy, &shape)?)])
    }
}

pub fn sum(x: &Variable) -> Result<Variable> {
    apply_single(Sum, &[x.clone()])
}

pub fn sum_to(x: &Variable, shape: &[usize]) -> Result<Variable> {
    apply_single(
        SumTo {
            shape: shape.to_vec(),
        },
        &[x.clone()],
    )
}
