use super::check_arity;
use crate::function::{apply_single, ApplyContext, ArgInfo, BackwardContext, Function};
use crate::variable::Variable;
use kusari_core::{Error, NdArray, Result};

/// Stretches size-1 (or missing leading) axes up to the target shape.
pub struct BroadcastTo {
    pub shape: Vec<usize>,
}

impl Function for BroadcastTo {
    fn name(&self) -> &'static str {
        "broadcast_to"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 1)?;
        if !kusari_core::layout::broadcast_compatible(&in_types[0].shape, &self.shape) {
            return Err(Error::IncompatibleShape(format!(
                "cannot broadcast {:?} to {:?}",
                in_types[0].shape, self.shape
            )));
        }
        Ok(())
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].broadcast_to(&self.shape)?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None]);
        };
        let shape = ctx.input_shape(0)?;
        Ok(vec![Some(super::sum_to(gy, &shape)?)])
    }
}

/// Reinterprets the array with a new shape of the same total size.
pub struct Reshape {
    pub shape: Vec<usize>,
}

impl Function for Reshape {
    fn name(&self) -> &'static str {
        "reshape"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        check_arity(in_types, 1)?;
        let size: usize = in_types[0].shape.iter().product();
        let target: usize = self.shape.iter().product();
        if size != target {
            return Err(Error::IncompatibleShape(format!(
                "cannot reshape {:?} ({} elements) to {:?} ({} elements)",
                in_types[0].shape, size, self.shape, target
            )));
        }
        Ok(())
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].reshape(&self.shape)?])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None]);
        };
        let shape = ctx.input_shape(0)?;
        Ok(vec![Some(super::reshape(gy, &shape)?)])
    }
}

pub fn broadcast_to(x: &Variable, shape: &[usize]) -> Result<Variable> {
    apply_single(
        BroadcastTo {
            shape: shape.to_vec(),
        },
        &[x.clone()],
    )
}

pub fn reshape(x: &Variable, shape: &[usize]) -> Result<Variable> {
    apply_single(
        Reshape {
            shape: shape.to_vec(),
        },
        &[x.clone()],
    )
}
