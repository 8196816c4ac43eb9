use crate::config;
use crate::node::{VariableNode, WeakVariableNode};
use crate::variable::Variable;
use kusari_core::{DType, Device, Error, NdArray, Result};
use std::sync::Arc;

/// Metadata of one input as seen by `check_type_forward`.
#[derive(Clone, Debug)]
pub struct ArgInfo {
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub device: Device,
}

/// Forward-pass hook through which an operation declares which inputs and
/// outputs its backward pass will need.
///
/// Retained inputs stay alive through the node's input edges regardless, so
/// declaring them documents intent and guards index misuse. Retained outputs
/// are snapshotted, which keeps backward working even after every user handle
/// to the output has been dropped.
#[derive(Default)]
pub struct ApplyContext {
    retain_inputs: Vec<usize>,
    retain_outputs: Vec<usize>,
}

impl ApplyContext {
    pub fn retain_inputs(&mut self, indexes: &[usize]) {
        self.retain_inputs.extend_from_slice(indexes);
    }

    pub fn retain_outputs(&mut self, indexes: &[usize]) {
        self.retain_outputs.extend_from_slice(indexes);
    }
}

/// A differentiable operation.
///
/// `forward` maps arrays to arrays; `backward` maps output gradients to input
/// gradients as variables, so running it with backprop enabled records a graph
/// for double differentiation. Exactly one of `backward` and
/// `backward_accumulate` must be overridden.
pub trait Function: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Validates input metadata before any array is touched. Errors raised
    /// here are wrapped so the failing operation is named in the message.
    fn check_type_forward(&self, _in_types: &[ArgInfo]) -> Result<()> {
        Ok(())
    }

    fn forward(&self, ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>>;

    /// Returns one gradient slot per input. Slots for inputs outside
    /// `ctx.target_indexes()` are ignored and may be `None`.
    fn backward(&self, _ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        Err(Error::Internal {
            message: format!("{}: backward is not implemented", self.name()),
        })
    }

    /// Fused backward-and-accumulate step. The default composes `backward`
    /// with an addition per slot; operations override this when a fused
    /// kernel computes `gx + g_in` with fewer roundings.
    fn backward_accumulate(
        &self,
        ctx: &BackwardContext<'_>,
        grad_inputs: &[Option<Variable>],
    ) -> Result<Vec<Option<Variable>>> {
        let gxs = self.backward(ctx)?;
        let mut merged = Vec::with_capacity(gxs.len());
        for (gx, pending) in gxs.into_iter().zip(grad_inputs.iter()) {
            merged.push(match (gx, pending) {
                (Some(gx), Some(pending)) => Some(crate::ops::add(&gx, pending)?),
                (Some(gx), None) => Some(gx),
                (None, Some(pending)) => Some(pending.clone()),
                (None, None) => None,
            });
        }
        Ok(merged)
    }
}

/// Graph record of one applied operation.
///
/// Holds strong edges to its input nodes and weak edges to its outputs, so a
/// retained output variable keeps its whole history alive while a dropped
/// output lets the subgraph above it deallocate.
pub struct FunctionNode {
    func: Box<dyn Function>,
    inputs: Vec<VariableNode>,
    outputs: Vec<WeakVariableNode>,
    rank: usize,
    retained_inputs: Vec<usize>,
    retained_outputs: Vec<(usize, NdArray)>,
    label: String,
    traceback: Option<String>,
}

impl FunctionNode {
    /// Rank of the operation: the maximum rank among its inputs. Every output
    /// node sits one rank above this.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn inputs(&self) -> &[VariableNode] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[WeakVariableNode] {
        &self.outputs
    }

    /// Creation-site backtrace, captured only while debug mode is on.
    pub fn traceback(&self) -> Option<&str> {
        self.traceback.as_deref()
    }

    pub fn id(&self) -> usize {
        self as *const FunctionNode as *const () as usize
    }

    pub fn retained_input(&self, index: usize) -> Result<Variable> {
        if !self.retained_inputs.contains(&index) {
            return Err(Error::Internal {
                message: format!("{}: input {} was not retained", self.label, index),
            });
        }
        let node = self.inputs.get(index).ok_or_else(|| Error::Internal {
            message: format!("{}: no input {}", self.label, index),
        })?;
        Ok(Variable::from_node(node.clone()))
    }

    /// Recovers an output as a variable. If every user handle to the output
    /// has been dropped, the node is rebuilt from the snapshot taken at
    /// forward time and re-linked to this function.
    pub fn retained_output(self: &Arc<Self>, index: usize) -> Result<Variable> {
        let weak = self.outputs.get(index).ok_or_else(|| Error::Internal {
            message: format!("{}: no output {}", self.label, index),
        })?;
        if let Some(node) = weak.upgrade() {
            if node.has_data() {
                return Ok(Variable::from_node(node));
            }
        }
        let snapshot = self
            .retained_outputs
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, array)| array.clone())
            .ok_or_else(|| Error::Internal {
                message: format!("{}: output {} was not retained", self.label, index),
            })?;
        let var = Variable::with_requires_grad(snapshot, true);
        var.node().set_creator(self);
        Ok(var)
    }

    /// Cuts the creator edge of every still-alive output.
    pub fn unchain(&self) {
        for weak in &self.outputs {
            if let Some(node) = weak.upgrade() {
                node.unchain();
            }
        }
    }

    pub(crate) fn run_backward_accumulate(
        &self,
        ctx: &BackwardContext<'_>,
        grad_inputs: &[Option<Variable>],
    ) -> Result<Vec<Option<Variable>>> {
        self.func.backward_accumulate(ctx, grad_inputs)
    }
}

impl std::fmt::Debug for FunctionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionNode")
            .field("label", &self.label)
            .field("rank", &self.rank)
            .field("num_inputs", &self.inputs.len())
            .field("num_outputs", &self.outputs.len())
            .finish()
    }
}

/// Everything an operation's backward pass may consult.
pub struct BackwardContext<'a> {
    pub(crate) node: &'a Arc<FunctionNode>,
    pub(crate) grad_outputs: &'a [Option<Variable>],
    pub(crate) target_indexes: &'a [usize],
}

impl BackwardContext<'_> {
    pub fn op_name(&self) -> &str {
        self.node.label()
    }

    pub fn num_inputs(&self) -> usize {
        self.node.inputs().len()
    }

    pub fn num_outputs(&self) -> usize {
        self.node.outputs().len()
    }

    /// Input indexes whose gradients the traversal actually needs.
    pub fn target_indexes(&self) -> &[usize] {
        self.target_indexes
    }

    pub fn grad_output(&self, index: usize) -> Option<&Variable> {
        self.grad_outputs.get(index).and_then(|g| g.as_ref())
    }

    pub fn retained_input(&self, index: usize) -> Result<Variable> {
        self.node.retained_input(index)
    }

    pub fn retained_output(&self, index: usize) -> Result<Variable> {
        self.node.retained_output(index)
    }

    pub fn input_shape(&self, index: usize) -> Result<Vec<usize>> {
        let node = self
            .node
            .inputs()
            .get(index)
            .ok_or_else(|| Error::Internal {
                message: format!("{}: no input {}", self.op_name(), index),
            })?;
        node.shape().ok_or_else(|| Error::Uninitialized {
            what: format!("input {} of {}", index, self.op_name()),
        })
    }

    pub fn input_dtype(&self, index: usize) -> Result<DType> {
        let node = self
            .node
            .inputs()
            .get(index)
            .ok_or_else(|| Error::Internal {
                message: format!("{}: no input {}", self.op_name(), index),
            })?;
        node.dtype().ok_or_else(|| Error::Uninitialized {
            what: format!("input {} of {}", index, self.op_name()),
        })
    }
}

/// Runs an operation on variables, recording the graph edge when backprop is
/// enabled and at least one input requires grad.
pub fn apply(func: impl Function, inputs: &[Variable]) -> Result<Vec<Variable>> {
    let func: Box<dyn Function> = Box::new(func);
    let label = func.name().to_string();

    let mut in_types = Vec::with_capacity(inputs.len());
    let mut arrays = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        let array = input.array().ok_or_else(|| Error::Uninitialized {
            what: format!("input {} of {}", i, label),
        })?;
        in_types.push(ArgInfo {
            shape: array.shape().to_vec(),
            dtype: array.dtype(),
            device: array.device(),
        });
        arrays.push(array);
    }
    func.check_type_forward(&in_types)
        .map_err(|err| Error::TypeCheckFailed {
            op: label.clone(),
            message: err.to_string(),
        })?;

    let mut ctx = ApplyContext::default();
    let out_arrays = func.forward(&mut ctx, &arrays)?;

    let record = config::backprop_enabled() && inputs.iter().any(|v| v.requires_grad());

    let out_vars: Vec<Variable> = out_arrays
        .iter()
        .map(|array| Variable::with_requires_grad(array.clone(), record && array.dtype().is_float()))
        .collect();

    if record {
        let rank = inputs
            .iter()
            .map(|v| v.node().rank())
            .max()
            .unwrap_or(0);
        let retained_outputs = ctx
            .retain_outputs
            .iter()
            .filter_map(|&i| out_arrays.get(i).map(|a| (i, a.clone())))
            .collect();
        let traceback = if config::debug_mode() {
            Some(std::backtrace::Backtrace::force_capture().to_string())
        } else {
            None
        };
        let node = Arc::new(FunctionNode {
            func,
            inputs: inputs.iter().map(|v| v.node().clone()).collect(),
            outputs: out_vars.iter().map(|v| v.node().downgrade()).collect(),
            rank,
            retained_inputs: ctx.retain_inputs,
            retained_outputs,
            label,
            traceback,
        });
        for var in &out_vars {
            if var.requires_grad() {
                var.node().set_creator(&node);
            }
        }
    }

    Ok(out_vars)
}

pub(crate) fn apply_single(func: impl Function, inputs: &[Variable]) -> Result<Variable> {
    let label = func.name();
    apply(func, inputs)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Internal {
            message: format!("{}: forward produced no output", label),
        })
}
