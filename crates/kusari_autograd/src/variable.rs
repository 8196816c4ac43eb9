use crate::backward::{self, BackwardArgs};
use crate::config;
use crate::function::FunctionNode;
use crate::node::VariableNode;
use kusari_core::{DType, Device, Error, NdArray, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// User-facing handle to a graph node.
///
/// Cloning is cheap and shares the node, so two clones see the same array,
/// gradient and history. A variable may be uninitialized (no array yet), which
/// is how lazily-shaped parameters start out.
#[derive(Clone)]
pub struct Variable {
    node: VariableNode,
}

impl Variable {
    /// Wraps an array. Floating-point variables participate in grad by
    /// default, integer and boolean ones never do.
    pub fn new(array: NdArray) -> Self {
        let requires_grad = array.dtype().is_float();
        Self::with_requires_grad(array, requires_grad)
    }

    /// Wraps an array that never requires grad.
    pub fn constant(array: NdArray) -> Self {
        Self::with_requires_grad(array, false)
    }

    pub fn with_requires_grad(array: NdArray, requires_grad: bool) -> Self {
        let requires_grad = requires_grad && array.dtype().is_float();
        Self {
            node: VariableNode::new(Some(array), requires_grad, None),
        }
    }

    /// A variable with no array yet. Reading metadata returns `None` until
    /// data is attached with `set_array`.
    pub fn uninitialized() -> Self {
        Self {
            node: VariableNode::new(None, true, None),
        }
    }

    pub fn named(array: NdArray, name: impl Into<String>) -> Self {
        let var = Self::new(array);
        var.node.set_name(name);
        var
    }

    pub(crate) fn from_node(node: VariableNode) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &VariableNode {
        &self.node
    }

    pub fn array(&self) -> Option<NdArray> {
        self.node.data()
    }

    pub fn set_array(&self, array: NdArray) {
        self.node.set_data(array);
    }

    pub fn is_initialized(&self) -> bool {
        self.node.has_data()
    }

    pub fn shape(&self) -> Option<Vec<usize>> {
        self.node.shape()
    }

    pub fn ndim(&self) -> Option<usize> {
        self.node.shape().map(|s| s.len())
    }

    pub fn size(&self) -> Option<usize> {
        self.node.shape().map(|s| s.iter().product())
    }

    pub fn dtype(&self) -> Option<DType> {
        self.node.dtype()
    }

    pub fn device(&self) -> Device {
        self.node.device()
    }

    pub fn rank(&self) -> usize {
        self.node.rank()
    }

    pub fn requires_grad(&self) -> bool {
        self.node.requires_grad()
    }

    pub fn set_requires_grad(&self, requires_grad: bool) {
        self.node.set_requires_grad(requires_grad);
    }

    pub fn name(&self) -> Option<String> {
        self.node.name()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.node.set_name(name);
    }

    pub fn creator(&self) -> Option<Arc<FunctionNode>> {
        self.node.creator()
    }

    /// Re-binds this variable's creating function, bumping the rank to one
    /// past the function's.
    pub fn set_creator(&self, creator: &Arc<FunctionNode>) {
        self.node.set_creator(creator);
    }

    /// Lower-level alias of `set_creator` taking the applied-function record
    /// directly. Functions and their graph records are one type here, so the
    /// two entry points coincide.
    pub fn set_creator_node(&self, creator: &Arc<FunctionNode>) {
        self.node.set_creator(creator);
    }

    /// Cuts the edge to this variable's creator.
    pub fn unchain(&self) {
        self.node.unchain();
    }

    /// Cuts every creator edge in the history reachable from this variable.
    /// Arrays and gradients stay; only backward connectivity is lost.
    pub fn unchain_backward(&self) {
        let mut stack: Vec<Arc<FunctionNode>> = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();
        if let Some(creator) = self.node.creator() {
            seen.insert(creator.id());
            stack.push(creator);
        }
        while let Some(func) = stack.pop() {
            for input in func.inputs() {
                if let Some(creator) = input.creator() {
                    if seen.insert(creator.id()) {
                        stack.push(creator);
                    }
                }
            }
            func.unchain();
        }
    }

    /// The gradient as a plain array.
    pub fn grad(&self) -> Option<NdArray> {
        self.node.grad().and_then(|g| g.array())
    }

    /// The gradient as a variable. With double backprop enabled this carries
    /// its own history and can itself be differentiated.
    pub fn grad_var(&self) -> Option<Variable> {
        self.node.grad()
    }

    /// Assigns a gradient array, validating dtype, shape and device against
    /// this variable's array before anything is stored.
    pub fn set_grad(&self, grad: Option<NdArray>) -> Result<()> {
        self.set_grad_var(grad.map(Variable::constant))
    }

    pub fn set_grad_var(&self, grad: Option<Variable>) -> Result<()> {
        if let Some(grad) = &grad {
            let data = self.array().ok_or_else(|| Error::Uninitialized {
                what: "variable receiving a gradient".to_string(),
            })?;
            let grad_array = grad.array().ok_or_else(|| Error::Uninitialized {
                what: "gradient variable".to_string(),
            })?;
            if grad_array.dtype() != data.dtype() {
                return Err(Error::DTypeMismatch {
                    expected: data.dtype(),
                    got: grad_array.dtype(),
                });
            }
            if grad_array.shape() != data.shape() {
                return Err(Error::ShapeMismatch {
                    expected: data.shape().to_vec(),
                    got: grad_array.shape().to_vec(),
                });
            }
            if !grad_array.device().is_compatible_with(&data.device()) {
                return Err(Error::GradDeviceMismatch {
                    expected: data.device(),
                    got: grad_array.device(),
                });
            }
            if config::strict_nonfinite_check() && grad_array.has_nonfinite() {
                return Err(Error::NonFiniteGrad {
                    what: "assigned gradient".to_string(),
                });
            }
        }
        self.node.set_grad(grad);
        Ok(())
    }

    /// Drops the gradient. The preferred way to reset between iterations.
    pub fn cleargrad(&self) {
        self.node.set_grad(None);
    }

    /// Resets the gradient to zeros of the array's shape.
    #[deprecated(note = "use cleargrad; a zero-filled gradient costs memory for no benefit")]
    pub fn zerograd(&self) -> Result<()> {
        let Some(data) = self.array() else {
            self.node.set_grad(None);
            return Ok(());
        };
        match self.grad() {
            Some(mut existing) => {
                existing.fill_(0.0)?;
                self.node.set_grad(Some(Variable::constant(existing)));
            }
            None => {
                self.node
                    .set_grad(Some(Variable::constant(NdArray::zeros_like(&data)?)));
            }
        }
        Ok(())
    }

    /// Adds `other`'s gradient into this variable's gradient, transferring
    /// across devices toward this variable. A missing source gradient is a
    /// no-op; a missing destination gradient becomes a copy of the source.
    pub fn addgrad(&self, other: &Variable) -> Result<()> {
        let Some(src) = other.grad_var() else {
            return Ok(());
        };
        let src_array = src.array().ok_or_else(|| Error::Uninitialized {
            what: "source gradient".to_string(),
        })?;
        match self.grad_var() {
            Some(dst) => {
                let dst_array = dst.array().ok_or_else(|| Error::Uninitialized {
                    what: "destination gradient".to_string(),
                })?;
                let moved = src_array.to_device(dst_array.device())?;
                let total = dst_array.add(&moved)?;
                self.set_grad(Some(total))?;
            }
            None => {
                let device = self
                    .array()
                    .map(|a| a.device())
                    .unwrap_or_else(|| self.node.device());
                let copied = src_array.to_device(device)?.deep_copy()?;
                self.set_grad(Some(copied))?;
            }
        }
        Ok(())
    }

    /// Copies `other`'s array into this variable's array, transferring to
    /// this variable's device. Initializes this variable if it has no array;
    /// does nothing when the source has none.
    pub fn copydata(&self, other: &Variable) -> Result<()> {
        let Some(src) = other.array() else {
            return Ok(());
        };
        match self.array() {
            Some(mut dst) => {
                dst.copy_from(&src)?;
                self.node.set_data(dst);
            }
            None => {
                let copied = src.to_device(self.node.device())?.deep_copy()?;
                self.node.set_data(copied);
            }
        }
        Ok(())
    }

    /// Moves the variable's array (and gradient, if any) to another device in
    /// place. History is preserved.
    pub fn to_device(&self, device: Device) -> Result<()> {
        if let Some(data) = self.array() {
            self.node.set_data(data.to_device(device)?);
        } else {
            self.node.set_device(device);
        }
        if let Some(grad) = self.grad() {
            self.node
                .set_grad(Some(Variable::constant(grad.to_device(device)?)));
        }
        Ok(())
    }

    pub fn item(&self) -> Result<kusari_core::Scalar> {
        let array = self.array().ok_or_else(|| Error::Uninitialized {
            what: "variable".to_string(),
        })?;
        array.item()
    }

    /// Runs backward with default options: gradients on terminals and leaves
    /// only, no second-order graph, no loss scaling.
    pub fn backward(&self) -> Result<()> {
        self.backward_with(&BackwardArgs::default())
    }

    pub fn backward_with(&self, args: &BackwardArgs) -> Result<()> {
        if self.node.grad_chain_broken() {
            return Err(Error::GradChainUnavailable);
        }
        if !self.node.requires_grad() {
            return Ok(());
        }
        backward::backward(&[self.clone()], args)
    }

    fn label(&self) -> String {
        self.name().unwrap_or_else(|| "variable".to_string())
    }
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name())
            .field("shape", &self.shape())
            .field("dtype", &self.dtype())
            .field("requires_grad", &self.requires_grad())
            .field("rank", &self.rank())
            .finish()
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.array() {
            Some(array) => write!(f, "{}({})", self.label(), array),
            None => write!(f, "{}(uninitialized)", self.label()),
        }
    }
}
