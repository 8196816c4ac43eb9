use crate::function::FunctionNode;
use crate::variable::Variable;
use kusari_core::{get_default_device, DType, Device, NdArray};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

pub(crate) struct NodeInner {
    pub data: Option<NdArray>,
    pub shape: Option<Vec<usize>>,
    pub dtype: Option<DType>,
    pub device: Device,
    pub rank: usize,
    pub creator: Option<Arc<FunctionNode>>,
    pub requires_grad: bool,
    pub grad: Option<Variable>,
    pub grad_chain_broken: bool,
    pub name: Option<String>,
}

/// Shared handle to a node of the computational graph.
///
/// A node owns the variable's array (if initialized), its topological rank and
/// the strong reference to the function that created it. All `Variable` handles
/// for the same value point at the same node, so graph edits made through one
/// handle are visible through every other.
#[derive(Clone)]
pub struct VariableNode {
    inner: Arc<Mutex<NodeInner>>,
}

/// Non-owning handle used for creator-to-output edges.
#[derive(Clone)]
pub struct WeakVariableNode {
    inner: Weak<Mutex<NodeInner>>,
}

impl WeakVariableNode {
    pub fn upgrade(&self) -> Option<VariableNode> {
        self.inner.upgrade().map(|inner| VariableNode { inner })
    }
}

impl VariableNode {
    pub(crate) fn new(data: Option<NdArray>, requires_grad: bool, name: Option<String>) -> Self {
        let (shape, dtype, device) = match &data {
            Some(array) => (
                Some(array.shape().to_vec()),
                Some(array.dtype()),
                array.device(),
            ),
            None => (None, None, get_default_device()),
        };
        Self {
            inner: Arc::new(Mutex::new(NodeInner {
                data,
                shape,
                dtype,
                device,
                rank: 0,
                creator: None,
                requires_grad,
                grad: None,
                grad_chain_broken: false,
                name,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NodeInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stable identity for the lifetime of the node, used as a map key during
    /// backward traversal.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &VariableNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakVariableNode {
        WeakVariableNode {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn data(&self) -> Option<NdArray> {
        self.lock().data.clone()
    }

    pub fn has_data(&self) -> bool {
        self.lock().data.is_some()
    }

    pub fn set_data(&self, data: NdArray) {
        let mut inner = self.lock();
        inner.shape = Some(data.shape().to_vec());
        inner.dtype = Some(data.dtype());
        inner.device = data.device();
        inner.data = Some(data);
    }

    pub fn shape(&self) -> Option<Vec<usize>> {
        self.lock().shape.clone()
    }

    pub fn dtype(&self) -> Option<DType> {
        self.lock().dtype
    }

    pub fn device(&self) -> Device {
        self.lock().device
    }

    pub(crate) fn set_device(&self, device: Device) {
        self.lock().device = device;
    }

    pub fn rank(&self) -> usize {
        self.lock().rank
    }

    pub fn requires_grad(&self) -> bool {
        self.lock().requires_grad
    }

    pub fn set_requires_grad(&self, requires_grad: bool) {
        self.lock().requires_grad = requires_grad;
    }

    pub fn creator(&self) -> Option<Arc<FunctionNode>> {
        self.lock().creator.clone()
    }

    /// Attaches the creating function and bumps the rank to one past it.
    pub fn set_creator(&self, creator: &Arc<FunctionNode>) {
        let mut inner = self.lock();
        inner.rank = creator.rank() + 1;
        inner.creator = Some(Arc::clone(creator));
    }

    /// Drops the creator edge. The node keeps its rank and data; it simply
    /// becomes a leaf of any future backward traversal.
    pub fn unchain(&self) {
        self.lock().creator = None;
    }

    pub fn grad(&self) -> Option<Variable> {
        self.lock().grad.clone()
    }

    pub(crate) fn set_grad(&self, grad: Option<Variable>) {
        self.lock().grad = grad;
    }

    pub fn grad_chain_broken(&self) -> bool {
        self.lock().grad_chain_broken
    }

    pub(crate) fn set_grad_chain_broken(&self, broken: bool) {
        self.lock().grad_chain_broken = broken;
    }

    pub fn name(&self) -> Option<String> {
        self.lock().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.lock().name = Some(name.into());
    }
}

impl std::fmt::Debug for VariableNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("VariableNode")
            .field("shape", &inner.shape)
            .field("dtype", &inner.dtype)
            .field("device", &inner.device)
            .field("rank", &inner.rank)
            .field("requires_grad", &inner.requires_grad)
            .field("has_creator", &inner.creator.is_some())
            .field("name", &inner.name)
            .finish()
    }
}
