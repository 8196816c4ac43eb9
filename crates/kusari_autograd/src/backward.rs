use crate::config::{self, GradAccumPolicy};
use crate::function::{BackwardContext, FunctionNode};
use crate::node::VariableNode;
use crate::ops;
use crate::variable::Variable;
use kusari_core::{Error, NdArray, Result};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

/// Options for a single backward traversal.
#[derive(Clone, Debug)]
pub struct BackwardArgs {
    /// Keep gradients on intermediate variables instead of discarding them
    /// once their consumer has run.
    pub retain_grad: bool,
    /// Record a graph while computing gradients, so the gradients themselves
    /// can be differentiated.
    pub enable_double_backprop: bool,
    /// Premultiplies the seed gradient, for mixed-precision loss scaling.
    pub loss_scale: Option<f64>,
}

impl Default for BackwardArgs {
    fn default() -> Self {
        Self {
            retain_grad: false,
            enable_double_backprop: false,
            loss_scale: None,
        }
    }
}

struct Candidate {
    rank: usize,
    order: usize,
    func: Arc<FunctionNode>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.order == other.order
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Max-heap: deepest rank first, earliest discovery first among equals.
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| other.order.cmp(&self.order))
    }
}

struct PendingGrad {
    node: VariableNode,
    parts: Vec<Variable>,
}

/// Gradient contributions in flight, keyed by node identity.
///
/// Under the eager policy each push folds into a single running sum; under the
/// lazy policy pushes append and the list is summed left to right, in arrival
/// order, when the total is taken.
struct GradTable {
    policy: GradAccumPolicy,
    entries: HashMap<usize, PendingGrad>,
}

impl GradTable {
    fn new(policy: GradAccumPolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    /// Creates the entry if absent, adopting any gradient already stored on
    /// the node so repeated backward calls accumulate into leaves.
    fn touch(&mut self, node: &VariableNode) -> Result<()> {
        if let std::collections::hash_map::Entry::Vacant(slot) = self.entries.entry(node.id()) {
            let mut parts = Vec::new();
            if let Some(existing) = node.grad() {
                parts.push(existing);
            }
            slot.insert(PendingGrad {
                node: node.clone(),
                parts,
            });
        }
        Ok(())
    }

    fn push(&mut self, node: &VariableNode, grad: Variable) -> Result<()> {
        self.touch(node)?;
        let entry = self
            .entries
            .get_mut(&node.id())
            .ok_or_else(|| Error::Internal {
                message: "gradient table entry vanished".to_string(),
            })?;
        match self.policy {
            GradAccumPolicy::Eager => {
                if let Some(running) = entry.parts.pop() {
                    let combined = ops::add(&running, &grad)?;
                    entry.parts.push(combined);
                } else {
                    entry.parts.push(grad);
                }
            }
            GradAccumPolicy::Lazy => entry.parts.push(grad),
        }
        Ok(())
    }

    /// Removes the entry and returns the summed gradient, if any arrived.
    fn take(&mut self, node_id: usize) -> Result<Option<Variable>> {
        match self.entries.remove(&node_id) {
            Some(pending) => sum_parts(pending.parts),
            None => Ok(None),
        }
    }

    fn drain(self) -> Vec<PendingGrad> {
        self.entries.into_values().collect()
    }
}

fn sum_parts(parts: Vec<Variable>) -> Result<Option<Variable>> {
    let mut iter = parts.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    let mut total = first;
    for part in iter {
        total = ops::add(&total, &part)?;
    }
    Ok(Some(total))
}

fn ones_seed(data: &NdArray) -> Result<Variable> {
    Ok(Variable::constant(NdArray::ones_like(data)?))
}

/// Runs reverse-mode differentiation from the given terminal variables down
/// to the leaves, writing accumulated gradients onto terminal and leaf nodes
/// (and onto intermediates when `retain_grad` is set).
pub fn backward(outputs: &[Variable], args: &BackwardArgs) -> Result<()> {
    let mut table = GradTable::new(config::grad_accum_policy());
    let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
    let mut seen: HashSet<usize> = HashSet::new();
    let mut order: usize = 0;

    for output in outputs {
        let node = output.node().clone();
        if !node.requires_grad() {
            continue;
        }
        let data = node.data().ok_or_else(|| Error::Uninitialized {
            what: "terminal variable of backward".to_string(),
        })?;
        let mut seed = match node.grad() {
            Some(existing) => existing,
            None => {
                if data.size() != 1 {
                    return Err(Error::BackwardSeedMissing {
                        shape: data.shape().to_vec(),
                    });
                }
                ones_seed(&data)?
            }
        };
        if let Some(scale) = args.loss_scale {
            seed = ops::mul_scalar(&seed, scale)?;
        }
        if config::strict_nonfinite_check() {
            if let Some(array) = seed.array() {
                if array.has_nonfinite() {
                    return Err(Error::NonFiniteGrad {
                        what: "gradient seed of backward terminal".to_string(),
                    });
                }
            }
        }
        node.set_grad(Some(seed));
        table.touch(&node)?;
        if let Some(creator) = node.creator() {
            if seen.insert(creator.id()) {
                heap.push(Candidate {
                    rank: creator.rank(),
                    order,
                    func: creator,
                });
                order += 1;
            }
        }
    }

    // Without double backprop the whole traversal runs grad-free, so gradient
    // variables come out detached.
    let _guard = if args.enable_double_backprop {
        None
    } else {
        Some(config::no_grad())
    };

    while let Some(Candidate { func, .. }) = heap.pop() {
        let mut grad_outputs: Vec<Option<Variable>> = Vec::with_capacity(func.outputs().len());
        for weak in func.outputs() {
            let grad = match weak.upgrade() {
                Some(out_node) => {
                    let grad = table.take(out_node.id())?;
                    if let Some(g) = &grad {
                        let keep = args.retain_grad || out_node.grad().is_some();
                        if keep {
                            if !args.enable_double_backprop {
                                g.node().set_grad_chain_broken(true);
                            }
                            out_node.set_grad(Some(g.clone()));
                        } else {
                            out_node.set_grad(None);
                        }
                    }
                    grad
                }
                None => None,
            };
            grad_outputs.push(grad);
        }

        let targets: Vec<usize> = func
            .inputs()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.requires_grad())
            .map(|(i, _)| i)
            .collect();
        if targets.is_empty() || grad_outputs.iter().all(|g| g.is_none()) {
            continue;
        }

        // Under the eager policy the running sum for each target is handed to
        // the operation so a fused kernel can fold it in. A node appearing at
        // several input positions receives it at the first position only.
        let mut grad_inputs: Vec<Option<Variable>> = vec![None; func.inputs().len()];
        if config::grad_accum_policy() == GradAccumPolicy::Eager {
            let mut handed: HashSet<usize> = HashSet::new();
            for &i in &targets {
                let node = &func.inputs()[i];
                if handed.insert(node.id()) {
                    grad_inputs[i] = table.take(node.id())?;
                }
            }
        }

        let ctx = BackwardContext {
            node: &func,
            grad_outputs: &grad_outputs,
            target_indexes: &targets,
        };
        let gxs = func
            .run_backward_accumulate(&ctx, &grad_inputs)
            .map_err(|err| err.with_traceback(func.traceback()))?;
        if gxs.len() != func.inputs().len() {
            return Err(Error::Internal {
                message: format!(
                    "{}: backward returned {} gradients for {} inputs",
                    func.label(),
                    gxs.len(),
                    func.inputs().len()
                ),
            });
        }

        for &i in &targets {
            let Some(gx) = &gxs[i] else { continue };
            let input_node = &func.inputs()[i];
            check_grad(&func, i, input_node, gx)?;
            table.push(input_node, gx.clone())?;
            if let Some(creator) = input_node.creator() {
                if seen.insert(creator.id()) {
                    heap.push(Candidate {
                        rank: creator.rank(),
                        order,
                        func: creator,
                    });
                    order += 1;
                }
            }
        }
    }

    for pending in table.drain() {
        let PendingGrad { node, parts } = pending;
        if let Some(total) = sum_parts(parts)? {
            if !args.enable_double_backprop {
                total.node().set_grad_chain_broken(true);
            }
            node.set_grad(Some(total));
        }
    }

    Ok(())
}

/// Gradients must metadata-match the input they flow into; a mismatch is an
/// operation bug, reported with the failing operation's name (and creation
/// site when debug mode captured one).
fn check_grad(
    func: &Arc<FunctionNode>,
    index: usize,
    input_node: &VariableNode,
    grad: &Variable,
) -> Result<()> {
    let array = grad.array().ok_or_else(|| {
        Error::Internal {
            message: format!("{}: gradient {} has no data", func.label(), index),
        }
        .with_traceback(func.traceback())
    })?;
    if let Some(expected) = input_node.dtype() {
        if array.dtype() != expected {
            return Err(Error::GradDTypeMismatch {
                op: func.label().to_string(),
                expected,
                got: array.dtype(),
            }
            .with_traceback(func.traceback()));
        }
    }
    if let Some(expected) = input_node.shape() {
        if array.shape() != expected.as_slice() {
            return Err(Error::GradShapeMismatch {
                op: func.label().to_string(),
                expected,
                got: array.shape().to_vec(),
            }
            .with_traceback(func.traceback()));
        }
    }
    if !array.device().is_compatible_with(&input_node.device()) {
        return Err(Error::GradDeviceMismatch {
            expected: input_node.device(),
            got: array.device(),
        }
        .with_traceback(func.traceback()));
    }
    Ok(())
}
