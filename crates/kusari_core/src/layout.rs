use crate::error::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layout {
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl Layout {
    pub fn from_shape(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            strides: Self::compute_strides(shape),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn dim_size(&self, dim: usize) -> Option<usize> {
        self.shape.get(dim).copied()
    }

    pub fn view(&mut self, new_shape: &[usize]) -> Result<()> {
        let old_size = self.size();
        let new_size: usize = new_shape.iter().product();

        if old_size != new_size {
            return Err(Error::IncompatibleShape(format!(
                "Cannot reshape layout of size {} to size {}",
                old_size, new_size
            )));
        }

        self.shape = new_shape.to_vec();
        self.strides = Self::compute_strides(new_shape);

        Ok(())
    }

    // helper

    pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
        if shape.is_empty() {
            return vec![];
        }

        let mut strides = vec![1; shape.len()];
        for i in (0..shape.len() - 1).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        strides
    }

    pub fn compute_size(shape: &[usize]) -> usize {
        shape.iter().product()
    }

    /// Whether this layout can be broadcast to `target` under the usual
    /// right-aligned rules (missing or size-1 dims stretch).
    pub fn can_broadcast_to(&self, target: &[usize]) -> bool {
        broadcast_compatible(&self.shape, target)
    }

    /// Whether `target` is a valid reduction target for this layout,
    /// i.e. `target` broadcasts back to this shape.
    pub fn can_reduce_to(&self, target: &[usize]) -> bool {
        broadcast_compatible(target, &self.shape)
    }
}

pub fn broadcast_compatible(from: &[usize], to: &[usize]) -> bool {
    if from.len() > to.len() {
        return false;
    }

    let rank_diff = to.len() - from.len();
    for (i, &d) in from.iter().enumerate() {
        let t = to[rank_diff + i];
        if d != t && d != 1 {
            return false;
        }
    }
    true
}
