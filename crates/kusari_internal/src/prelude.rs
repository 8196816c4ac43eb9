pub use crate::autograd::{
    apply, backward, config::no_grad, ops, BackwardArgs, Function, GradAccumPolicy, Initializer,
    Parameter, Sgd, UpdateRule, Variable,
};
pub use crate::core::{
    device::{get_default_device, set_default_device, Device},
    dtype::*,
    scalar::Scalar,
    NdArray,
};
pub use crate::{bf16, f16};
