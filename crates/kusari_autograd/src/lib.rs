pub mod backward;
pub mod config;
pub mod function;
pub mod node;
pub mod ops;
pub mod parameter;
#[cfg(feature = "serde")]
mod serde;
pub mod variable;

pub use backward::{backward, BackwardArgs};
pub use config::GradAccumPolicy;
pub use function::{apply, ApplyContext, ArgInfo, BackwardContext, Function, FunctionNode};
pub use node::{VariableNode, WeakVariableNode};
pub use parameter::{Initializer, Parameter, Sgd, UpdateRule};
pub use variable::Variable;
