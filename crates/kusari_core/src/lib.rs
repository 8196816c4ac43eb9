pub mod array;
pub mod be;
pub mod buffer;
pub mod device;
pub mod dtype;
pub mod error;
pub mod layout;
pub mod scalar;
#[cfg(feature = "serde")]
pub mod serde;

pub use array::NdArray;
pub use device::{auto_set_device, get_default_device, set_default_device, Device};
pub use dtype::{get_default_dtype, set_default_dtype, DType};
pub use error::{Error, Result};
pub use layout::Layout;
pub use scalar::Scalar;
