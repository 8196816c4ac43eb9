use crate::{device::Device, dtype::DType};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    OutOfMemory,
    DTypeMismatch {
        expected: DType,
        got: DType,
    },
    DeviceMismatch {
        expected: Device,
        got: Device,
    },
    UnsupportedDType,
    InvalidArgument(String),
    IncompatibleShape(String),
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    IndexOutOfBounds {
        index: usize,
        size: usize,
    },
    BufferShared,
    Uninitialized {
        what: String,
    },
    // autograd
    TypeCheckFailed {
        op: String,
        message: String,
    },
    GradDTypeMismatch {
        op: String,
        expected: DType,
        got: DType,
    },
    GradShapeMismatch {
        op: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    GradDeviceMismatch {
        expected: Device,
        got: Device,
    },
    GradChainUnavailable,
    NonFiniteGrad {
        what: String,
    },
    BackwardSeedMissing {
        shape: Vec<usize>,
    },
    Traced {
        traceback: String,
        source: Box<Error>,
    },
    #[cfg(feature = "serde")]
    SerializationError(String),
    #[cfg(feature = "serde")]
    DeserializationError(String),
    Internal {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "Out of memory"),
            Self::DTypeMismatch { expected, got } => {
                write!(f, "DType mismatch: expected {:?}, got {:?}", expected, got)
            }
            Self::DeviceMismatch { expected, got } => {
                write!(f, "Device mismatch: expected {}, got {}", expected.name(), got.name())
            }
            Self::UnsupportedDType => write!(f, "Unsupported data type"),
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Self::IncompatibleShape(msg) => write!(f, "Incompatible shape: {}", msg),
            Self::ShapeMismatch { expected, got } => {
                write!(f, "Shape mismatch: expected {:?}, got {:?}", expected, got)
            }
            Self::IndexOutOfBounds { index, size } => {
                write!(f, "Index out of bounds: index {} is out of bounds for size {}", index, size)
            }
            Self::BufferShared => write!(f, "Buffer is shared"),
            Self::Uninitialized { what } => write!(f, "Uninitialized: {}", what),
            Self::TypeCheckFailed { op, message } => {
                write!(f, "Type check failed in {}: {}", op, message)
            }
            Self::GradDTypeMismatch { op, expected, got } => {
                write!(
                    f,
                    "Gradient dtype mismatch in backward of {}: expected {:?}, got {:?}",
                    op, expected, got
                )
            }
            Self::GradShapeMismatch { op, expected, got } => {
                write!(
                    f,
                    "Gradient shape mismatch in backward of {}: expected {:?}, got {:?}",
                    op, expected, got
                )
            }
            Self::GradDeviceMismatch { expected, got } => {
                write!(
                    f,
                    "Gradient device mismatch: expected {}, got {}",
                    expected.name(),
                    got.name()
                )
            }
            Self::GradChainUnavailable => {
                write!(
                    f,
                    "This gradient was computed without enable_double_backprop; \
                     it carries no creator chain to differentiate through"
                )
            }
            Self::NonFiniteGrad { what } => write!(f, "Non-finite gradient: {}", what),
            Self::BackwardSeedMissing { shape } => {
                write!(
                    f,
                    "backward() on a non-scalar output of shape {:?} requires an explicit gradient seed",
                    shape
                )
            }
            Self::Traced { traceback, source } => {
                write!(f, "{}\n(creation site of the failing operation)\n{}", source, traceback)
            }
            #[cfg(feature = "serde")]
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            #[cfg(feature = "serde")]
            Self::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Traced { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl Error {
    /// Attaches a creation-site traceback captured in debug mode.
    pub fn with_traceback(self, traceback: Option<&str>) -> Self {
        match traceback {
            Some(tb) => Self::Traced {
                traceback: tb.to_string(),
                source: Box::new(self),
            },
            None => self,
        }
    }
}
