pub mod cpu;

use crate::{
    device::Device,
    dtype::DType,
    error::{Error, Result},
};

/// Backing storage for one contiguous run of elements of a single dtype.
///
/// The autodiff engine never touches buffers directly; it goes through
/// `NdArray`. Kernels receive typed views obtained from the raw bytes.
pub trait Buffer: Send + Sync {
    fn as_bytes(&self) -> &[u8];
    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Number of elements, not bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dtype(&self) -> DType;
    fn device(&self) -> Device;

    fn copy_from(&mut self, other: &dyn Buffer) -> Result<()> {
        if self.len() != other.len() {
            return Err(Error::InvalidArgument("Buffer size mismatch".into()));
        }
        if self.dtype() != other.dtype() {
            return Err(Error::DTypeMismatch {
                expected: self.dtype(),
                got: other.dtype(),
            });
        }
        self.as_bytes_mut().copy_from_slice(other.as_bytes());
        Ok(())
    }

    fn to_host_vec(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }
}
