pub mod ops;

use crate::buffer::Buffer;

/// Reinterprets a buffer's bytes as a typed slice.
///
/// # Safety
/// The buffer must actually hold elements of `T` (dtype checked by every
/// dispatch wrapper before calling this).
pub(crate) unsafe fn typed_slice<T>(buf: &dyn Buffer) -> &[T] {
    std::slice::from_raw_parts(buf.as_bytes().as_ptr() as *const T, buf.len())
}

/// # Safety
/// Same contract as [`typed_slice`].
pub(crate) unsafe fn typed_slice_mut<T>(buf: &mut dyn Buffer) -> &mut [T] {
    let len = buf.len();
    std::slice::from_raw_parts_mut(buf.as_bytes_mut().as_mut_ptr() as *mut T, len)
}
