use crate::{
    be,
    buffer::{cpu::CpuBuffer, Buffer},
    device::{get_default_device, Device},
    dtype::DType,
    error::{Error, Result},
    layout::Layout,
    scalar::{FromScalar, Scalar},
};
use half::{bf16, f16};
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;
use std::sync::Arc;

/// Marker mapping element types to their dtype, for typed constructors.
pub trait ElemType: Into<Scalar> + Copy {
    const DTYPE: DType;
}

macro_rules! impl_elem_type {
    ($($type:ty => $dtype:ident),* $(,)?) => {
        $(
            impl ElemType for $type {
                const DTYPE: DType = DType::$dtype;
            }
        )*
    };
}

impl_elem_type! {
    bool => BOOL,
    bf16 => BF16,
    f16 => F16,
    f32 => F32,
    f64 => F64,
    u8 => U8,
    u32 => U32,
    i8 => I8,
    i32 => I32,
    i64 => I64,
}

/// A dense, contiguous n-dimensional value on one device.
///
/// The buffer is shared copy-on-write: cloning an `NdArray` is cheap, and
/// mutation goes through [`NdArray::with_buffer_mut`], which clones the
/// storage first if anything else still references it.
#[derive(Clone)]
pub struct NdArray {
    buffer: Arc<dyn Buffer>,
    layout: Layout,
    device: Device,
    dtype: DType,
}

fn new_buffer(size: usize, device: Device, dtype: DType) -> Result<Box<dyn Buffer>> {
    match device {
        Device::CPU => Ok(Box::new(CpuBuffer::new(size, dtype)?)),
        #[cfg(feature = "cuda")]
        Device::CUDA(_) => Err(Error::InvalidArgument(
            "CUDA buffers are not available in this build".into(),
        )),
        #[cfg(feature = "mps")]
        Device::MPS => Err(Error::InvalidArgument(
            "MPS buffers are not available in this build".into(),
        )),
    }
}

impl NdArray {
    // creation

    pub fn from_vec<T: ElemType>(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        Self::from_vec_with_spec(data, shape, get_default_device())
    }

    pub fn from_vec_with_spec<T: ElemType>(data: Vec<T>, shape: &[usize], device: Device) -> Result<Self> {
        let layout = Layout::from_shape(shape);
        if layout.size() != data.len() {
            return Err(Error::IncompatibleShape(format!(
                "{} elements do not fill shape {:?}",
                data.len(),
                shape
            )));
        }

        let mut buffer = new_buffer(data.len(), device, T::DTYPE)?;
        {
            let esize = T::DTYPE.size_in_bytes();
            let bytes = buffer.as_bytes_mut();
            for (i, &v) in data.iter().enumerate() {
                unsafe {
                    T::DTYPE.write_scalar(bytes.as_mut_ptr().add(i * esize), v.into());
                }
            }
        }

        Ok(Self {
            buffer: Arc::from(buffer),
            layout,
            device,
            dtype: T::DTYPE,
        })
    }

    pub(crate) fn from_parts(buffer: Arc<dyn Buffer>, layout: Layout, device: Device, dtype: DType) -> Self {
        Self {
            buffer,
            layout,
            device,
            dtype,
        }
    }

    pub fn empty_with_spec(shape: &[usize], device: Device, dtype: DType) -> Result<Self> {
        let layout = Layout::from_shape(shape);
        let buffer = new_buffer(layout.size(), device, dtype)?;
        Ok(Self {
            buffer: Arc::from(buffer),
            layout,
            device,
            dtype,
        })
    }

    pub fn full_with_spec(shape: &[usize], value: impl Into<Scalar>, device: Device, dtype: DType) -> Result<Self> {
        let mut result = Self::empty_with_spec(shape, device, dtype)?;
        result.fill_(value)?;
        Ok(result)
    }

    pub fn zeros_with_spec(shape: &[usize], device: Device, dtype: DType) -> Result<Self> {
        Self::empty_with_spec(shape, device, dtype)
    }

    pub fn ones_with_spec(shape: &[usize], device: Device, dtype: DType) -> Result<Self> {
        Self::full_with_spec(shape, 1.0f64, device, dtype)
    }

    pub fn zeros(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::zeros_with_spec(shape, get_default_device(), dtype)
    }

    pub fn ones(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::ones_with_spec(shape, get_default_device(), dtype)
    }

    pub fn zeros_like(other: &Self) -> Result<Self> {
        Self::zeros_with_spec(other.shape(), other.device(), other.dtype())
    }

    pub fn ones_like(other: &Self) -> Result<Self> {
        Self::ones_with_spec(other.shape(), other.device(), other.dtype())
    }

    pub fn full_like(other: &Self, value: impl Into<Scalar>) -> Result<Self> {
        Self::full_with_spec(other.shape(), value, other.device(), other.dtype())
    }

    pub fn randn_with_spec(shape: &[usize], device: Device, dtype: DType) -> Result<Self> {
        if !dtype.is_float() {
            return Err(Error::InvalidArgument(format!(
                "randn requires a float dtype, got {}",
                dtype.as_str()
            )));
        }

        let mut result = Self::empty_with_spec(shape, device, dtype)?;
        let size = result.size();
        let mut rng = rand::thread_rng();
        result.with_buffer_mut(|buf| {
            let esize = dtype.size_in_bytes();
            let bytes = buf.as_bytes_mut();
            for i in 0..size {
                let v: f64 = rng.sample(StandardNormal);
                unsafe {
                    dtype.write_scalar(bytes.as_mut_ptr().add(i * esize), Scalar::F64(v));
                }
            }
            Ok(())
        })?;
        Ok(result)
    }

    pub fn randn(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::randn_with_spec(shape, get_default_device(), dtype)
    }

    // data

    pub fn buffer(&self) -> &dyn Buffer {
        Arc::as_ref(&self.buffer)
    }

    fn buffer_clone(&self) -> Result<Box<dyn Buffer>> {
        let mut new = new_buffer(self.buffer.len(), self.device, self.dtype)?;
        new.copy_from(self.buffer())?;
        Ok(new)
    }

    pub fn with_buffer_mut<F, R>(&mut self, func: F) -> Result<R>
    where
        F: FnOnce(&mut dyn Buffer) -> Result<R>,
    {
        if Arc::strong_count(&self.buffer) == 1 {
            let buffer = Arc::get_mut(&mut self.buffer).ok_or(Error::BufferShared)?;
            func(buffer)
        } else {
            let mut new_buffer = self.buffer_clone()?;
            let result = func(new_buffer.as_mut())?;
            self.buffer = Arc::from(new_buffer);
            Ok(result)
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn device(&self) -> Device {
        self.device
    }

    // elementwise

    fn check_binary_operands(&self, rhs: &Self) -> Result<()> {
        if !self.device.is_compatible_with(&rhs.device) {
            return Err(Error::DeviceMismatch {
                expected: self.device,
                got: rhs.device,
            });
        }
        if self.dtype != rhs.dtype {
            return Err(Error::DTypeMismatch {
                expected: self.dtype,
                got: rhs.dtype,
            });
        }
        if self.shape() != rhs.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().to_vec(),
                got: rhs.shape().to_vec(),
            });
        }
        Ok(())
    }

    fn binary_map(
        &self,
        rhs: &Self,
        kernel: unsafe fn(&mut dyn Buffer, &dyn Buffer, &dyn Buffer, usize) -> Result<()>,
    ) -> Result<Self> {
        self.check_binary_operands(rhs)?;
        let mut result = Self::empty_with_spec(self.shape(), self.device, self.dtype)?;
        let size = self.size();
        let (lhs_buf, rhs_buf) = (self.buffer.clone(), rhs.buffer.clone());
        result.with_buffer_mut(|out| unsafe { kernel(out, lhs_buf.as_ref(), rhs_buf.as_ref(), size) })?;
        Ok(result)
    }

    fn unary_map(&self, kernel: unsafe fn(&mut dyn Buffer, &dyn Buffer, usize) -> Result<()>) -> Result<Self> {
        let mut result = Self::empty_with_spec(self.shape(), self.device, self.dtype)?;
        let size = self.size();
        let input = self.buffer.clone();
        result.with_buffer_mut(|out| unsafe { kernel(out, input.as_ref(), size) })?;
        Ok(result)
    }

    fn unary_const_map(
        &self,
        constant: Scalar,
        kernel: unsafe fn(&mut dyn Buffer, &dyn Buffer, usize, Scalar) -> Result<()>,
    ) -> Result<Self> {
        let mut result = Self::empty_with_spec(self.shape(), self.device, self.dtype)?;
        let size = self.size();
        let input = self.buffer.clone();
        result.with_buffer_mut(|out| unsafe { kernel(out, input.as_ref(), size, constant) })?;
        Ok(result)
    }

    pub fn add(&self, rhs: &Self) -> Result<Self> {
        self.binary_map(rhs, be::ops::binary::add)
    }

    pub fn sub(&self, rhs: &Self) -> Result<Self> {
        self.binary_map(rhs, be::ops::binary::sub)
    }

    pub fn mul(&self, rhs: &Self) -> Result<Self> {
        self.binary_map(rhs, be::ops::binary::mul)
    }

    pub fn div(&self, rhs: &Self) -> Result<Self> {
        self.binary_map(rhs, be::ops::binary::div)
    }

    pub fn maximum(&self, rhs: &Self) -> Result<Self> {
        self.binary_map(rhs, be::ops::binary::maximum)
    }

    pub fn neg(&self) -> Result<Self> {
        self.unary_map(be::ops::unary::neg)
    }

    pub fn abs(&self) -> Result<Self> {
        self.unary_map(be::ops::unary::abs)
    }

    pub fn exp(&self) -> Result<Self> {
        self.unary_map(be::ops::unary::exp)
    }

    pub fn sqrt(&self) -> Result<Self> {
        self.unary_map(be::ops::unary::sqrt)
    }

    pub fn square(&self) -> Result<Self> {
        self.unary_map(be::ops::unary::square)
    }

    pub fn mul_scalar(&self, constant: impl Into<Scalar>) -> Result<Self> {
        self.unary_const_map(constant.into(), be::ops::unary::mul_scalar)
    }

    pub fn add_scalar(&self, constant: impl Into<Scalar>) -> Result<Self> {
        self.unary_const_map(constant.into(), be::ops::unary::add_scalar)
    }

    pub fn pow_scalar(&self, constant: impl Into<Scalar>) -> Result<Self> {
        self.unary_const_map(constant.into(), be::ops::unary::pow_scalar)
    }

    pub fn fill_(&mut self, value: impl Into<Scalar>) -> Result<()> {
        let size = self.size();
        let value = value.into();
        self.with_buffer_mut(|buf| unsafe { be::ops::unary::fill(buf, size, value) })
    }

    // reductions and shape

    pub fn sum(&self) -> Result<Self> {
        let size = self.size();
        let total = unsafe { be::ops::reduction::sum_all(self.buffer(), size)? };
        let mut result = Self::empty_with_spec(&[], self.device, self.dtype)?;
        result.fill_(total)?;
        Ok(result)
    }

    pub fn sum_to(&self, shape: &[usize]) -> Result<Self> {
        if self.shape() == shape {
            return Ok(self.clone());
        }
        if !self.layout.can_reduce_to(shape) {
            return Err(Error::IncompatibleShape(format!(
                "Cannot reduce shape {:?} to {:?}",
                self.shape(),
                shape
            )));
        }

        let mut result = Self::empty_with_spec(shape, self.device, self.dtype)?;
        let input = self.buffer.clone();
        let (in_shape, out_shape) = (self.shape().to_vec(), shape.to_vec());
        result.with_buffer_mut(|out| unsafe {
            be::ops::reduction::sum_to(out, input.as_ref(), &in_shape, &out_shape)
        })?;
        Ok(result)
    }

    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        if self.shape() == shape {
            return Ok(self.clone());
        }
        if !self.layout.can_broadcast_to(shape) {
            return Err(Error::IncompatibleShape(format!(
                "Cannot broadcast shape {:?} to {:?}",
                self.shape(),
                shape
            )));
        }

        let mut result = Self::empty_with_spec(shape, self.device, self.dtype)?;
        let input = self.buffer.clone();
        let (in_shape, out_shape) = (self.shape().to_vec(), shape.to_vec());
        result.with_buffer_mut(|out| unsafe {
            be::ops::unary::broadcast_to(out, input.as_ref(), &in_shape, &out_shape)
        })?;
        Ok(result)
    }

    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        let mut result = self.clone();
        result.layout.view(shape)?;
        Ok(result)
    }

    // transfer and inspection

    pub fn to_device(&self, device: Device) -> Result<Self> {
        if self.device == device {
            return Ok(self.clone());
        }

        let mut buffer = new_buffer(self.buffer.len(), device, self.dtype)?;
        buffer.as_bytes_mut().copy_from_slice(self.buffer.as_bytes());
        Ok(Self {
            buffer: Arc::from(buffer),
            layout: self.layout.clone(),
            device,
            dtype: self.dtype,
        })
    }

    pub fn to_dtype(&self, dtype: DType) -> Result<Self> {
        if self.dtype == dtype {
            return Ok(self.clone());
        }

        let mut buffer = new_buffer(self.buffer.len(), self.device, dtype)?;
        {
            let esize = dtype.size_in_bytes();
            let ssize = self.dtype.size_in_bytes();
            let src = self.buffer.as_bytes();
            let dst = buffer.as_bytes_mut();
            for i in 0..self.layout.size() {
                unsafe {
                    let value = self.dtype.read_scalar(src.as_ptr().add(i * ssize));
                    dtype.write_scalar(dst.as_mut_ptr().add(i * esize), value);
                }
            }
        }
        Ok(Self {
            buffer: Arc::from(buffer),
            layout: self.layout.clone(),
            device: self.device,
            dtype,
        })
    }

    pub fn deep_copy(&self) -> Result<Self> {
        Ok(Self {
            buffer: Arc::from(self.buffer_clone()?),
            layout: self.layout.clone(),
            device: self.device,
            dtype: self.dtype,
        })
    }

    pub fn copy_from(&mut self, other: &Self) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().to_vec(),
                got: other.shape().to_vec(),
            });
        }
        if self.dtype != other.dtype {
            return Err(Error::DTypeMismatch {
                expected: self.dtype,
                got: other.dtype,
            });
        }

        let source = other.to_device(self.device)?;
        self.with_buffer_mut(|buf| buf.copy_from(source.buffer()))
    }

    pub fn get_scalar(&self, index: usize) -> Result<Scalar> {
        if index >= self.size() {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.size(),
            });
        }
        let esize = self.dtype.size_in_bytes();
        let bytes = self.buffer.as_bytes();
        Ok(unsafe { self.dtype.read_scalar(bytes.as_ptr().add(index * esize)) })
    }

    pub fn item(&self) -> Result<Scalar> {
        if self.size() != 1 {
            return Err(Error::InvalidArgument(format!(
                "item() can only be called on an array with a single element, but got {} elements",
                self.size()
            )));
        }
        self.get_scalar(0)
    }

    pub fn to_flat_vec<T: FromScalar>(&self) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(self.size());
        for i in 0..self.size() {
            out.push(T::from_scalar(self.get_scalar(i)?));
        }
        Ok(out)
    }

    pub fn has_nonfinite(&self) -> bool {
        if !self.dtype.is_float() {
            return false;
        }
        for i in 0..self.size() {
            if let Ok(v) = self.get_scalar(i) {
                if !v.is_finite() {
                    return true;
                }
            }
        }
        false
    }

    pub fn allclose(&self, other: &Self, rtol: f64, atol: f64) -> Result<bool> {
        if self.shape() != other.shape() {
            return Ok(false);
        }
        for i in 0..self.size() {
            let a = self.get_scalar(i)?.as_f64_any();
            let b = other.get_scalar(i)?.as_f64_any();
            if (a - b).abs() > atol + rtol * b.abs() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Debug for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NdArray(shape={:?}, dtype={}, device={})",
            self.shape(),
            self.dtype.as_str(),
            self.device.name()
        )
    }
}

impl fmt::Display for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_SHOWN: usize = 16;
        write!(f, "[")?;
        for i in 0..self.size().min(MAX_SHOWN) {
            if i > 0 {
                write!(f, ", ")?;
            }
            match self.get_scalar(i) {
                Ok(v) => write!(f, "{}", v.as_f64_any())?,
                Err(_) => write!(f, "?")?,
            }
        }
        if self.size() > MAX_SHOWN {
            write!(f, ", ...")?;
        }
        write!(f, "]")
    }
}
