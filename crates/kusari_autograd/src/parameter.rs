use crate::variable::Variable;
use kusari_core::{get_default_device, get_default_dtype, DType, Device, NdArray, Result, Scalar};
use std::ops::Deref;

/// Recipe for filling a parameter's array once its shape is known.
pub enum Initializer {
    Constant(Scalar),
    Normal { mean: f64, stddev: f64 },
    Array(NdArray),
    Callable(Box<dyn Fn(&[usize], Device, DType) -> Result<NdArray> + Send + Sync>),
}

impl Initializer {
    pub fn generate(&self, shape: &[usize], device: Device, dtype: DType) -> Result<NdArray> {
        match self {
            Initializer::Constant(value) => {
                NdArray::full_with_spec(shape, *value, device, dtype)
            }
            Initializer::Normal { mean, stddev } => {
                let noise = NdArray::randn_with_spec(shape, device, dtype)?;
                noise.mul_scalar(*stddev)?.add_scalar(*mean)
            }
            Initializer::Array(array) => {
                let sized = if array.shape() == shape {
                    array.clone()
                } else {
                    array.reshape(shape)?
                };
                sized.to_device(device)?.deep_copy()
            }
            Initializer::Callable(f) => f(shape, device, dtype),
        }
    }
}

impl std::fmt::Debug for Initializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Initializer::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Initializer::Normal { mean, stddev } => f
                .debug_struct("Normal")
                .field("mean", mean)
                .field("stddev", stddev)
                .finish(),
            Initializer::Array(array) => f.debug_tuple("Array").field(&array.shape()).finish(),
            Initializer::Callable(_) => f.write_str("Callable"),
        }
    }
}

/// Per-parameter update step driven by the accumulated gradient.
pub trait UpdateRule: Send + Sync {
    fn update(&mut self, param: &Variable) -> Result<()>;
}

/// Plain gradient descent: `w -= lr * g`.
pub struct Sgd {
    pub lr: f64,
}

impl UpdateRule for Sgd {
    fn update(&mut self, param: &Variable) -> Result<()> {
        let (Some(data), Some(grad)) = (param.array(), param.grad()) else {
            return Ok(());
        };
        let step = grad.mul_scalar(self.lr)?;
        param.set_array(data.sub(&step)?);
        Ok(())
    }
}

/// A trainable variable whose shape may be unknown at construction.
///
/// An uninitialized parameter records only its initializer, target device and
/// dtype; the array materializes on the first `initialize` call, typically
/// made by a layer once it has seen an input. Gradient interop (`addgrad`,
/// `copydata`) initializes on demand where the original data gives a shape.
pub struct Parameter {
    variable: Variable,
    initializer: Initializer,
    update_rule: Option<Box<dyn UpdateRule>>,
    target_device: Device,
    target_dtype: DType,
}

impl Parameter {
    /// An already-shaped parameter. The array itself becomes the initializer,
    /// so a device retarget before first use keeps the values.
    pub fn from_array(array: NdArray) -> Self {
        let device = array.device();
        let dtype = array.dtype();
        let variable = Variable::with_requires_grad(array.clone(), true);
        Self {
            variable,
            initializer: Initializer::Array(array),
            update_rule: None,
            target_device: device,
            target_dtype: dtype,
        }
    }

    /// A lazily-shaped parameter. `initialize` must run before the parameter
    /// can participate in computation.
    pub fn from_initializer(initializer: Initializer) -> Self {
        Self {
            variable: Variable::uninitialized(),
            initializer,
            update_rule: None,
            target_device: get_default_device(),
            target_dtype: get_default_dtype(),
        }
    }

    pub fn from_constant(value: impl Into<Scalar>) -> Self {
        Self::from_initializer(Initializer::Constant(value.into()))
    }

    pub fn is_initialized(&self) -> bool {
        self.variable.is_initialized()
    }

    /// Materializes the array at the given shape on the target device and
    /// zero-fills the gradient to match.
    pub fn initialize(&mut self, shape: &[usize]) -> Result<()> {
        let data = self
            .initializer
            .generate(shape, self.target_device, self.target_dtype)?;
        let grad = NdArray::zeros_like(&data)?;
        self.variable.set_array(data);
        self.variable.set_requires_grad(true);
        self.variable.set_grad(Some(grad))?;
        Ok(())
    }

    /// Retargets the parameter's device. Before initialization only the
    /// target moves; afterwards the array and gradient transfer.
    pub fn to_device(&mut self, device: Device) -> Result<()> {
        self.target_device = device;
        self.variable.to_device(device)
    }

    pub fn set_update_rule(&mut self, rule: Box<dyn UpdateRule>) {
        self.update_rule = Some(rule);
    }

    /// Applies the update rule, if one is attached. Uninitialized parameters
    /// and parameters without a gradient are left alone.
    pub fn update(&mut self) -> Result<()> {
        if let Some(mut rule) = self.update_rule.take() {
            let result = rule.update(&self.variable);
            self.update_rule = Some(rule);
            result?;
        }
        Ok(())
    }

    /// Adds `other`'s gradient into this parameter's, initializing from the
    /// source's shape first when this parameter has no array yet.
    pub fn addgrad(&mut self, other: &Variable) -> Result<()> {
        if !self.is_initialized() {
            if let Some(src) = other.array() {
                self.initialize(src.shape())?;
            }
        }
        self.variable.addgrad(other)
    }

    /// Copies `other`'s array into this parameter, initializing in place when
    /// this parameter has no array yet. Both sides uninitialized is a no-op.
    pub fn copydata(&mut self, other: &Variable) -> Result<()> {
        self.variable.copydata(other)
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }
}

impl Deref for Parameter {
    type Target = Variable;

    fn deref(&self) -> &Variable {
        &self.variable
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("initialized", &self.is_initialized())
            .field("shape", &self.variable.shape())
            .field("target_device", &self.target_device)
            .field("target_dtype", &self.target_dtype)
            .field("initializer", &self.initializer)
            .finish()
    }
}
