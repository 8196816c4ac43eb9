use kusari_autograd::Variable;
use kusari_core::device::{set_default_device, Device};
use kusari_core::{error::Result, DType, NdArray};

// Helper functions
pub fn setup_device() {
    #[cfg(feature = "cuda")]
    set_default_device(Device::CUDA(0));
    #[cfg(feature = "mps")]
    set_default_device(Device::MPS);
    #[cfg(not(any(feature = "cuda", feature = "mps")))]
    set_default_device(Device::CPU);
}

#[allow(dead_code)]
pub fn setup_var(data: Vec<f32>, shape: &[usize], dtype: DType) -> Result<Variable> {
    Ok(Variable::new(NdArray::from_vec(data, shape)?.to_dtype(dtype)?))
}

#[allow(dead_code)]
pub fn scalar_var(value: f32) -> Result<Variable> {
    Ok(Variable::new(NdArray::from_vec(vec![value], &[])?))
}

#[allow(dead_code)]
pub fn grad_vec(var: &Variable) -> Vec<f32> {
    var.grad()
        .expect("variable has no gradient")
        .to_flat_vec::<f32>()
        .expect("gradient is not readable")
}

#[allow(dead_code)]
pub fn data_vec(var: &Variable) -> Vec<f32> {
    var.array()
        .expect("variable has no data")
        .to_flat_vec::<f32>()
        .expect("data is not readable")
}
