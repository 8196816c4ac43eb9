use kusari_core::device::{set_default_device, Device};
use kusari_core::{error::Result, DType, NdArray};

// Helper functions
#[allow(dead_code)]
pub fn setup_array(data: Vec<f32>, shape: &[usize], dtype: DType) -> Result<NdArray> {
    NdArray::from_vec(data, shape)?.to_dtype(dtype)
}

#[allow(dead_code)]
pub fn setup_device() {
    #[cfg(feature = "cuda")]
    set_default_device(Device::CUDA(0));
    #[cfg(feature = "mps")]
    set_default_device(Device::MPS);
    #[cfg(not(any(feature = "cuda", feature = "mps")))]
    set_default_device(Device::CPU);
}

#[macro_export]
macro_rules! test_ops_with_dtype {
    ([
        $($op:ident: [$($dtype:ident),*$(,)?]),*$(,)?
    ]) => {
        $(
            mod $op {
                use super::*;
                use paste::paste;
                paste! {
                    $(
                        #[test]
                        fn [<$dtype:lower>]() -> Result<()> {
                            test_functions::[<$op _test>](DType::$dtype)
                        }
                    )*
                }
            }
        )*
    };
}
