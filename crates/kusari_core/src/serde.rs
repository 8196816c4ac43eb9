use crate::{
    array::NdArray,
    buffer::{cpu::CpuBuffer, Buffer},
    device::Device,
    dtype::DType,
    layout::Layout,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

#[derive(Serialize, Deserialize)]
struct SerializedNdArray {
    buffer_data: Vec<u8>,
    shape: Vec<usize>,
    dtype: DType,
    device: Device,
}

impl Serialize for NdArray {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let serialized = SerializedNdArray {
            buffer_data: self.buffer().as_bytes().to_vec(),
            shape: self.shape().to_vec(),
            dtype: self.dtype(),
            device: self.device(),
        };

        serialized.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NdArray {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let serialized = SerializedNdArray::deserialize(deserializer)?;

        // Payloads always rehydrate on the CPU; the caller moves them
        // to the recorded device if that backend is available.
        let buffer = CpuBuffer::from_bytes(serialized.buffer_data, serialized.dtype)
            .map_err(serde::de::Error::custom)?;

        let layout = Layout::from_shape(&serialized.shape);
        if layout.size() != buffer.len() {
            return Err(serde::de::Error::custom(format!(
                "payload of {} elements does not fill shape {:?}",
                buffer.len(),
                serialized.shape
            )));
        }

        Ok(NdArray::from_parts(
            Arc::new(buffer),
            layout,
            Device::CPU,
            serialized.dtype,
        ))
    }
}
