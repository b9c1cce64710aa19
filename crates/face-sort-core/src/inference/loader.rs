//! Safetensors weight loading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use safetensors::SafeTensors;
use tracing::debug;

/// Reads a safetensors file onto `device` and wraps it in a `VarBuilder`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid safetensors, or
/// holds a tensor with an unsupported dtype.
pub fn load_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    debug!("Loading weights from {}", path.display());

    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;
    let tensors = SafeTensors::deserialize(&data)
        .with_context(|| format!("Failed to parse safetensors: {}", path.display()))?;

    let weights = tensors
        .tensors()
        .into_iter()
        .map(|(name, view)| {
            let dtype = candle_dtype(view.dtype())
                .with_context(|| format!("Tensor '{name}' in {}", path.display()))?;
            let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)
                .with_context(|| format!("Failed to create tensor '{name}'"))?;
            Ok((name, tensor))
        })
        .collect::<Result<HashMap<_, _>>>()?;

    debug!("Loaded {} tensors from {}", weights.len(), path.display());
    Ok(VarBuilder::from_tensors(weights, DType::F32, device))
}

fn candle_dtype(dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype as S;

    Ok(match dtype {
        S::F32 => DType::F32,
        S::F64 => DType::F64,
        S::F16 => DType::F16,
        S::BF16 => DType::BF16,
        S::I64 => DType::I64,
        S::U32 => DType::U32,
        S::U8 => DType::U8,
        other => bail!("Unsupported dtype: {other:?}"),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use safetensors::tensor::TensorView;
    use tempfile::NamedTempFile;

    use super::*;

    #[allow(clippy::expect_used)]
    fn weights_file(dtype: safetensors::Dtype, bytes: &[u8], shape: Vec<usize>) -> NamedTempFile {
        let view = TensorView::new(dtype, shape, bytes).expect("valid tensor view");
        let serialized = safetensors::serialize(HashMap::from([("fc.weight", view)]), &None)
            .expect("serialize");

        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(&serialized).expect("write");
        file
    }

    #[test]
    fn test_load_safetensors() {
        let data = [0.5f32, -1.0, 2.0, 4.0, 0.0, 1.0];
        let file = weights_file(
            safetensors::Dtype::F32,
            bytemuck::cast_slice(&data),
            vec![2, 3],
        );

        let vb = load_safetensors(file.path(), &Device::Cpu);
        assert!(vb.is_ok());
        let weight = vb.and_then(|vb| Ok(vb.get((2, 3), "fc.weight")?));
        assert!(weight.is_ok_and(|w| w.dims() == [2, 3]));
    }

    #[test]
    fn test_load_safetensors_missing_file() {
        let result = load_safetensors("/nonexistent/gender.safetensors", &Device::Cpu);
        assert!(result.is_err_and(|e| e.to_string().contains("Failed to read model file")));
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_load_safetensors_rejects_garbage() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"not a weights file").expect("write");
        assert!(load_safetensors(file.path(), &Device::Cpu).is_err());
    }

    #[test]
    fn test_unsupported_dtype() {
        let file = weights_file(safetensors::Dtype::I8, &[1, 2], vec![2]);
        assert!(load_safetensors(file.path(), &Device::Cpu).is_err());
    }
}
