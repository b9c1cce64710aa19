//! Compute device selection.

use candle_core::Device;
use tracing::{info, warn};

/// Picks the device models are loaded onto.
///
/// With `prefer_gpu`, tries Metal then CUDA (whichever the crate was built
/// with) and falls back to the CPU.
#[must_use]
pub fn select_device(prefer_gpu: bool) -> Device {
    if prefer_gpu {
        if let Some(device) = gpu_device() {
            return device;
        }
        warn!("No GPU backend available, running inference on the CPU");
    }
    info!("Using CPU for inference");
    Device::Cpu
}

#[allow(clippy::missing_const_for_fn)]
fn gpu_device() -> Option<Device> {
    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Using Metal device for inference");
            return Some(device);
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA device for inference");
            return Some(device);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_when_gpu_not_preferred() {
        assert!(matches!(select_device(false), Device::Cpu));
    }

    #[test]
    fn test_select_device_always_returns() {
        let _device = select_device(true);
    }
}
