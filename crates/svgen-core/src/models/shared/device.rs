//! Device selection for running the output heads.
//!
//! Picks a candle device (CUDA, Metal or CPU) and the dtype the heads should
//! be materialized in on that device.

use candle_core::{DType, Device};
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Cuda,
    Metal,
    Cpu,
}

impl DeviceKind {
    pub fn is_cpu(&self) -> bool {
        matches!(self, DeviceKind::Cpu)
    }

    pub fn is_metal(&self) -> bool {
        matches!(self, DeviceKind::Metal)
    }

    pub fn is_cuda(&self) -> bool {
        matches!(self, DeviceKind::Cuda)
    }
}

/// Device capabilities relevant to dtype selection
#[derive(Debug, Clone, Default)]
pub struct DeviceCapabilities {
    /// Whether the device prefers float32 (Metal on Apple Silicon)
    pub prefers_f32: bool,
    /// Whether the device supports bfloat16
    pub supports_bf16: bool,
}

#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub device: Device,
    pub kind: DeviceKind,
    pub capabilities: DeviceCapabilities,
}

impl DeviceProfile {
    pub fn cpu() -> Self {
        Self {
            device: Device::Cpu,
            kind: DeviceKind::Cpu,
            capabilities: DeviceCapabilities::default(),
        }
    }

    /// Select a dtype for the requested preference.
    ///
    /// CPU and Metal always run in F32. CUDA honours F16 requests and uses
    /// BF16 when asked for it (or by default) if the device supports it.
    pub fn select_dtype(&self, requested: Option<&str>) -> DType {
        let dtype = match (self.kind, requested.unwrap_or("")) {
            (DeviceKind::Cpu, _) | (DeviceKind::Metal, _) => DType::F32,
            (DeviceKind::Cuda, "float32" | "f32") => DType::F32,
            (DeviceKind::Cuda, "float16" | "f16") => DType::F16,
            (DeviceKind::Cuda, _) => {
                if self.capabilities.supports_bf16 {
                    DType::BF16
                } else {
                    DType::F32
                }
            }
        };

        debug!(
            "Selected dtype {:?} for device {:?} (requested: {:?})",
            dtype, self.kind, requested
        );

        dtype
    }

    pub fn optimal_dtype(&self) -> DType {
        self.select_dtype(None)
    }
}

pub struct DeviceSelector;

impl DeviceSelector {
    fn try_metal() -> Option<DeviceProfile> {
        let device = std::panic::catch_unwind(|| Device::metal_if_available(0))
            .ok()?
            .ok()?;
        if device.is_metal() {
            Some(DeviceProfile {
                device,
                kind: DeviceKind::Metal,
                capabilities: DeviceCapabilities {
                    prefers_f32: true,
                    supports_bf16: false,
                },
            })
        } else {
            None
        }
    }

    fn try_cuda() -> Option<DeviceProfile> {
        let device = std::panic::catch_unwind(|| Device::cuda_if_available(0))
            .ok()?
            .ok()?;
        if device.is_cuda() {
            Some(DeviceProfile {
                device,
                kind: DeviceKind::Cuda,
                capabilities: DeviceCapabilities {
                    prefers_f32: false,
                    supports_bf16: true,
                },
            })
        } else {
            None
        }
    }

    pub fn detect() -> Result<DeviceProfile> {
        if cfg!(target_os = "macos") {
            if let Some(profile) = Self::try_metal() {
                info!("Using Metal device for output heads");
                return Ok(profile);
            }
        } else if let Some(profile) = Self::try_cuda() {
            info!("Using CUDA device for output heads");
            return Ok(profile);
        }

        info!("Falling back to CPU for output heads");
        Ok(DeviceProfile::cpu())
    }

    pub fn detect_with_preference(preference: Option<&str>) -> Result<DeviceProfile> {
        match preference.unwrap_or("") {
            "cuda" => Self::try_cuda().map_or_else(Self::detect, Ok),
            "metal" | "mps" => Self::try_metal().map_or_else(Self::detect, Ok),
            "cpu" => Ok(DeviceProfile::cpu()),
            _ => Self::detect(),
        }
    }

    /// Resolve the device and dtype a [`RuntimeConfig`] asks for.
    pub fn from_runtime(config: &RuntimeConfig) -> Result<(DeviceProfile, DType)> {
        let profile = Self::detect_with_preference(config.device_preference()?)?;
        let dtype = profile.select_dtype(config.dtype_preference()?);
        Ok((profile, dtype))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_with_cpu_preference_returns_cpu() {
        let profile = DeviceSelector::detect_with_preference(Some("cpu")).unwrap();
        assert_eq!(profile.kind, DeviceKind::Cpu);
        assert!(profile.device.is_cpu());
    }

    #[test]
    fn test_detect_kind_matches_device() {
        let profile = DeviceSelector::detect().unwrap();
        match profile.kind {
            DeviceKind::Cpu => assert!(profile.device.is_cpu()),
            DeviceKind::Metal => {
                assert!(profile.device.is_metal());
                assert!(profile.capabilities.prefers_f32);
            }
            DeviceKind::Cuda => assert!(profile.device.is_cuda()),
        }
    }

    #[test]
    fn test_cpu_always_f32() {
        let cpu_profile = DeviceProfile::cpu();
        assert_eq!(cpu_profile.select_dtype(None), DType::F32);
        assert_eq!(cpu_profile.select_dtype(Some("bf16")), DType::F32);
        assert_eq!(cpu_profile.select_dtype(Some("f16")), DType::F32);
    }

    #[test]
    fn test_cuda_dtype_selection() {
        let cuda_profile = DeviceProfile {
            device: Device::Cpu,
            kind: DeviceKind::Cuda,
            capabilities: DeviceCapabilities {
                supports_bf16: true,
                ..Default::default()
            },
        };

        assert_eq!(cuda_profile.optimal_dtype(), DType::BF16);
        assert_eq!(cuda_profile.select_dtype(Some("f32")), DType::F32);
        assert_eq!(cuda_profile.select_dtype(Some("f16")), DType::F16);
    }

    #[test]
    fn test_from_runtime_cpu() {
        let config = RuntimeConfig {
            device: Some("cpu".to_string()),
            dtype: Some("f16".to_string()),
            weights_path: None,
        };
        let (profile, dtype) = DeviceSelector::from_runtime(&config).unwrap();
        assert!(profile.device.is_cpu());
        assert_eq!(dtype, DType::F32);
    }
}
