//! Configuration types for the svgen output heads

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Number of quantization bins per argument when arguments are categorical.
pub const DEFAULT_ARGS_DIM: usize = 256;

/// Head dimensions as stored next to a checkpoint in `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadConfig {
    /// Width of the hidden state produced by the encoder/decoder
    pub d_model: usize,

    /// Size of the drawing-command vocabulary
    #[serde(default = "default_n_commands")]
    pub n_commands: usize,

    /// Number of numeric arguments per command
    #[serde(default = "default_n_args")]
    pub n_args: usize,

    /// Quantization bins per argument
    #[serde(default = "default_args_dim")]
    pub args_dim: usize,

    /// Regress arguments directly instead of classifying over bins
    #[serde(default)]
    pub abs_targets: bool,

    /// Width of the latent vector emitted by the hierarchical head
    #[serde(default = "default_dim_z")]
    pub dim_z: usize,
}

impl HeadConfig {
    pub fn new(d_model: usize) -> Self {
        Self {
            d_model,
            n_commands: default_n_commands(),
            n_args: default_n_args(),
            args_dim: default_args_dim(),
            abs_targets: false,
            dim_z: default_dim_z(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a `config.json`. A directory is resolved to its
    /// `config.json` entry.
    pub fn from_file(path: &Path) -> Result<Self> {
        let path = if path.is_dir() {
            path.join("config.json")
        } else {
            path.to_path_buf()
        };
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let dims = [
            ("d_model", self.d_model),
            ("n_commands", self.n_commands),
            ("n_args", self.n_args),
            ("args_dim", self.args_dim),
            ("dim_z", self.dim_z),
        ];
        for (name, value) in dims {
            if value == 0 {
                return Err(Error::ConfigError(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }

    /// Width of the flat argument projection before any reshape
    pub fn args_width(&self) -> usize {
        if self.abs_targets {
            self.n_args
        } else {
            self.n_args * self.args_dim
        }
    }
}

fn default_n_commands() -> usize {
    6
}

fn default_n_args() -> usize {
    11
}

fn default_args_dim() -> usize {
    DEFAULT_ARGS_DIM
}

fn default_dim_z() -> usize {
    256
}

/// Where and how the heads run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Device preference: `cpu`, `cuda`, `metal`/`mps`; `None` auto-detects
    #[serde(default)]
    pub device: Option<String>,

    /// Dtype preference: `f32`, `f16`, `bf16`; `None` picks per device
    #[serde(default)]
    pub dtype: Option<String>,

    /// Safetensors file or checkpoint directory
    #[serde(default)]
    pub weights_path: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Build from `SVGEN_DEVICE`, `SVGEN_DTYPE` and `SVGEN_WEIGHTS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };
        let config = Self {
            device: value("SVGEN_DEVICE"),
            dtype: value("SVGEN_DTYPE"),
            weights_path: value("SVGEN_WEIGHTS").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(device) = self.device.as_deref() {
            normalize_device(device)?;
        }
        if let Some(dtype) = self.dtype.as_deref() {
            normalize_dtype(dtype)?;
        }
        Ok(())
    }

    /// Canonical device preference (`cpu`, `cuda` or `metal`)
    pub fn device_preference(&self) -> Result<Option<&'static str>> {
        self.device.as_deref().map(normalize_device).transpose()
    }

    /// Canonical dtype preference (`f32`, `f16` or `bf16`)
    pub fn dtype_preference(&self) -> Result<Option<&'static str>> {
        self.dtype.as_deref().map(normalize_dtype).transpose()
    }
}

fn normalize_device(raw: &str) -> Result<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "cpu" => Ok("cpu"),
        "cuda" | "gpu" => Ok("cuda"),
        "metal" | "mps" => Ok("metal"),
        other => Err(Error::InvalidInput(format!("Unknown device '{other}'"))),
    }
}

fn normalize_dtype(raw: &str) -> Result<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "f32" | "float32" => Ok("f32"),
        "f16" | "float16" => Ok("f16"),
        "bf16" | "bfloat16" => Ok("bf16"),
        other => Err(Error::InvalidInput(format!("Unknown dtype '{other}'"))),
    }
}
