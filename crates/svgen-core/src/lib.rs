//! Svgen Core - Output heads for vector-graphics generative models
//!
//! This crate provides the projection heads that sit on top of an SVG
//! encoder/decoder and turn its hidden state into task logits:
//! - drawing-command class scores
//! - argument distributions (quantized bins or absolute values)
//! - per-group visibility scores and latent vectors
//! - a residual MLP that refines latents in place
//!
//! All heads run on [candle](https://github.com/huggingface/candle) and take
//! their parameters from a `VarBuilder`.
//!
//! # Example
//!
//! ```ignore
//! use svgen_core::{CommandArgumentHead, DeviceSelector, HeadConfig, load_weights};
//!
//! let cfg = HeadConfig::from_file(model_dir)?;
//! let device = DeviceSelector::detect()?;
//! let vb = load_weights(model_dir, device.optimal_dtype(), &device.device)?;
//! let head = CommandArgumentHead::load(&cfg, vb.pp("decoder.fcn"))?;
//! let (command_logits, args_logits) = head.forward(&hidden)?;
//! ```

pub mod config;
pub mod error;
pub mod models;

pub use config::{HeadConfig, RuntimeConfig, DEFAULT_ARGS_DIM};
pub use error::{Error, Result};

pub use models::heads::{
    ArgumentOnlyHead, ArgumentProjection, ArgumentRegressionHead, CommandArgumentHead,
    HierarchicalHead, ResidualMlp,
};
pub use models::shared::device::{DeviceKind, DeviceProfile, DeviceSelector};
pub use models::shared::weights::{fresh_var_builder, load_weights, save_weights};
