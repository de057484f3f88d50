//! Argument projection strategies shared by the argument-producing heads.
//!
//! Arguments are either quantized (a categorical distribution over
//! `args_dim` bins per argument) or absolute (one regressed value per
//! argument). The strategy is fixed when the head is built.

use candle_core::Tensor;
use candle_nn::{Linear, Module, VarBuilder};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub enum ArgumentProjection {
    /// `d_model -> n_args * args_dim`, reshaped to `(.., n_args, args_dim)`
    Quantized {
        proj: Linear,
        n_args: usize,
        args_dim: usize,
    },
    /// `d_model -> n_args`
    Absolute { proj: Linear, n_args: usize },
    /// `d_model -> n_args * args_dim -> n_args` with no activation between
    Cascade {
        classify: Linear,
        collapse: Linear,
        n_args: usize,
    },
}

impl ArgumentProjection {
    /// Single projection: absolute when `abs_targets`, quantized otherwise.
    pub fn direct(
        d_model: usize,
        n_args: usize,
        args_dim: usize,
        abs_targets: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        if abs_targets {
            let proj = candle_nn::linear(d_model, n_args, vb)?;
            Ok(Self::Absolute { proj, n_args })
        } else {
            Self::quantized(d_model, n_args, args_dim, vb)
        }
    }

    /// Classify-then-collapse cascade when `abs_targets`, quantized otherwise.
    ///
    /// The cascade keeps the parameter count close to the quantized branch.
    pub fn regression(
        d_model: usize,
        n_args: usize,
        args_dim: usize,
        abs_targets: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        if abs_targets {
            let hidden = n_args * args_dim;
            let classify = candle_nn::linear(d_model, hidden, vb.pp("0"))?;
            let collapse = candle_nn::linear(hidden, n_args, vb.pp("1"))?;
            Ok(Self::Cascade {
                classify,
                collapse,
                n_args,
            })
        } else {
            Self::quantized(d_model, n_args, args_dim, vb)
        }
    }

    fn quantized(d_model: usize, n_args: usize, args_dim: usize, vb: VarBuilder) -> Result<Self> {
        let proj = candle_nn::linear(d_model, n_args * args_dim, vb)?;
        Ok(Self::Quantized {
            proj,
            n_args,
            args_dim,
        })
    }

    pub fn is_quantized(&self) -> bool {
        matches!(self, Self::Quantized { .. })
    }

    /// Trailing dims of [`Self::forward`]'s output.
    pub fn output_dims(&self) -> Vec<usize> {
        match self {
            Self::Quantized {
                n_args, args_dim, ..
            } => vec![*n_args, *args_dim],
            Self::Absolute { n_args, .. } | Self::Cascade { n_args, .. } => vec![*n_args],
        }
    }

    /// Flat projection output, before any reshape.
    pub fn project(&self, x: &Tensor) -> Result<Tensor> {
        match self {
            Self::Quantized { proj, .. } | Self::Absolute { proj, .. } => {
                proj.forward(x).map_err(Error::from)
            }
            Self::Cascade {
                classify, collapse, ..
            } => {
                let hidden = classify.forward(x)?;
                collapse.forward(&hidden).map_err(Error::from)
            }
        }
    }

    /// Project `(S, N, d_model)` into argument logits.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let (seq_len, batch, _) = x.dims3()?;
        let logits = self.project(x)?;
        match self {
            Self::Quantized {
                n_args, args_dim, ..
            } => logits
                .reshape((seq_len, batch, *n_args, *args_dim))
                .map_err(Error::from),
            _ => Ok(logits),
        }
    }
}
