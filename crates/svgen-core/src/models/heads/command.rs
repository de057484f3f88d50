//! Joint command/argument head.

use candle_core::Tensor;
use candle_nn::{Linear, Module, VarBuilder};
use tracing::debug;

use super::projection::ArgumentProjection;
use crate::config::HeadConfig;
use crate::error::Result;

/// Projects decoder hidden state to command-class logits and argument logits.
///
/// The two projections share no computation. Argument logits come back as
/// `(S, N, n_args, args_dim)` when quantized and `(S, N, n_args)` when
/// `abs_targets` is set.
#[derive(Debug, Clone)]
pub struct CommandArgumentHead {
    command_fcn: Linear,
    args_fcn: ArgumentProjection,
    d_model: usize,
    n_commands: usize,
}

impl CommandArgumentHead {
    pub fn new(
        d_model: usize,
        n_commands: usize,
        n_args: usize,
        args_dim: usize,
        abs_targets: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        let command_fcn = candle_nn::linear(d_model, n_commands, vb.pp("command_fcn"))?;
        let args_fcn =
            ArgumentProjection::direct(d_model, n_args, args_dim, abs_targets, vb.pp("args_fcn"))?;

        debug!(
            "Built command/argument head: d_model={} n_commands={} n_args={} args_dim={} abs_targets={}",
            d_model, n_commands, n_args, args_dim, abs_targets
        );

        Ok(Self {
            command_fcn,
            args_fcn,
            d_model,
            n_commands,
        })
    }

    pub fn load(cfg: &HeadConfig, vb: VarBuilder) -> Result<Self> {
        Self::new(
            cfg.d_model,
            cfg.n_commands,
            cfg.n_args,
            cfg.args_dim,
            cfg.abs_targets,
            vb,
        )
    }

    /// Returns `(command_logits, args_logits)` for hidden state `(S, N, d_model)`.
    pub fn forward(&self, out: &Tensor) -> Result<(Tensor, Tensor)> {
        let args_logits = self.args_fcn.forward(out)?;
        let command_logits = self.command_fcn.forward(out)?;
        Ok((command_logits, args_logits))
    }

    pub fn d_model(&self) -> usize {
        self.d_model
    }

    pub fn n_commands(&self) -> usize {
        self.n_commands
    }

    pub fn abs_targets(&self) -> bool {
        !self.args_fcn.is_quantized()
    }

    pub fn args_projection(&self) -> &ArgumentProjection {
        &self.args_fcn
    }
}
