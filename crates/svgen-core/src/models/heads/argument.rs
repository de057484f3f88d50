//! Argument-only heads.

use candle_core::Tensor;
use candle_nn::VarBuilder;
use tracing::debug;

use super::projection::ArgumentProjection;
use crate::config::HeadConfig;
use crate::error::Result;

/// Projects hidden state to argument logits with a single projection.
#[derive(Debug, Clone)]
pub struct ArgumentOnlyHead {
    args_fcn: ArgumentProjection,
    d_model: usize,
    n_args: usize,
    args_dim: usize,
}

impl ArgumentOnlyHead {
    pub fn new(
        d_model: usize,
        n_args: usize,
        args_dim: usize,
        abs_targets: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        let args_fcn =
            ArgumentProjection::direct(d_model, n_args, args_dim, abs_targets, vb.pp("args_fcn"))?;
        debug!(
            "Built argument head: d_model={} n_args={} args_dim={} abs_targets={}",
            d_model, n_args, args_dim, abs_targets
        );
        Ok(Self {
            args_fcn,
            d_model,
            n_args,
            args_dim,
        })
    }

    pub fn load(cfg: &HeadConfig, vb: VarBuilder) -> Result<Self> {
        Self::new(cfg.d_model, cfg.n_args, cfg.args_dim, cfg.abs_targets, vb)
    }

    pub fn forward(&self, out: &Tensor) -> Result<Tensor> {
        self.args_fcn.forward(out)
    }

    /// Argument logits before the `(n_args, args_dim)` split.
    pub fn project(&self, out: &Tensor) -> Result<Tensor> {
        self.args_fcn.project(out)
    }

    pub fn d_model(&self) -> usize {
        self.d_model
    }

    pub fn n_args(&self) -> usize {
        self.n_args
    }

    pub fn args_dim(&self) -> usize {
        self.args_dim
    }

    pub fn abs_targets(&self) -> bool {
        !self.args_fcn.is_quantized()
    }
}

/// Argument head that regresses absolute targets through a
/// classify-then-collapse cascade, and classifies quantized ones directly.
#[derive(Debug, Clone)]
pub struct ArgumentRegressionHead {
    args_fcn: ArgumentProjection,
    d_model: usize,
    n_args: usize,
    args_dim: usize,
}

impl ArgumentRegressionHead {
    pub fn new(
        d_model: usize,
        n_args: usize,
        args_dim: usize,
        abs_targets: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        let args_fcn = ArgumentProjection::regression(
            d_model,
            n_args,
            args_dim,
            abs_targets,
            vb.pp("args_fcn"),
        )?;
        debug!(
            "Built argument regression head: d_model={} n_args={} args_dim={} abs_targets={}",
            d_model, n_args, args_dim, abs_targets
        );
        Ok(Self {
            args_fcn,
            d_model,
            n_args,
            args_dim,
        })
    }

    pub fn load(cfg: &HeadConfig, vb: VarBuilder) -> Result<Self> {
        Self::new(cfg.d_model, cfg.n_args, cfg.args_dim, cfg.abs_targets, vb)
    }

    pub fn forward(&self, out: &Tensor) -> Result<Tensor> {
        self.args_fcn.forward(out)
    }

    pub fn d_model(&self) -> usize {
        self.d_model
    }

    pub fn n_args(&self) -> usize {
        self.n_args
    }

    /// Quantization bins, or the cascade's hidden width per argument.
    pub fn args_dim(&self) -> usize {
        self.args_dim
    }

    pub fn abs_targets(&self) -> bool {
        !self.args_fcn.is_quantized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn vb(varmap: &VarMap) -> VarBuilder<'static> {
        VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu)
    }

    #[test]
    fn argument_only_reshape_is_lossless() {
        let varmap = VarMap::new();
        let head = ArgumentOnlyHead::new(12, 4, 9, false, vb(&varmap)).expect("head");
        let out = Tensor::randn(0f32, 1f32, (5, 3, 12), &Device::Cpu).expect("input");

        let logits = head.forward(&out).expect("forward");
        assert_eq!(logits.dims(), &[5, 3, 4, 9]);

        let flat = head.project(&out).expect("project");
        assert_eq!(flat.dims(), &[5, 3, 36]);

        let refolded = logits
            .flatten_from(2)
            .expect("flatten")
            .to_vec3::<f32>()
            .expect("vec refolded");
        let flat = flat.to_vec3::<f32>().expect("vec flat");
        for (lhs, rhs) in refolded.iter().flatten().flatten().zip(flat.iter().flatten().flatten()) {
            assert_eq!(lhs.to_bits(), rhs.to_bits());
        }
    }

    #[test]
    fn argument_only_absolute_shape() {
        let varmap = VarMap::new();
        let head = ArgumentOnlyHead::new(12, 4, 9, true, vb(&varmap)).expect("head");
        let out = Tensor::randn(0f32, 1f32, (5, 3, 12), &Device::Cpu).expect("input");
        assert_eq!(head.forward(&out).expect("forward").dims(), &[5, 3, 4]);
        assert!(head.abs_targets());
        assert_eq!(varmap.all_vars().len(), 2);
    }

    #[test]
    fn regression_shape_is_independent_of_args_dim() {
        let out = Tensor::randn(0f32, 1f32, (7, 2, 10), &Device::Cpu).expect("input");
        for args_dim in [1, 3, 64, 256] {
            let varmap = VarMap::new();
            let head =
                ArgumentRegressionHead::new(10, 11, args_dim, true, vb(&varmap)).expect("head");
            let logits = head.forward(&out).expect("forward");
            assert_eq!(logits.dims(), &[7, 2, 11]);
            assert_eq!(varmap.all_vars().len(), 4);
        }
    }

    #[test]
    fn regression_quantized_matches_argument_only_layout() {
        let varmap = VarMap::new();
        let head = ArgumentRegressionHead::new(10, 11, 8, false, vb(&varmap)).expect("head");
        let out = Tensor::randn(0f32, 1f32, (7, 2, 10), &Device::Cpu).expect("input");
        assert_eq!(head.forward(&out).expect("forward").dims(), &[7, 2, 11, 8]);
        assert!(!head.abs_targets());
        assert_eq!(varmap.all_vars().len(), 2);
    }

    #[test]
    fn cascade_parameter_count_tracks_quantized_branch() {
        let (d_model, n_args, args_dim) = (10, 4, 16);

        let cascade_vars = VarMap::new();
        ArgumentRegressionHead::new(d_model, n_args, args_dim, true, vb(&cascade_vars))
            .expect("cascade");
        let quantized_vars = VarMap::new();
        ArgumentRegressionHead::new(d_model, n_args, args_dim, false, vb(&quantized_vars))
            .expect("quantized");

        let count = |varmap: &VarMap| -> usize {
            varmap.all_vars().iter().map(|v| v.elem_count()).sum()
        };
        let hidden = n_args * args_dim;
        assert_eq!(count(&quantized_vars), d_model * hidden + hidden);
        assert_eq!(
            count(&cascade_vars),
            d_model * hidden + hidden + hidden * n_args + n_args
        );
    }
}
