//! Residual MLP used to refine latent vectors.

use candle_core::{Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use tracing::debug;

use crate::config::HeadConfig;
use crate::error::{Error, Result};

const NUM_BLOCKS: usize = 4;

/// Four `Linear(d_model, d_model) + ReLU` blocks, each applied as
/// `z = z + block(z)`. Output shape equals input shape.
#[derive(Debug, Clone)]
pub struct ResidualMlp {
    blocks: Vec<Linear>,
    d_model: usize,
}

impl ResidualMlp {
    pub fn new(d_model: usize, vb: VarBuilder) -> Result<Self> {
        let blocks = (1..=NUM_BLOCKS)
            .map(|idx| candle_nn::linear(d_model, d_model, vb.pp(format!("linear{idx}.0"))))
            .collect::<candle_core::Result<Vec<_>>>()?;
        debug!("Built residual MLP: d_model={} blocks={}", d_model, NUM_BLOCKS);
        Ok(Self { blocks, d_model })
    }

    pub fn load(cfg: &HeadConfig, vb: VarBuilder) -> Result<Self> {
        Self::new(cfg.d_model, vb)
    }

    /// Refine `z` of shape `(..., d_model)`.
    pub fn forward(&self, z: &Tensor) -> Result<Tensor> {
        if z.elem_count() == 0 {
            return Ok(z.clone());
        }

        let dims = z.dims().to_vec();
        let features = z.dim(D::Minus1)?;

        // Linear only broadcasts up to rank 4, so run on a flat batch.
        let mut h = z.reshape(((), features))?;
        for block in &self.blocks {
            let update = block.forward(&h)?.relu()?;
            h = (h + update)?;
        }
        h.reshape(dims).map_err(Error::from)
    }

    pub fn d_model(&self) -> usize {
        self.d_model
    }
}
