//! Group-level visibility and latent head.

use candle_core::Tensor;
use candle_nn::{Linear, Module, VarBuilder};
use tracing::debug;

use crate::config::HeadConfig;
use crate::error::Result;

/// Maps group hidden state `(G, N, d_model)` to visibility logits
/// `(1, G, N, 2)` and a latent `(1, G, N, dim_z)`.
///
/// The leading singleton axis lets callers concatenate these outputs with
/// heads running at other granularities.
#[derive(Debug, Clone)]
pub struct HierarchicalHead {
    visibility_fcn: Linear,
    z_fcn: Linear,
    d_model: usize,
    dim_z: usize,
}

impl HierarchicalHead {
    pub fn new(d_model: usize, dim_z: usize, vb: VarBuilder) -> Result<Self> {
        let visibility_fcn = candle_nn::linear(d_model, 2, vb.pp("visibility_fcn"))?;
        let z_fcn = candle_nn::linear(d_model, dim_z, vb.pp("z_fcn"))?;
        debug!(
            "Built hierarchical head: d_model={} dim_z={}",
            d_model, dim_z
        );
        Ok(Self {
            visibility_fcn,
            z_fcn,
            d_model,
            dim_z,
        })
    }

    pub fn load(cfg: &HeadConfig, vb: VarBuilder) -> Result<Self> {
        Self::new(cfg.d_model, cfg.dim_z, vb)
    }

    /// Returns `(visibility_logits, z)`.
    pub fn forward(&self, out: &Tensor) -> Result<(Tensor, Tensor)> {
        let (_groups, _batch, _) = out.dims3()?;
        let visibility_logits = self.visibility_fcn.forward(out)?.unsqueeze(0)?;
        let z = self.z_fcn.forward(out)?.unsqueeze(0)?;
        Ok((visibility_logits, z))
    }

    pub fn d_model(&self) -> usize {
        self.d_model
    }

    pub fn dim_z(&self) -> usize {
        self.dim_z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    use crate::error::Error;

    #[test]
    fn outputs_carry_leading_singleton_axis() {
        for (groups, batch, d_model, dim_z) in [(1, 1, 4, 3), (8, 2, 16, 32), (3, 5, 7, 1)] {
            let varmap = VarMap::new();
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
            let head = HierarchicalHead::new(d_model, dim_z, vb).expect("head");

            let out = Tensor::randn(0f32, 1f32, (groups, batch, d_model), &Device::Cpu)
                .expect("input");
            let (visibility, z) = head.forward(&out).expect("forward");
            assert_eq!(visibility.dims(), &[1, groups, batch, 2]);
            assert_eq!(z.dims(), &[1, groups, batch, dim_z]);
        }
    }

    #[test]
    fn projects_from_d_model() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let head = HierarchicalHead::new(16, 4, vb).expect("head");

        let vars = varmap.data().lock().expect("varmap lock");
        assert_eq!(vars["z_fcn.weight"].dims(), &[4, 16]);
        assert_eq!(vars["visibility_fcn.weight"].dims(), &[2, 16]);
        assert_eq!(head.dim_z(), 4);
    }

    #[test]
    fn rank2_input_is_rejected() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let head = HierarchicalHead::new(4, 3, vb).expect("head");
        let out = Tensor::zeros((2, 4), DType::F32, &Device::Cpu).expect("input");
        assert!(matches!(head.forward(&out), Err(Error::Candle(_))));
    }
}
