//! Safetensors loading and saving.
//!
//! Checkpoints come in three layouts:
//! - a single `.safetensors` file
//! - a directory holding `model.safetensors`
//! - a directory holding `model.safetensors.index.json` plus shards

use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use tracing::info;

use crate::error::{Error, Result};

const SINGLE_FILE: &str = "model.safetensors";
const SHARD_INDEX: &str = "model.safetensors.index.json";

/// Create a [`VarBuilder`] over the parameters stored at `path`.
pub fn load_weights(path: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    if !path.exists() {
        return Err(Error::ModelNotFound(format!(
            "No weights found at {}",
            path.display()
        )));
    }

    let files = if path.is_dir() {
        resolve_checkpoint_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    info!(
        "Loading head weights from {} ({} file(s))",
        path.display(),
        files.len()
    );

    // SAFETY: the files are memory mapped read-only and must not be modified
    // while the returned builder is alive.
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&files, dtype, device)
            .map_err(|e| Error::ModelLoadError(format!("Failed to load safetensors: {}", e)))?
    };
    Ok(vb)
}

fn resolve_checkpoint_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let single = dir.join(SINGLE_FILE);
    if single.exists() {
        return Ok(vec![single]);
    }

    let index_path = dir.join(SHARD_INDEX);
    if !index_path.exists() {
        return Err(Error::ModelNotFound(format!(
            "No model files found in {}",
            dir.display()
        )));
    }

    let index_data = std::fs::read_to_string(&index_path)
        .map_err(|e| Error::ModelLoadError(format!("Failed to read index: {}", e)))?;
    let index: serde_json::Value = serde_json::from_str(&index_data)
        .map_err(|e| Error::ModelLoadError(format!("Failed to parse index: {}", e)))?;

    let weight_map = index
        .get("weight_map")
        .and_then(|m| m.as_object())
        .ok_or_else(|| Error::ModelLoadError("Invalid index format".to_string()))?;

    let mut shard_files: Vec<String> = weight_map
        .values()
        .filter_map(|v| v.as_str().map(String::from))
        .collect();
    shard_files.sort();
    shard_files.dedup();

    if shard_files.is_empty() {
        return Err(Error::ModelLoadError(
            "Shard index does not reference any files".to_string(),
        ));
    }

    info!("Resolved sharded checkpoint with {} shards", shard_files.len());
    Ok(shard_files.iter().map(|f| dir.join(f)).collect())
}

/// Write every variable in `varmap` to a safetensors file.
pub fn save_weights(varmap: &VarMap, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    varmap.save(path)?;
    info!(
        "Saved {} head parameters to {}",
        varmap.all_vars().len(),
        path.display()
    );
    Ok(())
}

/// Builder backed by `varmap`, so freshly initialized parameters are
/// trainable and reachable through [`VarMap::all_vars`].
pub fn fresh_var_builder(varmap: &VarMap, dtype: DType, device: &Device) -> VarBuilder<'static> {
    VarBuilder::from_varmap(varmap, dtype, device)
}
