//! Model manifest - the JSON file listing every servable model
//!
//! ```json
//! {
//!   "default_model": "fast",
//!   "models": [
//!     { "identifier": "fast", "family": "baseline-linear",
//!       "artifact_location": "baselines/logreg.json", "labels": ["neg", "pos"] }
//!   ]
//! }
//! ```
//!
//! Relative artifact locations resolve against the manifest's directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use textclf_core::ModelDescriptor;

#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub default_model: Option<String>,
    pub models: Vec<ModelDescriptor>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read model manifest {}", path.display()))?;
        let mut manifest: Manifest = serde_json::from_str(&raw)
            .with_context(|| format!("invalid model manifest {}", path.display()))?;

        if manifest.models.is_empty() {
            bail!("model manifest {} lists no models", path.display());
        }

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for descriptor in &mut manifest.models {
            descriptor.artifact_location = resolve(&base, &descriptor.artifact_location);
        }
        Ok(manifest)
    }
}

fn resolve(base: &Path, location: &Path) -> PathBuf {
    if location.is_absolute() {
        location.to_path_buf()
    } else {
        base.join(location)
    }
}
