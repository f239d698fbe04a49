//! Artifact loading - turns a descriptor into a scoring backend.

use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::constants::ONNX_MODEL_FILE;
use crate::error::{LoadError, PredictError};
use super::linear::LinearModel;
use super::transformer::TransformerModel;
use super::types::{ModelDescriptor, ModelFamily};

/// Raw scoring backend. Produces one decision value (logit) per output.
pub trait Scorer: Send + Sync {
    fn decision(&self, text: &str) -> Result<Vec<f32>, PredictError>;

    /// Output width when the artifact declares it up front.
    fn output_count(&self) -> Option<usize> {
        None
    }

    /// Short backend name for status reporting.
    fn backend(&self) -> &'static str;
}

/// Source of scoring backends for descriptors.
pub trait ArtifactLoader: Send + Sync {
    fn load(&self, descriptor: &ModelDescriptor) -> Result<Box<dyn Scorer>, LoadError>;
}

/// Loads artifacts from the local filesystem, dispatching on the family tag.
#[derive(Debug, Clone, Default)]
pub struct FsArtifactLoader;

impl FsArtifactLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactLoader for FsArtifactLoader {
    fn load(&self, descriptor: &ModelDescriptor) -> Result<Box<dyn Scorer>, LoadError> {
        let location = &descriptor.artifact_location;
        if !location.exists() {
            return Err(LoadError::ArtifactMissing(descriptor.location_display()));
        }

        if let Some(expected) = &descriptor.sha256 {
            verify_checksum(&checksum_target(descriptor), expected)?;
        }

        match descriptor.family {
            ModelFamily::BaselineLinear => Ok(Box::new(LinearModel::from_file(location)?)),
            ModelFamily::TransformerSingleLabel | ModelFamily::TransformerMultiLabel => Ok(
                Box::new(TransformerModel::from_dir(location, descriptor.effective_max_length())?),
            ),
        }
    }
}

/// File whose digest the descriptor's `sha256` refers to.
fn checksum_target(descriptor: &ModelDescriptor) -> PathBuf {
    if descriptor.family.is_transformer() {
        descriptor.artifact_location.join(ONNX_MODEL_FILE)
    } else {
        descriptor.artifact_location.clone()
    }
}

/// Hex SHA-256 of a file.
pub fn file_sha256(path: &Path) -> Result<String, LoadError> {
    let location = path.display().to_string();
    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::ArtifactMissing(location.clone()),
        _ => LoadError::corrupt(&location, e),
    })?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| LoadError::corrupt(&location, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn verify_checksum(path: &Path, expected: &str) -> Result<(), LoadError> {
    let actual = file_sha256(path)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(LoadError::corrupt(
            path.display().to_string(),
            format!("checksum mismatch: expected {}, got {}", expected, actual),
        ));
    }
    Ok(())
}
