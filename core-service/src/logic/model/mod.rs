//! Model Module - adapters and scoring backends
//!
//! One `ModelAdapter` per descriptor. The family tag picks the artifact
//! format (loader) and the output head (softmax / sigmoid + threshold).

pub mod adapter;
pub mod head;
pub mod linear;
pub mod loader;
pub mod threshold;
pub mod transformer;
pub mod types;

// Re-export common types
pub use adapter::{AdapterStatus, ModelAdapter};
pub use loader::{ArtifactLoader, FsArtifactLoader, Scorer};
pub use threshold::ThresholdConfig;
pub use types::{ModelDescriptor, ModelFamily, PredictedLabel, PredictionResult};
