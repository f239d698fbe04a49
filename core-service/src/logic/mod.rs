//! Logic Module - models and the registry that owns them
//!
//! - `model/` - descriptors, scoring backends (TF-IDF linear, ONNX), adapters
//! - `registry/` - known models, lazy loading, active model switching

pub mod model;
pub mod registry;
