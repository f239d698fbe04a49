//! Model listing / switching bodies

use serde::{Deserialize, Serialize};
use textclf_core::ModelDescriptor;

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub family: String,
    pub description: Option<String>,
    pub path: String,
    pub classes: Vec<String>,
    pub loaded: bool,
    pub active: bool,
}

impl ModelInfo {
    pub fn from_descriptor(descriptor: &ModelDescriptor, loaded: bool, active: bool) -> Self {
        Self {
            name: descriptor.identifier.clone(),
            family: descriptor.family.to_string(),
            description: descriptor.description.clone(),
            path: descriptor.location_display(),
            classes: descriptor.labels.clone(),
            loaded,
            active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub current_model: Option<String>,
    pub available_models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub model_name: String,
}

#[derive(Debug, Serialize)]
pub struct SwitchResponse {
    pub message: String,
    pub previous_model: Option<String>,
    pub current_model: String,
    #[serde(rename = "type")]
    pub family: String,
    pub num_classes: usize,
}

#[derive(Debug, Serialize)]
pub struct EvictResponse {
    pub message: String,
    pub model: String,
    pub was_loaded: bool,
}
