//! API Module
//!
//! - service.rs: `InferenceService`, the operations exposed to callers
//! - engine_status.rs: health / status report types

pub mod engine_status;
pub mod service;

pub use engine_status::{EngineStatus, HealthStatus, InferenceStats, SwitchConfirmation};
pub use service::InferenceService;
