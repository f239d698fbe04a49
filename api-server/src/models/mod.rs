//! Request / response bodies

pub mod model_info;
pub mod prediction;

pub use model_info::*;
pub use prediction::*;
