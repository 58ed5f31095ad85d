//! Configuration models, topic catalogue, and layered config loading.
//!
//! This crate owns the ProfessorBot config schema, validation, layer-merging
//! logic, and the built-in topic data that parameterises each dialogue.

mod error;
mod loader;
mod model;
mod topic;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
/// Topic records and the catalogue that resolves them.
pub use topic::{Topic, TopicCatalog};
