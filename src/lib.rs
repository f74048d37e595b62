pub mod config;
pub mod error;
pub mod model;

// Re-exports for convenience
pub use config::ModelConfig;
pub use error::{Error, Result};
pub use model::{AttentionKind, Backbone, CspDarknet53, YoloBody, YoloOutput};
