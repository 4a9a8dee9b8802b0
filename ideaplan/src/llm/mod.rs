//! Model adapter for IdeaPlan
//!
//! One [`ModelBackend`] contract over a local model server and a cloud chat
//! completion API. Pick the backend once with [`create_backend`]; everything
//! downstream only sees the trait object.

use std::sync::Arc;

use tracing::debug;

mod backend;
mod cloud;
mod error;
mod local;
#[cfg(test)]
mod test_server;
mod types;

#[cfg(test)]
pub use backend::mock;
pub use backend::ModelBackend;
pub use cloud::{CloudBackend, available_cloud_models};
pub use error::LlmError;
pub use local::{LOCAL_VISION_UNAVAILABLE, LocalBackend, list_models as list_local_models};
pub use types::{ChatMessage, ModelReply, Prompt, PromptStyle, Role, analysis_text, reply_text};

use crate::config::Config;
use crate::domain::ModelSelection;

/// Create the backend serving a model selection
pub fn create_backend(selection: &ModelSelection, config: &Config) -> Result<Arc<dyn ModelBackend>, LlmError> {
    debug!(?selection, "create_backend: called");
    match selection {
        ModelSelection::Local { model } => {
            debug!("create_backend: creating local backend");
            Ok(Arc::new(LocalBackend::new(model.as_str(), &config.local)))
        }
        ModelSelection::Cloud { model, api_key } => {
            if api_key.trim().is_empty() {
                debug!("create_backend: missing API key");
                return Err(LlmError::InvalidResponse("Please provide an API key".to_string()));
            }
            debug!("create_backend: creating cloud backend");
            Ok(Arc::new(CloudBackend::new(model.as_str(), api_key.as_str(), &config.cloud)))
        }
    }
}
