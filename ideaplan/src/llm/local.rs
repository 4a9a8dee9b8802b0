//! Local model server client (Ollama-compatible)
//!
//! Talks to `/api/generate` for completions and `/api/tags` for model
//! discovery. Local models are treated as text-only.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{LlmError, ModelBackend, ModelReply, Prompt, PromptStyle};
use crate::config::LocalConfig;
use crate::domain::ImageInput;

/// Reply text for image analysis on a local model
pub const LOCAL_VISION_UNAVAILABLE: &str = "Image analysis not available with the selected local model.";

const PROBE_PROMPT: &str = "Hello";

/// Client for a locally hosted model server
pub struct LocalBackend {
    model: String,
    base_url: String,
    http: Client,
    timeout: Option<Duration>,
    probe_timeout: Duration,
}

impl LocalBackend {
    pub fn new(model: impl Into<String>, config: &LocalConfig) -> Self {
        let model = model.into();
        debug!(%model, base_url = %config.base_url, "LocalBackend::new: called");
        Self {
            model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
            timeout: config.timeout(),
            probe_timeout: config.probe_timeout(),
        }
    }

    /// Build the `/api/generate` request body
    fn build_request_body(&self, prompt: &str, system: Option<&str>) -> serde_json::Value {
        debug!(%self.model, prompt_len = prompt.len(), "build_request_body: called");
        let mut body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        if let Some(system) = system {
            debug!("build_request_body: adding system prompt");
            body["system"] = serde_json::json!(system);
        }

        body
    }

    async fn post_generate(&self, body: &serde_json::Value, timeout: Option<Duration>) -> ModelReply {
        let url = format!("{}/api/generate", self.base_url);
        let mut request = self.http.post(&url).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        if !response.status().is_success() {
            debug!(%status, "post_generate: API error");
            return Err(LlmError::Status(status));
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.response)
    }
}

#[async_trait]
impl ModelBackend for LocalBackend {
    fn model(&self) -> &str {
        &self.model
    }

    fn style(&self) -> PromptStyle {
        PromptStyle::Completion
    }

    fn supports_vision(&self) -> bool {
        false
    }

    async fn generate(&self, prompt: Prompt) -> ModelReply {
        debug!(%self.model, "generate: called");
        let (prompt, system) = prompt.into_completion();
        let body = self.build_request_body(&prompt, system.as_deref());

        let reply = self.post_generate(&body, self.timeout).await;
        if let Err(e) = &reply {
            warn!(model = %self.model, error = %e, "generate: local model call failed");
        }
        reply
    }

    async fn analyze_image(&self, _image: &ImageInput, _prompt: &str) -> ModelReply {
        debug!(%self.model, "analyze_image: vision not supported locally");
        Ok(LOCAL_VISION_UNAVAILABLE.to_string())
    }

    async fn probe(&self) -> bool {
        debug!(%self.model, "probe: called");
        let body = self.build_request_body(PROBE_PROMPT, None);
        match self.post_generate(&body, Some(self.probe_timeout)).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "probe: failed");
                false
            }
        }
    }
}

/// List the models installed on the local server
///
/// Any failure yields an empty list.
pub async fn list_models(config: &LocalConfig) -> Vec<String> {
    debug!(base_url = %config.base_url, "list_models: called");
    let url = format!("{}/api/tags", config.base_url.trim_end_matches('/'));

    let response = match Client::new().get(&url).timeout(config.probe_timeout()).send().await {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            warn!(status = %r.status(), "list_models: server returned error");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "list_models: server unreachable");
            return Vec::new();
        }
    };

    match response.json::<TagsResponse>().await {
        Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
        Err(e) => {
            warn!(error = %e, "list_models: unreadable tag list");
            Vec::new()
        }
    }
}

// Local server API response types

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}
