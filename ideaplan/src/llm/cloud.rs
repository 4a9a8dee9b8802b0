//! Cloud completion API client (OpenAI-compatible chat completions)
//!
//! Every call builds its own HTTP client from the key the session supplied,
//! so nothing is shared between calls or sessions.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ChatMessage, LlmError, ModelBackend, ModelReply, Prompt, PromptStyle};
use crate::config::CloudConfig;
use crate::domain::ImageInput;

const PROBE_PROMPT: &str = "Hello";

/// Token budget for the connectivity probe
const PROBE_MAX_TOKENS: u32 = 10;

/// Catalogue models that accept image input
const VISION_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo"];

/// Models offered for cloud selection
pub fn available_cloud_models() -> Vec<&'static str> {
    vec![
        "gpt-4o",
        "gpt-4o-mini",
        "gpt-4-turbo",
        "gpt-3.5-turbo",
        "claude-3-opus",
        "claude-3-sonnet",
        "claude-3-haiku",
        "gemini-1.5-pro",
        "gemini-1.0-pro",
    ]
}

/// Client for a cloud chat completion API
pub struct CloudBackend {
    model: String,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    vision_max_tokens: u32,
    vision_model: String,
    probe_model: String,
    timeout: Option<Duration>,
    probe_timeout: Duration,
}

impl CloudBackend {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, config: &CloudConfig) -> Self {
        let model = model.into();
        debug!(%model, base_url = %config.base_url, "CloudBackend::new: called");
        Self {
            model,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            vision_max_tokens: config.vision_max_tokens,
            vision_model: config.vision_model.clone(),
            probe_model: config.probe_model.clone(),
            timeout: config.timeout(),
            probe_timeout: config.probe_timeout(),
        }
    }

    /// Model used for image analysis
    ///
    /// The selected model when it can see images, otherwise the configured
    /// vision model.
    fn vision_model(&self) -> &str {
        if self.model.contains("vision") || VISION_MODELS.contains(&self.model.as_str()) {
            &self.model
        } else {
            &self.vision_model
        }
    }

    /// Build the chat completions request body
    fn build_request_body(&self, model: &str, messages: &[ChatMessage], max_tokens: u32) -> serde_json::Value {
        debug!(%model, message_count = %messages.len(), %max_tokens, "build_request_body: called");
        serde_json::json!({
            "model": model,
            "messages": messages,
            "max_tokens": max_tokens,
        })
    }

    /// Build a single-message body carrying text plus an inline image
    fn build_vision_body(&self, image: &ImageInput, prompt: &str) -> serde_json::Value {
        let model = self.vision_model();
        debug!(%model, "build_vision_body: called");
        serde_json::json!({
            "model": model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": image.data_url() } },
                ],
            }],
            "max_tokens": self.vision_max_tokens,
        })
    }

    /// Send one chat completion request with a freshly built client
    async fn post_chat(&self, body: &serde_json::Value, timeout: Option<Duration>) -> ModelReply {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let response = http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            debug!(%status, "post_chat: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        debug!("post_chat: success");
        let api_response: ChatResponse = response.json().await?;
        parse_response(api_response)
    }
}

/// First choice's message content
fn parse_response(api_response: ChatResponse) -> ModelReply {
    debug!(choice_count = %api_response.choices.len(), "parse_response: called");
    api_response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))
}

#[async_trait]
impl ModelBackend for CloudBackend {
    fn model(&self) -> &str {
        &self.model
    }

    fn style(&self) -> PromptStyle {
        PromptStyle::Chat
    }

    fn supports_vision(&self) -> bool {
        true
    }

    async fn generate(&self, prompt: Prompt) -> ModelReply {
        debug!(%self.model, "generate: called");
        let messages = prompt.into_messages();
        let body = self.build_request_body(&self.model, &messages, self.max_tokens);

        let reply = self.post_chat(&body, self.timeout).await;
        if let Err(e) = &reply {
            warn!(model = %self.model, error = %e, "generate: cloud model call failed");
        }
        reply
    }

    async fn analyze_image(&self, image: &ImageInput, prompt: &str) -> ModelReply {
        debug!(%self.model, "analyze_image: called");
        let body = self.build_vision_body(image, prompt);

        let reply = self.post_chat(&body, self.timeout).await;
        if let Err(e) = &reply {
            warn!(model = %self.vision_model(), error = %e, "analyze_image: vision call failed");
        }
        reply
    }

    async fn probe(&self) -> bool {
        debug!(probe_model = %self.probe_model, "probe: called");
        let messages = [ChatMessage::user(PROBE_PROMPT)];
        let body = self.build_request_body(&self.probe_model, &messages, PROBE_MAX_TOKENS);
        match self.post_chat(&body, Some(self.probe_timeout)).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "probe: failed");
                false
            }
        }
    }
}

// Chat completions API response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
