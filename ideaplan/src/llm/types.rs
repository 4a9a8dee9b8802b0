//! Model request/response types
//!
//! A [`Prompt`] comes in two shapes: a single completion string (local
//! servers) or a system + user message list (chat APIs). Both carry the same
//! text; each backend normalises whichever shape it receives.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LlmError;

/// Result of one model call, flattened to text only where it is stored or shown
pub type ModelReply = Result<String, LlmError>;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message with plain text content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// Which prompt shape a backend prefers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Single prompt string plus optional system prompt
    Completion,
    /// System message followed by user messages
    Chat,
}

/// A fully assembled prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Completion { prompt: String, system: Option<String> },
    Chat(Vec<ChatMessage>),
}

impl Prompt {
    /// Shape the same system/user text for the given style
    pub fn shaped(style: PromptStyle, system: Option<String>, user: String) -> Self {
        match style {
            PromptStyle::Completion => Prompt::Completion { prompt: user, system },
            PromptStyle::Chat => {
                let mut messages = Vec::with_capacity(2);
                if let Some(system) = system {
                    messages.push(ChatMessage::system(system));
                }
                messages.push(ChatMessage::user(user));
                Prompt::Chat(messages)
            }
        }
    }

    /// The non-system text of the prompt
    pub fn user_text(&self) -> String {
        match self {
            Prompt::Completion { prompt, .. } => prompt.clone(),
            Prompt::Chat(messages) => messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    pub fn system_text(&self) -> Option<&str> {
        match self {
            Prompt::Completion { system, .. } => system.as_deref(),
            Prompt::Chat(messages) => messages
                .iter()
                .find(|m| m.role == Role::System)
                .map(|m| m.content.as_str()),
        }
    }

    /// Convert to `(prompt, system)` for completion-style servers
    pub fn into_completion(self) -> (String, Option<String>) {
        match self {
            Prompt::Completion { prompt, system } => (prompt, system),
            Prompt::Chat(_) => {
                debug!("Prompt::into_completion: flattening chat messages");
                let system = self.system_text().map(String::from);
                (self.user_text(), system)
            }
        }
    }

    /// Convert to a message list for chat-style APIs
    pub fn into_messages(self) -> Vec<ChatMessage> {
        match self {
            Prompt::Chat(messages) => messages,
            Prompt::Completion { prompt, system } => {
                debug!("Prompt::into_messages: wrapping completion prompt");
                let mut messages = Vec::with_capacity(2);
                if let Some(system) = system {
                    messages.push(ChatMessage::system(system));
                }
                messages.push(ChatMessage::user(prompt));
                messages
            }
        }
    }
}

/// Flatten a generation reply into displayable text
///
/// Failures become `Error: <message>`, so callers that store the text cannot
/// tell a failed call from model output without looking at the prefix.
pub fn reply_text(reply: ModelReply) -> String {
    match reply {
        Ok(text) => text,
        Err(e) => format!("Error: {}", e),
    }
}

/// Flatten an image analysis reply into displayable text
pub fn analysis_text(reply: ModelReply) -> String {
    match reply {
        Ok(text) => text,
        Err(e) => format!("Error analyzing image: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shaped_completion() {
        let prompt = Prompt::shaped(PromptStyle::Completion, Some("sys".to_string()), "ask".to_string());
        assert_eq!(
            prompt,
            Prompt::Completion {
                prompt: "ask".to_string(),
                system: Some("sys".to_string())
            }
        );
    }

    #[test]
    fn test_shaped_chat_same_text() {
        let chat = Prompt::shaped(PromptStyle::Chat, Some("sys".to_string()), "ask".to_string());
        let completion = Prompt::shaped(PromptStyle::Completion, Some("sys".to_string()), "ask".to_string());

        assert_eq!(chat.user_text(), completion.user_text());
        assert_eq!(chat.system_text(), completion.system_text());

        let Prompt::Chat(messages) = chat else {
            panic!("expected chat prompt");
        };
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_conversions() {
        let chat = Prompt::shaped(PromptStyle::Chat, Some("sys".to_string()), "ask".to_string());
        assert_eq!(chat.into_completion(), ("ask".to_string(), Some("sys".to_string())));

        let completion = Prompt::shaped(PromptStyle::Completion, None, "ask".to_string());
        assert_eq!(completion.into_messages(), vec![ChatMessage::user("ask")]);
    }

    #[test]
    fn test_reply_text() {
        assert_eq!(reply_text(Ok("1. Who?".to_string())), "1. Who?");

        let text = reply_text(Err(LlmError::ApiError {
            status: 500,
            message: String::new(),
        }));
        assert!(text.starts_with("Error"));

        let text = analysis_text(Err(LlmError::InvalidResponse("empty".to_string())));
        assert!(text.starts_with("Error analyzing image"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::system("x")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "x");
    }
}
