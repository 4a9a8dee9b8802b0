//! ModelBackend trait definition

use async_trait::async_trait;

use super::{ModelReply, Prompt, PromptStyle};
use crate::domain::ImageInput;

/// Uniform call contract over the local and cloud model servers
///
/// Calls never fail past this boundary with anything other than a
/// [`ModelReply`] error; connectivity probes collapse to a boolean. The rest
/// of the system only ever talks to a `dyn ModelBackend` chosen once when the
/// session's model is configured.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Model name used for generation
    fn model(&self) -> &str;

    /// Prompt shape this backend consumes natively
    fn style(&self) -> PromptStyle;

    /// Whether `analyze_image` actually looks at the image
    fn supports_vision(&self) -> bool;

    /// Generate text for a prompt (blocking until the server answers)
    async fn generate(&self, prompt: Prompt) -> ModelReply;

    /// Describe an image in light of a text instruction
    async fn analyze_image(&self, image: &ImageInput, prompt: &str) -> ModelReply;

    /// Minimal no-op generation used to gate navigation
    async fn probe(&self) -> bool;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::llm::LlmError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Scripted reply for the mock backend
    #[derive(Debug, Clone)]
    pub enum MockReply {
        Text(String),
        Fail(String),
    }

    impl MockReply {
        pub fn text(s: impl Into<String>) -> Self {
            Self::Text(s.into())
        }
    }

    /// Mock backend for unit tests
    pub struct MockBackend {
        replies: Vec<MockReply>,
        call_count: AtomicUsize,
        analyze_count: AtomicUsize,
        prompts: Mutex<Vec<Prompt>>,
        style: PromptStyle,
        vision: bool,
        probe_ok: bool,
    }

    impl MockBackend {
        pub fn new(replies: Vec<MockReply>) -> Self {
            debug!(reply_count = %replies.len(), "MockBackend::new: called");
            Self {
                replies,
                call_count: AtomicUsize::new(0),
                analyze_count: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                style: PromptStyle::Completion,
                vision: true,
                probe_ok: true,
            }
        }

        /// Convenience constructor from plain text replies
        pub fn texts(replies: &[&str]) -> Self {
            Self::new(replies.iter().map(|r| MockReply::text(*r)).collect())
        }

        pub fn with_style(mut self, style: PromptStyle) -> Self {
            self.style = style;
            self
        }

        pub fn with_vision(mut self, vision: bool) -> Self {
            self.vision = vision;
            self
        }

        pub fn with_probe(mut self, ok: bool) -> Self {
            self.probe_ok = ok;
            self
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn analyze_count(&self) -> usize {
            self.analyze_count.load(Ordering::SeqCst)
        }

        /// Prompts received by `generate`, in call order
        pub fn prompts(&self) -> Vec<Prompt> {
            self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl ModelBackend for MockBackend {
        fn model(&self) -> &str {
            "mock"
        }

        fn style(&self) -> PromptStyle {
            self.style
        }

        fn supports_vision(&self) -> bool {
            self.vision
        }

        async fn generate(&self, prompt: Prompt) -> ModelReply {
            debug!("MockBackend::generate: called");
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt);
            }
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(idx) {
                Some(MockReply::Text(text)) => Ok(text.clone()),
                Some(MockReply::Fail(message)) => Err(LlmError::InvalidResponse(message.clone())),
                None => Err(LlmError::InvalidResponse("No more mock responses".to_string())),
            }
        }

        async fn analyze_image(&self, _image: &ImageInput, _prompt: &str) -> ModelReply {
            debug!("MockBackend::analyze_image: called");
            self.analyze_count.fetch_add(1, Ordering::SeqCst);
            if self.vision {
                Ok("A sketch of a water bottle with a progress ring".to_string())
            } else {
                Ok(crate::llm::LOCAL_VISION_UNAVAILABLE.to_string())
            }
        }

        async fn probe(&self) -> bool {
            self.probe_ok
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_backend_returns_replies_in_order() {
            let backend = MockBackend::texts(&["Response 1", "Response 2"]);
            let prompt = Prompt::shaped(PromptStyle::Completion, None, "Test".to_string());

            assert_eq!(backend.generate(prompt.clone()).await.unwrap(), "Response 1");
            assert_eq!(backend.generate(prompt.clone()).await.unwrap(), "Response 2");
            assert_eq!(backend.call_count(), 2);
            assert_eq!(backend.prompts().len(), 2);
        }

        #[tokio::test]
        async fn test_mock_backend_errors_when_exhausted() {
            let backend = MockBackend::new(vec![MockReply::Fail("connection refused".to_string())]);
            let prompt = Prompt::shaped(PromptStyle::Chat, None, "Test".to_string());

            assert!(backend.generate(prompt.clone()).await.is_err());
            assert!(backend.generate(prompt).await.is_err());
        }
    }
}
