//! Prompt Assembler
//!
//! Builds the brainstorming, plan and image-analysis prompts from session
//! state. Every builder is read-only over its inputs.

use std::path::Path;

use eyre::Result;
use serde::Serialize;
use tracing::debug;

use super::{BRAINSTORMING_SENTINEL, PromptLoader};
use crate::domain::{SessionContext, Transcript};
use crate::llm::{Prompt, PromptStyle};

/// Substituted when no sketch has been analysed
pub const NO_IMAGE_ANALYSIS: &str = "No image analysis available.";

/// Context for rendering prompt templates
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub idea: String,
    pub plan_type: String,
    pub image_analysis: String,
    /// Transcript rendered as `AI:` / `User:` lines
    pub conversation: String,
    /// Feedback in submission order
    pub feedback: Vec<String>,
    pub sentinel: &'static str,
}

impl PromptContext {
    pub fn new(ctx: &SessionContext) -> Self {
        debug!(idea_len = ctx.idea_description.len(), "PromptContext::new: called");
        Self {
            idea: ctx.idea_description.clone(),
            plan_type: ctx.plan_type_label().to_string(),
            image_analysis: ctx
                .image_analysis
                .clone()
                .unwrap_or_else(|| NO_IMAGE_ANALYSIS.to_string()),
            conversation: String::new(),
            feedback: Vec::new(),
            sentinel: BRAINSTORMING_SENTINEL,
        }
    }

    pub fn with_transcript(mut self, transcript: &Transcript) -> Self {
        self.conversation = transcript.render();
        self
    }

    pub fn with_feedback(mut self, feedback: &[String]) -> Self {
        self.feedback = feedback.to_vec();
        self
    }
}

/// Builds prompts in the shape each backend expects
pub struct PromptAssembler {
    loader: PromptLoader,
}

impl PromptAssembler {
    pub fn new(loader: PromptLoader) -> Self {
        Self { loader }
    }

    /// Assembler backed by the embedded templates only
    pub fn embedded() -> Self {
        Self::new(PromptLoader::embedded_only())
    }

    /// Assembler that prefers `.pmt` files in `dir` when present
    pub fn with_override_dir(dir: Option<&Path>) -> Self {
        Self::new(PromptLoader::new(dir))
    }

    fn shaped(&self, style: PromptStyle, system: &str, user: &str, context: &PromptContext) -> Result<Prompt> {
        let system = self.loader.render(system, context)?;
        let user = self.loader.render(user, context)?;
        Ok(Prompt::shaped(style, Some(system), user))
    }

    /// First round of 1-3 clarifying questions
    pub fn initial_questions(&self, ctx: &SessionContext, style: PromptStyle) -> Result<Prompt> {
        debug!(?style, "initial_questions: called");
        let context = PromptContext::new(ctx);
        self.shaped(style, "questioner_system", "initial_questions", &context)
    }

    /// Next 1-2 questions, or the completion sentinel
    pub fn followup(&self, ctx: &SessionContext, transcript: &Transcript, style: PromptStyle) -> Result<Prompt> {
        debug!(?style, turns = transcript.len(), "followup: called");
        let context = PromptContext::new(ctx).with_transcript(transcript);
        self.shaped(style, "followup_system", "followup", &context)
    }

    /// Full implementation plan including all feedback so far
    pub fn plan(
        &self,
        ctx: &SessionContext,
        transcript: &Transcript,
        feedback: &[String],
        style: PromptStyle,
    ) -> Result<Prompt> {
        debug!(?style, turns = transcript.len(), feedback_count = feedback.len(), "plan: called");
        let context = PromptContext::new(ctx)
            .with_transcript(transcript)
            .with_feedback(feedback);
        self.shaped(style, "plan_system", "plan", &context)
    }

    /// Vision instruction for the uploaded sketch
    pub fn image_analysis(&self, ctx: &SessionContext) -> Result<String> {
        debug!("image_analysis: called");
        self.loader.render("image_analysis", &PromptContext::new(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PlanType, Speaker};
    use crate::llm::Role;

    fn water_ctx() -> SessionContext {
        let mut ctx = SessionContext::new();
        ctx.commit_idea("Track water intake").unwrap();
        ctx.set_plan_type(PlanType::AppDevelopment).unwrap();
        ctx
    }

    fn transcript() -> Transcript {
        let mut t = Transcript::new();
        t.push(Speaker::Assistant, "1. Which platform?").unwrap();
        t.push(Speaker::User, "iOS only").unwrap();
        t
    }

    #[test]
    fn test_initial_questions_without_analysis() {
        let assembler = PromptAssembler::embedded();
        let prompt = assembler
            .initial_questions(&water_ctx(), PromptStyle::Completion)
            .unwrap();

        let text = prompt.user_text();
        assert!(text.contains("Track water intake"));
        assert!(text.contains("App Development"));
        assert!(text.contains(NO_IMAGE_ANALYSIS));
        assert!(text.contains("1-3"));
        assert!(prompt.system_text().unwrap().contains("asks clear, specific questions"));
    }

    #[test]
    fn test_initial_questions_with_analysis() {
        let mut ctx = water_ctx();
        ctx.image_analysis = Some("A bottle with a progress ring".to_string());

        let text = PromptAssembler::embedded()
            .initial_questions(&ctx, PromptStyle::Completion)
            .unwrap()
            .user_text();
        assert!(text.contains("A bottle with a progress ring"));
        assert!(!text.contains(NO_IMAGE_ANALYSIS));
    }

    #[test]
    fn test_styles_carry_identical_text() {
        let assembler = PromptAssembler::embedded();
        let completion = assembler
            .followup(&water_ctx(), &transcript(), PromptStyle::Completion)
            .unwrap();
        let chat = assembler
            .followup(&water_ctx(), &transcript(), PromptStyle::Chat)
            .unwrap();

        assert_eq!(completion.user_text(), chat.user_text());
        assert_eq!(completion.system_text(), chat.system_text());

        let Prompt::Chat(messages) = chat else {
            panic!("expected chat prompt");
        };
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_followup_includes_transcript_and_sentinel() {
        let text = PromptAssembler::embedded()
            .followup(&water_ctx(), &transcript(), PromptStyle::Completion)
            .unwrap()
            .user_text();

        assert!(text.contains("AI: 1. Which platform?\nUser: iOS only"));
        assert!(text.contains(BRAINSTORMING_SENTINEL));
        assert!(text.contains("1-2 more questions"));
    }

    #[test]
    fn test_plan_has_outline() {
        let text = PromptAssembler::embedded()
            .plan(&water_ctx(), &transcript(), &[], PromptStyle::Chat)
            .unwrap()
            .user_text();

        for section in [
            "1. Executive Summary",
            "2. Project Scope",
            "3. Key Features and Components",
            "4. Implementation Timeline",
            "5. Required Resources",
            "6. Success Metrics",
            "7. Potential Challenges and Mitigations",
            "8. Next Steps",
        ] {
            assert!(text.contains(section), "missing section {}", section);
        }
        assert!(text.contains("User: iOS only"));
        assert!(!text.contains("Previous feedback:"));
    }

    #[test]
    fn test_plan_feedback_in_order() {
        let feedback = vec!["Add a budget".to_string(), "Shorter timeline".to_string()];
        let text = PromptAssembler::embedded()
            .plan(&water_ctx(), &transcript(), &feedback, PromptStyle::Completion)
            .unwrap()
            .user_text();

        let header = text.find("Previous feedback:").unwrap();
        let first = text.find("- Add a budget").unwrap();
        let second = text.find("- Shorter timeline").unwrap();
        assert!(header < first && first < second);
    }

    #[test]
    fn test_image_analysis_prompt() {
        let text = PromptAssembler::embedded().image_analysis(&water_ctx()).unwrap();
        assert!(text.contains("Analyze this drawing related to the following idea: Track water intake"));
    }
}
