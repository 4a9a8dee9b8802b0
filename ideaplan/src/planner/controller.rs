//! PlanController - generate, review, regenerate
//!
//! Each generation sees the whole brainstorming transcript and every piece of
//! feedback submitted so far. Submitting feedback discards the current plan
//! text's readiness; the next `generate` produces a fresh iteration.

use eyre::Result;
use tracing::{debug, info};

use crate::domain::{PlanRecord, SessionContext, Transcript, ValidationError};
use crate::llm::{ModelBackend, reply_text};
use crate::prompts::PromptAssembler;

/// Plan generation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPhase {
    NoPlan,
    Generating,
    Ready,
}

impl std::fmt::Display for PlanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NoPlan => "no plan is ready",
            Self::Generating => "a plan is being generated",
            Self::Ready => "a plan is ready",
        };
        write!(f, "{}", text)
    }
}

/// Iterative plan refinement for one session
#[derive(Debug, Clone)]
pub struct PlanController {
    phase: PlanPhase,
    iteration: u32,
    feedback_history: Vec<String>,
    generated_text: Option<String>,
}

impl Default for PlanController {
    fn default() -> Self {
        Self {
            phase: PlanPhase::NoPlan,
            iteration: 0,
            feedback_history: Vec::new(),
            generated_text: None,
        }
    }
}

impl PlanController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PlanPhase {
        self.phase
    }

    /// Number of completed generations
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn feedback_history(&self) -> &[String] {
        &self.feedback_history
    }

    /// Most recent plan text, kept after feedback for reference
    pub fn generated_text(&self) -> Option<&str> {
        self.generated_text.as_deref()
    }

    /// Generate the next plan iteration
    ///
    /// A failed model call still completes the iteration; its text starts
    /// with `Error`.
    pub async fn generate(
        &mut self,
        ctx: &SessionContext,
        transcript: &Transcript,
        prompts: &PromptAssembler,
        backend: &dyn ModelBackend,
    ) -> Result<&str> {
        debug!(phase = %self.phase, iteration = self.iteration, "generate: called");
        if self.phase != PlanPhase::NoPlan {
            return Err(ValidationError::InvalidState {
                operation: "generate a plan",
                state: self.phase.to_string(),
            }
            .into());
        }

        let prompt = prompts.plan(ctx, transcript, &self.feedback_history, backend.style())?;

        self.phase = PlanPhase::Generating;
        info!(model = backend.model(), iteration = self.iteration + 1, "Generating implementation plan");
        let text = reply_text(backend.generate(prompt).await);

        self.iteration += 1;
        self.phase = PlanPhase::Ready;
        Ok(self.generated_text.insert(text).as_str())
    }

    /// Record feedback on the ready plan and return to `NoPlan`
    pub fn submit_feedback(&mut self, text: &str) -> Result<(), ValidationError> {
        debug!(phase = %self.phase, len = text.len(), "submit_feedback: called");
        if self.phase != PlanPhase::Ready {
            return Err(ValidationError::InvalidState {
                operation: "submit feedback",
                state: self.phase.to_string(),
            });
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyFeedback);
        }

        self.feedback_history.push(text.to_string());
        self.phase = PlanPhase::NoPlan;
        info!(feedback_count = self.feedback_history.len(), "Feedback recorded, plan will be regenerated");
        Ok(())
    }

    /// Record of the ready plan for persistence or export
    pub fn snapshot(&self, ctx: &SessionContext) -> Result<PlanRecord, ValidationError> {
        debug!(phase = %self.phase, "snapshot: called");
        match (&self.phase, &self.generated_text) {
            (PlanPhase::Ready, Some(text)) => Ok(PlanRecord::new(
                ctx.idea_description.as_str(),
                ctx.plan_type_label(),
                text.as_str(),
                self.iteration,
                self.feedback_history.clone(),
            )),
            _ => Err(ValidationError::InvalidState {
                operation: "save the plan",
                state: self.phase.to_string(),
            }),
        }
    }
}
