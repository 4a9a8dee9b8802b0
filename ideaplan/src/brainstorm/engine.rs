//! ConversationEngine - turn-taking brainstorming dialogue
//!
//! The model asks clarifying questions and the user answers, one turn at a
//! time, until the model replies with the completion sentinel. Each call is
//! awaited to completion before the next one is accepted.

use eyre::Result;
use tracing::{debug, info};

use crate::domain::{SessionContext, Speaker, Transcript, ValidationError};
use crate::llm::{ModelBackend, analysis_text, reply_text};
use crate::prompts::{PromptAssembler, is_brainstorming_complete};

/// Where the dialogue currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrainstormPhase {
    /// No model turn yet
    NotStarted,
    /// The user answered; the model speaks next
    AwaitingModelQuestion,
    /// A question is pending for the user
    AwaitingUserAnswer,
    /// The model signalled it has enough information
    Complete,
}

impl std::fmt::Display for BrainstormPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotStarted => "brainstorming has not started",
            Self::AwaitingModelQuestion => "waiting for the model",
            Self::AwaitingUserAnswer => "waiting for an answer",
            Self::Complete => "brainstorming is complete",
        };
        write!(f, "{}", text)
    }
}

/// Brainstorming state for one session
#[derive(Debug, Clone, Default)]
pub struct ConversationEngine {
    transcript: Transcript,
    pending_question: Option<String>,
    complete: bool,
}

impl ConversationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> BrainstormPhase {
        if self.complete {
            BrainstormPhase::Complete
        } else if self.transcript.is_empty() {
            BrainstormPhase::NotStarted
        } else if self.pending_question.is_some() {
            BrainstormPhase::AwaitingUserAnswer
        } else {
            BrainstormPhase::AwaitingModelQuestion
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn pending_question(&self) -> Option<&str> {
        self.pending_question.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Advance the dialogue by one model turn
    ///
    /// A no-op while an answer is pending or once complete. Model failures are
    /// recorded as ordinary turns; only prompt rendering can fail here.
    pub async fn drive(
        &mut self,
        ctx: &mut SessionContext,
        prompts: &PromptAssembler,
        backend: &dyn ModelBackend,
    ) -> Result<BrainstormPhase> {
        let phase = self.phase();
        debug!(%phase, "drive: called");

        match phase {
            BrainstormPhase::NotStarted => {
                self.analyze_image_once(ctx, prompts, backend).await?;

                info!("Generating initial brainstorming questions");
                let prompt = prompts.initial_questions(ctx, backend.style())?;
                let reply = reply_text(backend.generate(prompt).await);
                self.ask(reply)?;
            }
            BrainstormPhase::AwaitingModelQuestion => {
                let prompt = prompts.followup(ctx, &self.transcript, backend.style())?;
                let reply = reply_text(backend.generate(prompt).await);

                if is_brainstorming_complete(&reply) {
                    info!(turns = self.transcript.len(), "Brainstorming complete");
                    self.complete = true;
                } else {
                    self.ask(reply)?;
                }
            }
            BrainstormPhase::AwaitingUserAnswer | BrainstormPhase::Complete => {
                debug!("drive: nothing to do");
            }
        }

        Ok(self.phase())
    }

    /// Record the user's answer to the pending question
    pub fn answer(&mut self, text: &str) -> Result<(), ValidationError> {
        let phase = self.phase();
        debug!(%phase, len = text.len(), "answer: called");

        if phase != BrainstormPhase::AwaitingUserAnswer {
            return Err(ValidationError::InvalidState {
                operation: "answer",
                state: phase.to_string(),
            });
        }
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyAnswer);
        }

        self.transcript.push(Speaker::User, text)?;
        self.pending_question = None;
        Ok(())
    }

    fn ask(&mut self, question: String) -> Result<(), ValidationError> {
        self.transcript.push(Speaker::Assistant, question.as_str())?;
        self.pending_question = Some(question);
        Ok(())
    }

    /// Fill in the sketch analysis unless it is absent or already known
    async fn analyze_image_once(
        &self,
        ctx: &mut SessionContext,
        prompts: &PromptAssembler,
        backend: &dyn ModelBackend,
    ) -> Result<()> {
        let Some(image) = ctx.image.as_ref() else {
            debug!("analyze_image_once: no image attached");
            return Ok(());
        };
        if ctx.image_analysis.is_some() {
            debug!("analyze_image_once: analysis already present");
            return Ok(());
        }

        info!(vision = backend.supports_vision(), "Analyzing uploaded sketch");
        let instruction = prompts.image_analysis(ctx)?;
        let analysis = analysis_text(backend.analyze_image(image, &instruction).await);
        ctx.image_analysis = Some(analysis);
        Ok(())
    }
}
