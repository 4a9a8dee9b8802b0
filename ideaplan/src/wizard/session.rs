//! WizardSession - one user's walk through the planning wizard
//!
//! Owns everything a session knows: the chosen backend and whether it has been
//! verified, the idea context, the brainstorming dialogue and the plan loop.
//! Navigation between steps is gated on each step's completion.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{debug, info, warn};

use crate::brainstorm::{BrainstormPhase, ConversationEngine};
use crate::config::Config;
use crate::domain::{ImageInput, ModelSelection, PlanType, SessionContext, ValidationError};
use crate::history::{PlanStore, write_markdown};
use crate::llm::{LlmError, ModelBackend, create_backend};
use crate::planner::PlanController;
use crate::prompts::PromptAssembler;

/// Wizard pages, in navigation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Home,
    Configuration,
    IdeaInput,
    Brainstorming,
    PlanGenerator,
    History,
}

impl WizardStep {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Configuration => "Model Configuration",
            Self::IdeaInput => "Idea Input",
            Self::Brainstorming => "Interactive Brainstorming",
            Self::PlanGenerator => "Implementation Plan Generator",
            Self::History => "Plan History",
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Home => Some(Self::Configuration),
            Self::Configuration => Some(Self::IdeaInput),
            Self::IdeaInput => Some(Self::Brainstorming),
            Self::Brainstorming => Some(Self::PlanGenerator),
            Self::PlanGenerator => Some(Self::History),
            Self::History => None,
        }
    }

    pub fn previous(&self) -> Option<Self> {
        match self {
            Self::Home => None,
            Self::Configuration => Some(Self::Home),
            Self::IdeaInput => Some(Self::Configuration),
            Self::Brainstorming => Some(Self::IdeaInput),
            Self::PlanGenerator => Some(Self::Brainstorming),
            Self::History => Some(Self::PlanGenerator),
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Explicit session object for the wizard
pub struct WizardSession {
    config: Config,
    prompts: PromptAssembler,
    store: PlanStore,
    step: WizardStep,
    selection: Option<ModelSelection>,
    backend: Option<Arc<dyn ModelBackend>>,
    verified: bool,
    context: SessionContext,
    engine: ConversationEngine,
    planner: PlanController,
}

impl WizardSession {
    pub fn new(config: Config) -> Self {
        debug!("WizardSession::new: called");
        let prompts = PromptAssembler::with_override_dir(config.prompts.dir.as_deref());
        let store = PlanStore::new(config.storage.plans_dir.clone());
        Self {
            config,
            prompts,
            store,
            step: WizardStep::Home,
            selection: None,
            backend: None,
            verified: false,
            context: SessionContext::new(),
            engine: ConversationEngine::new(),
            planner: PlanController::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selection(&self) -> Option<&ModelSelection> {
        self.selection.as_ref()
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn engine(&self) -> &ConversationEngine {
        &self.engine
    }

    pub fn planner(&self) -> &PlanController {
        &self.planner
    }

    pub fn store(&self) -> &PlanStore {
        &self.store
    }

    /// Choose the model serving this session; verification starts over
    pub fn select_model(&mut self, selection: ModelSelection) -> Result<(), LlmError> {
        info!(%selection, "Model selected");
        let backend = create_backend(&selection, &self.config)?;
        self.set_backend(selection, backend);
        Ok(())
    }

    /// Install an already constructed backend for a selection
    pub fn set_backend(&mut self, selection: ModelSelection, backend: Arc<dyn ModelBackend>) {
        debug!(?selection, "set_backend: called");
        self.selection = Some(selection);
        self.backend = Some(backend);
        self.verified = false;
    }

    /// Probe the selected model; navigation past configuration needs a success
    pub async fn verify(&mut self) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            debug!("verify: no model selected");
            return false;
        };

        self.verified = backend.probe().await;
        if self.verified {
            info!(model = backend.model(), "Model connection verified");
        } else {
            warn!(model = backend.model(), "Model connection failed");
        }
        self.verified
    }

    /// Set idea description and plan type together
    ///
    /// Both are validated before either is stored. A different idea or plan
    /// type discards any brainstorming and plans built on the old one.
    pub fn commit_idea(&mut self, description: &str, plan_type: PlanType) -> Result<(), ValidationError> {
        debug!(%plan_type, "commit_idea: called");
        plan_type.validate()?;
        if description.trim().is_empty() {
            return Err(ValidationError::EmptyIdea);
        }

        let changed = self.context.idea_description != description.trim()
            || self.context.plan_type.as_ref() != Some(&plan_type);

        self.context.commit_idea(description)?;
        self.context.set_plan_type(plan_type)?;

        if changed {
            self.reset_dialogue();
        }
        Ok(())
    }

    /// Attach a sketch; its analysis is recomputed on the next brainstorm
    pub fn attach_image(&mut self, image: ImageInput) {
        debug!("attach_image: called");
        self.context.attach_image(image);
        self.context.image_analysis = None;
        self.reset_dialogue();
    }

    /// Read a sketch from disk (JPG, PNG or PDF)
    pub fn attach_image_file(&mut self, path: &Path) -> Result<()> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "pdf") {
            return Err(eyre::eyre!(
                "Unsupported image type '{}': expected jpg, jpeg, png or pdf",
                path.display()
            ));
        }

        let bytes = std::fs::read(path).context(format!("Failed to read image {}", path.display()))?;
        info!(path = %path.display(), len = bytes.len(), "Sketch attached");
        self.attach_image(ImageInput::Bytes(bytes));
        Ok(())
    }

    fn reset_dialogue(&mut self) {
        if !self.engine.transcript().is_empty() || self.planner.iteration() > 0 {
            info!("Idea changed, discarding brainstorming and plans");
        }
        self.engine = ConversationEngine::new();
        self.planner = PlanController::new();
    }

    /// Check whether the current step is complete enough to move on
    pub fn can_advance(&self) -> Result<(), ValidationError> {
        match self.step {
            WizardStep::Home | WizardStep::PlanGenerator => Ok(()),
            WizardStep::Configuration if !self.verified => Err(ValidationError::ModelNotVerified),
            WizardStep::Configuration => Ok(()),
            WizardStep::IdeaInput if !self.context.is_ready() => Err(ValidationError::StepIncomplete(
                "enter an idea description and choose a plan type",
            )),
            WizardStep::IdeaInput => Ok(()),
            WizardStep::Brainstorming if !self.engine.is_complete() => {
                Err(ValidationError::StepIncomplete("brainstorming is not complete yet"))
            }
            WizardStep::Brainstorming => Ok(()),
            WizardStep::History => Err(ValidationError::StepIncomplete("this is the last step")),
        }
    }

    /// Move to the next step if the current one is complete
    pub fn advance(&mut self) -> Result<WizardStep, ValidationError> {
        self.can_advance()?;
        if let Some(next) = self.step.next() {
            info!(from = %self.step, to = %next, "Advancing wizard");
            self.step = next;
        }
        Ok(self.step)
    }

    /// Move to the previous step; state is kept
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            debug!(from = %self.step, to = %previous, "back: called");
            self.step = previous;
        }
        self.step
    }

    /// Jump to the history page, reachable from anywhere
    pub fn open_history(&mut self) {
        self.step = WizardStep::History;
    }

    fn ready_backend(&self) -> Result<Arc<dyn ModelBackend>, ValidationError> {
        match &self.backend {
            Some(backend) if self.verified => Ok(Arc::clone(backend)),
            _ => Err(ValidationError::ModelNotVerified),
        }
    }

    /// Let the model take its next brainstorming turn
    pub async fn brainstorm_step(&mut self) -> Result<BrainstormPhase> {
        let backend = self.ready_backend()?;
        if !self.context.is_ready() {
            return Err(ValidationError::StepIncomplete("enter an idea description and choose a plan type").into());
        }
        self.engine
            .drive(&mut self.context, &self.prompts, backend.as_ref())
            .await
    }

    pub fn answer(&mut self, text: &str) -> Result<(), ValidationError> {
        self.engine.answer(text)
    }

    /// Generate the next plan iteration from the finished brainstorming
    pub async fn generate_plan(&mut self) -> Result<String> {
        let backend = self.ready_backend()?;
        if !self.engine.is_complete() {
            return Err(ValidationError::StepIncomplete("brainstorming is not complete yet").into());
        }
        let text = self
            .planner
            .generate(&self.context, self.engine.transcript(), &self.prompts, backend.as_ref())
            .await?;
        Ok(text.to_string())
    }

    pub fn submit_feedback(&mut self, text: &str) -> Result<(), ValidationError> {
        self.planner.submit_feedback(text)
    }

    /// Persist the ready plan to history
    pub fn save_plan(&self) -> Result<PathBuf> {
        let record = self.planner.snapshot(&self.context)?;
        let path = self.store.save(&record)?;
        Ok(path)
    }

    /// Write the ready plan as `implementation_plan_<timestamp>.md` into `dir`
    pub fn export_plan(&self, dir: &Path) -> Result<PathBuf> {
        let record = self.planner.snapshot(&self.context)?;
        let path = dir.join(record.export_filename());
        write_markdown(&path, &record.generated_text)?;
        Ok(path)
    }

    /// Discard the idea and everything derived from it
    ///
    /// Model selection, its verification and saved history are kept.
    pub fn start_new_idea(&mut self) {
        info!("Starting a new idea");
        self.context = SessionContext::new();
        self.engine = ConversationEngine::new();
        self.planner = PlanController::new();
        self.step = WizardStep::IdeaInput;
    }
}
