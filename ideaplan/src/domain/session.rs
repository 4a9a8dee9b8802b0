//! Session context - the accumulated facts about one planning task

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use super::ValidationError;

/// Kind of implementation plan requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanType {
    SoftwareDevelopment,
    AppDevelopment,
    WebsiteCreation,
    BusinessPlan,
    ResearchProject,
    ContentCreation,
    MarketingCampaign,
    ProductDesign,
    EducationalCourse,
    /// User-specified plan type
    Other(String),
}

impl PlanType {
    /// Menu label shown for the free-text option
    pub const OTHER_LABEL: &'static str = "Other (Please specify)";

    /// The predefined plan types, in menu order
    pub fn presets() -> [PlanType; 9] {
        [
            Self::SoftwareDevelopment,
            Self::AppDevelopment,
            Self::WebsiteCreation,
            Self::BusinessPlan,
            Self::ResearchProject,
            Self::ContentCreation,
            Self::MarketingCampaign,
            Self::ProductDesign,
            Self::EducationalCourse,
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            Self::SoftwareDevelopment => "Software Development",
            Self::AppDevelopment => "App Development",
            Self::WebsiteCreation => "Website Creation",
            Self::BusinessPlan => "Business Plan",
            Self::ResearchProject => "Research Project",
            Self::ContentCreation => "Content Creation",
            Self::MarketingCampaign => "Marketing Campaign",
            Self::ProductDesign => "Product Design",
            Self::EducationalCourse => "Educational Course",
            Self::Other(text) => text.as_str(),
        }
    }

    /// Parse a label; anything that is not a preset becomes `Other`
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        Self::presets()
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(input))
            .unwrap_or_else(|| Self::Other(input.to_string()))
    }

    /// `Other` needs a non-empty description that is not the menu label itself
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Other(text) if text.trim().is_empty() || text == Self::OTHER_LABEL => {
                Err(ValidationError::InvalidPlanType)
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Backend choice: exactly one variant is active at a time
#[derive(Clone, PartialEq, Eq)]
pub enum ModelSelection {
    Local { model: String },
    Cloud { model: String, api_key: String },
}

impl ModelSelection {
    pub fn model(&self) -> &str {
        match self {
            Self::Local { model } | Self::Cloud { model, .. } => model,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Cloud { .. } => "cloud",
        }
    }
}

// Keeps the API key out of logs
impl std::fmt::Debug for ModelSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { model } => f.debug_struct("Local").field("model", model).finish(),
            Self::Cloud { model, .. } => f
                .debug_struct("Cloud")
                .field("model", model)
                .field("api_key", &"<redacted>")
                .finish(),
        }
    }
}

impl std::fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.model(), self.kind())
    }
}

/// Uploaded sketch, either raw bytes or already base64-encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Bytes(Vec<u8>),
    Base64(String),
}

impl ImageInput {
    pub fn to_base64(&self) -> Cow<'_, str> {
        match self {
            Self::Bytes(bytes) => {
                debug!(len = bytes.len(), "ImageInput::to_base64: encoding raw bytes");
                Cow::Owned(STANDARD.encode(bytes))
            }
            Self::Base64(encoded) => Cow::Borrowed(encoded),
        }
    }

    /// Data URL in the `data:image/jpeg;base64,<payload>` convention
    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.to_base64())
    }
}

/// Everything known about the idea being planned
///
/// Fields fill monotonically as the wizard progresses; a new idea starts from
/// a fresh context.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub idea_description: String,
    pub plan_type: Option<PlanType>,
    pub image: Option<ImageInput>,
    /// Computed at most once per session
    pub image_analysis: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit the idea text; whitespace-only input is rejected without mutation
    pub fn commit_idea(&mut self, description: &str) -> Result<(), ValidationError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyIdea);
        }
        debug!(len = description.len(), "SessionContext::commit_idea: saving idea description");
        self.idea_description = description.to_string();
        Ok(())
    }

    pub fn set_plan_type(&mut self, plan_type: PlanType) -> Result<(), ValidationError> {
        plan_type.validate()?;
        debug!(%plan_type, "SessionContext::set_plan_type: called");
        self.plan_type = Some(plan_type);
        Ok(())
    }

    pub fn attach_image(&mut self, image: ImageInput) {
        debug!("SessionContext::attach_image: called");
        self.image = Some(image);
    }

    /// Plan type as text, empty until one is chosen
    pub fn plan_type_label(&self) -> &str {
        self.plan_type.as_ref().map(|p| p.label()).unwrap_or_default()
    }

    /// Idea and plan type are both committed
    pub fn is_ready(&self) -> bool {
        !self.idea_description.trim().is_empty() && self.plan_type.as_ref().is_some_and(|p| p.validate().is_ok())
    }
}
