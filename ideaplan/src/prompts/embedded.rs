//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System prompt for the clarifying-question turns
pub const QUESTIONER_SYSTEM: &str = include_str!("../../prompts/questioner_system.pmt");

/// First round of clarifying questions
pub const INITIAL_QUESTIONS: &str = include_str!("../../prompts/initial_questions.pmt");

/// System prompt for follow-up turns
pub const FOLLOWUP_SYSTEM: &str = include_str!("../../prompts/followup_system.pmt");

/// Follow-up questions or the completion sentinel
pub const FOLLOWUP: &str = include_str!("../../prompts/followup.pmt");

/// System prompt for plan generation
pub const PLAN_SYSTEM: &str = include_str!("../../prompts/plan_system.pmt");

/// Eight-section implementation plan
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");

/// Vision instruction for the uploaded sketch
pub const IMAGE_ANALYSIS: &str = include_str!("../../prompts/image_analysis.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let template = match name {
        "questioner_system" => QUESTIONER_SYSTEM,
        "initial_questions" => INITIAL_QUESTIONS,
        "followup_system" => FOLLOWUP_SYSTEM,
        "followup" => FOLLOWUP,
        "plan_system" => PLAN_SYSTEM,
        "plan" => PLAN,
        "image_analysis" => IMAGE_ANALYSIS,
        _ => {
            debug!("get_embedded: no match found");
            return None;
        }
    };
    Some(template)
}
