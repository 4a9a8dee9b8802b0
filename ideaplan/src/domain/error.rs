//! Validation errors
//!
//! Raised before any state transition fires; the caller re-prompts.

use thiserror::Error;

use super::Speaker;

/// Input or sequencing rejected by a wizard component
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Idea description must not be empty")]
    EmptyIdea,

    #[error("Plan type must be selected; 'Other' requires a description")]
    InvalidPlanType,

    #[error("Please enter a response before submitting")]
    EmptyAnswer,

    #[error("Please provide feedback before submitting")]
    EmptyFeedback,

    #[error("Out-of-turn append: expected a {expected} turn")]
    OutOfTurn { expected: Speaker },

    #[error("Cannot {operation} while {state}")]
    InvalidState { operation: &'static str, state: String },

    #[error("Select and verify a model before continuing")]
    ModelNotVerified,

    #[error("Cannot continue: {0}")]
    StepIncomplete(&'static str),
}
