//! Domain types for IdeaPlan
//!
//! - [`SessionContext`] - idea, plan type, sketch and its analysis
//! - [`ModelSelection`] - which backend serves the session
//! - [`Transcript`] - the alternating brainstorming dialogue
//! - [`PlanRecord`] - a generated plan ready to be saved

mod error;
mod plan;
mod session;
mod transcript;

pub use error::ValidationError;
pub use plan::{PlanRecord, TIMESTAMP_FORMAT};
pub use session::{ImageInput, ModelSelection, PlanType, SessionContext};
pub use transcript::{Speaker, Transcript, Turn};
