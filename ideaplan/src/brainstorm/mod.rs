//! Brainstorming dialogue
//!
//! [`ConversationEngine`] drives the clarifying-question exchange that
//! precedes plan generation.

mod engine;

pub use engine::{BrainstormPhase, ConversationEngine};
