//! Dialogue transcript
//!
//! Append-only record of the brainstorming conversation. Turns alternate
//! Assistant, User, Assistant, ... and the first turn is always Assistant.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ValidationError;

/// Who spoke a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Assistant,
    User,
}

impl Speaker {
    /// Label used when rendering the transcript into a prompt
    pub fn label(&self) -> &'static str {
        match self {
            Self::Assistant => "AI",
            Self::User => "User",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assistant => write!(f, "assistant"),
            Self::User => write!(f, "user"),
        }
    }
}

/// One dialogue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Ordered, strictly alternating sequence of turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// The speaker allowed to take the next turn
    pub fn next_speaker(&self) -> Speaker {
        match self.turns.last() {
            None => Speaker::Assistant,
            Some(turn) if turn.speaker == Speaker::Assistant => Speaker::User,
            Some(_) => Speaker::Assistant,
        }
    }

    /// Append a turn, rejecting anything that would break alternation
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) -> Result<(), ValidationError> {
        let expected = self.next_speaker();
        if speaker != expected {
            debug!(%speaker, %expected, "Transcript::push: out of turn");
            return Err(ValidationError::OutOfTurn { expected });
        }
        self.turns.push(Turn {
            speaker,
            text: text.into(),
        });
        debug!(len = self.turns.len(), "Transcript::push: appended");
        Ok(())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render every turn as `AI: ...` / `User: ...` lines, in order
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.speaker.label(), t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_turn_must_be_assistant() {
        let mut transcript = Transcript::new();
        let err = transcript.push(Speaker::User, "hi").unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfTurn {
                expected: Speaker::Assistant
            }
        );
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_alternation_enforced() {
        let mut transcript = Transcript::new();
        transcript.push(Speaker::Assistant, "1. Who is it for?").unwrap();
        assert!(transcript.push(Speaker::Assistant, "again").is_err());
        transcript.push(Speaker::User, "Office workers").unwrap();
        assert!(transcript.push(Speaker::User, "again").is_err());
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.next_speaker(), Speaker::Assistant);
    }

    #[test]
    fn test_render() {
        let mut transcript = Transcript::new();
        transcript.push(Speaker::Assistant, "1. Platform?").unwrap();
        transcript.push(Speaker::User, "iOS only").unwrap();

        assert_eq!(transcript.render(), "AI: 1. Platform?\nUser: iOS only");
        assert_eq!(Transcript::new().render(), "");
    }
}
