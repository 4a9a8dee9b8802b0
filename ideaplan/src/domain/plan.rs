//! Plan record - the artifact of one completed plan generation

use chrono::{Local, NaiveDateTime, Timelike};

/// Timestamp format used when plans are persisted and listed
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Snapshot of a generated plan, handed to the history store on save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRecord {
    pub idea_description: String,
    pub plan_type: String,
    pub generated_text: String,
    /// Generation count, starting at 1
    pub iteration: u32,
    pub feedback_history: Vec<String>,
    pub created_at: NaiveDateTime,
}

impl PlanRecord {
    /// Create a record stamped with the current local time (second precision)
    pub fn new(
        idea_description: impl Into<String>,
        plan_type: impl Into<String>,
        generated_text: impl Into<String>,
        iteration: u32,
        feedback_history: Vec<String>,
    ) -> Self {
        let now = Local::now().naive_local();
        Self {
            idea_description: idea_description.into(),
            plan_type: plan_type.into(),
            generated_text: generated_text.into(),
            iteration,
            feedback_history,
            created_at: now.with_nanosecond(0).unwrap_or(now),
        }
    }

    pub fn timestamp(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Suggested file name when exporting the current plan as Markdown
    pub fn export_filename(&self) -> String {
        format!("implementation_plan_{}.md", self.created_at.format("%Y%m%d_%H%M%S"))
    }
}
