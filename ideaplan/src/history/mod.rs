//! Saved plan history

mod store;

pub use store::{HistoryError, PlanListing, PlanStore, SavedPlan, write_markdown};
