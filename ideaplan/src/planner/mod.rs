//! Plan generation and feedback loop

mod controller;

pub use controller::{PlanController, PlanPhase};
