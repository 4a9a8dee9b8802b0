//! Planning wizard session and step gating

mod session;

pub use session::{WizardSession, WizardStep};
