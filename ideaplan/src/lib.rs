//! IdeaPlan - from rough idea to implementation plan
//!
//! A guided wizard: pick a local or cloud model, describe an idea (optionally
//! with a sketch), answer the model's clarifying questions, then generate and
//! refine a structured implementation plan and keep it in a plan history.
//!
//! # Architecture
//!
//! ```text
//! repl / cli ──► wizard::WizardSession
//!                  ├── brainstorm::ConversationEngine ─┐
//!                  ├── planner::PlanController ────────┼──► prompts::PromptAssembler
//!                  │                                   └──► llm::ModelBackend (local | cloud)
//!                  └── history::PlanStore (JSON files)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ideaplan::config::Config;
//! use ideaplan::domain::{ModelSelection, PlanType};
//! use ideaplan::wizard::WizardSession;
//!
//! let mut session = WizardSession::new(Config::default());
//! session.select_model(ModelSelection::Local { model: "llama3".into() })?;
//! session.verify().await;
//! session.commit_idea("Track water intake", PlanType::AppDevelopment)?;
//! session.brainstorm_step().await?;
//! ```

pub mod brainstorm;
pub mod cli;
pub mod config;
pub mod domain;
pub mod history;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod repl;
pub mod wizard;

pub use config::Config;
pub use wizard::{WizardSession, WizardStep};
