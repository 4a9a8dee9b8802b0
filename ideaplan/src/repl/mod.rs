//! Interactive terminal wizard for IdeaPlan
//!
//! Walks the user through configuration, idea input, brainstorming, plan
//! generation and history, with slash commands for navigation.

mod wizard;

pub use wizard::WizardRepl;

use std::path::PathBuf;

use colored::Colorize;
use eyre::Result;
use tracing::info;

use crate::config::Config;
use crate::domain::{ModelSelection, PlanType};
use crate::wizard::{WizardSession, WizardStep};

/// Values supplied on the command line to skip wizard pages
#[derive(Debug, Default)]
pub struct WizardOptions {
    pub selection: Option<ModelSelection>,
    pub idea: Option<String>,
    pub plan_type: Option<PlanType>,
    pub image: Option<PathBuf>,
}

/// Run the interactive wizard
///
/// This is the main entry point for `ideaplan wizard`.
pub async fn run_wizard(config: Config, options: WizardOptions) -> Result<()> {
    let mut session = WizardSession::new(config);
    prefill(&mut session, options).await?;

    let mut repl = WizardRepl::new(session)?;
    repl.run().await
}

/// Apply command-line values, advancing past every page they complete
async fn prefill(session: &mut WizardSession, options: WizardOptions) -> Result<()> {
    if let Some(selection) = options.selection {
        session
            .select_model(selection)
            .map_err(|e| eyre::eyre!("Failed to create model backend: {}", e))?;
        println!("{}", "Verifying connection...".dimmed());
        if !session.verify().await {
            println!("{} Failed to connect to the selected model", "✗".red());
            session.advance()?;
            return Ok(());
        }
        session.advance()?;
        session.advance()?;
    }

    if let (Some(idea), Some(plan_type)) = (options.idea, options.plan_type) {
        session.commit_idea(&idea, plan_type)?;
        if let Some(image) = options.image {
            session.attach_image_file(&image)?;
        }
        if session.step() == WizardStep::IdeaInput {
            session.advance()?;
        }
    }

    info!(step = %session.step(), "Wizard starting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_prefill_idea_without_model_stays_home() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.plans_dir = temp.path().to_path_buf();
        let mut session = WizardSession::new(config);

        let options = WizardOptions {
            idea: Some("Track water intake".to_string()),
            plan_type: Some(PlanType::AppDevelopment),
            ..Default::default()
        };
        prefill(&mut session, options).await.unwrap();

        assert_eq!(session.step(), WizardStep::Home);
        assert!(session.context().is_ready());
    }

    #[tokio::test]
    async fn test_prefill_with_verified_backend_skips_to_idea_input() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.plans_dir = temp.path().to_path_buf();
        let mut session = WizardSession::new(config);
        session.set_backend(
            ModelSelection::Local {
                model: "llama3".to_string(),
            },
            Arc::new(MockBackend::texts(&[])),
        );
        assert!(session.verify().await);
        session.advance().unwrap();
        session.advance().unwrap();

        let options = WizardOptions {
            idea: Some("Track water intake".to_string()),
            plan_type: Some(PlanType::AppDevelopment),
            ..Default::default()
        };
        prefill(&mut session, options).await.unwrap();

        assert_eq!(session.step(), WizardStep::Brainstorming);
    }
}
