//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use eyre::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::domain::ModelSelection;

/// IdeaPlan - turn a rough idea into an implementation plan
#[derive(Parser)]
#[command(
    name = "ideaplan",
    about = "Guided wizard that turns a rough idea and a sketch into an implementation plan",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the interactive planning wizard (default)
    Wizard {
        #[command(flatten)]
        model: ModelArgs,

        /// Idea description
        #[arg(long)]
        idea: Option<String>,

        /// Plan type (e.g. "App Development", or any custom text)
        #[arg(long = "plan-type", value_name = "TYPE")]
        plan_type: Option<String>,

        /// Sketch to analyse (jpg, png or pdf)
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
    },

    /// List installed local models and the cloud catalogue
    Models,

    /// Check connectivity to a model
    Probe {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Browse saved plans
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// History subcommands
#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List saved plans, newest first
    List,

    /// Print a saved plan
    Show {
        /// Plan file name as shown by `history list`
        file: String,
    },

    /// Delete a saved plan
    Delete {
        /// Plan file name as shown by `history list`
        file: String,
    },

    /// Export a saved plan as Markdown
    Export {
        /// Plan file name as shown by `history list`
        file: String,

        /// Output path (defaults to plan_<idea>_<date>.md)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Model selection flags
#[derive(Debug, Clone, Default, Args)]
pub struct ModelArgs {
    /// Use a model from the local model server
    #[arg(long, value_name = "MODEL", conflicts_with = "cloud")]
    pub local: Option<String>,

    /// Use a cloud model
    #[arg(long, value_name = "MODEL")]
    pub cloud: Option<String>,

    /// API key for the cloud model (defaults to the configured environment variable)
    #[arg(long = "api-key", value_name = "KEY", requires = "cloud", conflicts_with = "local")]
    pub api_key: Option<String>,
}

impl ModelArgs {
    /// Resolve the flags into a selection, looking up the API key if needed
    pub fn selection(&self, config: &Config) -> Result<Option<ModelSelection>> {
        debug!(local = ?self.local, cloud = ?self.cloud, "ModelArgs::selection: called");
        match (&self.local, &self.cloud) {
            (Some(model), _) => Ok(Some(ModelSelection::Local { model: model.clone() })),
            (None, Some(model)) => {
                let api_key = match &self.api_key {
                    Some(key) => key.clone(),
                    None => config.validate_cloud_key()?,
                };
                Ok(Some(ModelSelection::Cloud {
                    model: model.clone(),
                    api_key,
                }))
            }
            (None, None) => Ok(None),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ideaplan")
        .join("logs")
        .join("ideaplan.log")
}

/// Help footer showing where logs are written
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}\n", get_log_path().display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["ideaplan"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_wizard() {
        let cli = Cli::try_parse_from([
            "ideaplan",
            "wizard",
            "--local",
            "llama3",
            "--idea",
            "Track water intake",
            "--plan-type",
            "App Development",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Wizard {
                model, idea, plan_type, ..
            }) => {
                assert_eq!(model.local.as_deref(), Some("llama3"));
                assert_eq!(idea.as_deref(), Some("Track water intake"));
                assert_eq!(plan_type.as_deref(), Some("App Development"));
            }
            _ => panic!("expected wizard command"),
        }
    }

    #[test]
    fn test_local_and_cloud_conflict() {
        assert!(Cli::try_parse_from(["ideaplan", "probe", "--local", "a", "--cloud", "b"]).is_err());
        assert!(Cli::try_parse_from(["ideaplan", "probe", "--local", "a", "--api-key", "k"]).is_err());
    }

    #[test]
    fn test_parse_history_export() {
        let cli = Cli::try_parse_from(["ideaplan", "history", "export", "plan_x.json", "-o", "out.md"]).unwrap();
        match cli.command {
            Some(Command::History {
                command: HistoryCommand::Export { file, output },
            }) => {
                assert_eq!(file, "plan_x.json");
                assert_eq!(output, Some(PathBuf::from("out.md")));
            }
            _ => panic!("expected history export"),
        }
    }

    #[test]
    fn test_model_args_selection() {
        let config = Config::default();

        let args = ModelArgs {
            local: Some("llama3".to_string()),
            ..Default::default()
        };
        assert_eq!(
            args.selection(&config).unwrap(),
            Some(ModelSelection::Local {
                model: "llama3".to_string()
            })
        );

        let args = ModelArgs {
            cloud: Some("gpt-4o".to_string()),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert_eq!(args.selection(&config).unwrap().unwrap().kind(), "cloud");

        assert_eq!(ModelArgs::default().selection(&config).unwrap(), None);
    }
}
