//! IdeaPlan - guided idea-to-plan wizard
//!
//! CLI entry point for the interactive wizard and the non-interactive
//! model and history commands.

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use ideaplan::cli::{Cli, Command, HistoryCommand, ModelArgs, generate_after_help};
use ideaplan::config::Config;
use ideaplan::domain::PlanType;
use ideaplan::history::{PlanStore, write_markdown};
use ideaplan::llm::{available_cloud_models, create_backend, list_local_models};
use ideaplan::repl::{WizardOptions, run_wizard};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ideaplan")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("ideaplan.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => cmd_wizard(config, ModelArgs::default(), None, None, None).await,
        Some(Command::Wizard {
            model,
            idea,
            plan_type,
            image,
        }) => cmd_wizard(config, model, idea, plan_type, image).await,
        Some(Command::Models) => cmd_models(&config).await,
        Some(Command::Probe { model }) => cmd_probe(&config, &model).await,
        Some(Command::History { command }) => cmd_history(&config, command),
    }
}

async fn cmd_wizard(
    config: Config,
    model: ModelArgs,
    idea: Option<String>,
    plan_type: Option<String>,
    image: Option<PathBuf>,
) -> Result<()> {
    let options = WizardOptions {
        selection: model.selection(&config)?,
        idea,
        plan_type: plan_type.as_deref().map(PlanType::parse),
        image,
    };
    run_wizard(config, options).await
}

async fn cmd_models(config: &Config) -> Result<()> {
    println!("{}", "Local models:".bright_cyan());
    let local = list_local_models(&config.local).await;
    if local.is_empty() {
        println!(
            "  {}",
            format!("No local models found. Make sure the model server is running at {}", config.local.base_url)
                .dimmed()
        );
    }
    for model in local {
        println!("  {}", model);
    }

    println!();
    println!("{}", "Cloud models:".bright_cyan());
    for model in available_cloud_models() {
        println!("  {}", model);
    }
    Ok(())
}

async fn cmd_probe(config: &Config, model: &ModelArgs) -> Result<()> {
    let selection = model
        .selection(config)?
        .ok_or_else(|| eyre::eyre!("Specify --local MODEL or --cloud MODEL"))?;
    let backend = create_backend(&selection, config).map_err(|e| eyre::eyre!("Failed to create backend: {}", e))?;

    if backend.probe().await {
        println!("{} Successfully connected to {}", "✓".green(), selection);
        Ok(())
    } else {
        Err(eyre::eyre!("Failed to connect to {}", selection))
    }
}

fn cmd_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let store = PlanStore::new(config.storage.plans_dir.clone());

    match command {
        HistoryCommand::List => {
            let listing = store.list()?;
            for error in &listing.errors {
                eprintln!("{} {}", "!".yellow(), error);
            }
            if listing.plans.is_empty() {
                println!("No saved plans found in {}", store.dir().display());
            }
            for plan in &listing.plans {
                println!("{}  {}", plan.filename.bold(), plan.summary());
            }
        }
        HistoryCommand::Show { file } => {
            let plan = store.load(&file)?;
            println!("{} {}", "Created:".bold(), plan.timestamp_text());
            println!("{} {}", "Plan Type:".bold(), plan.plan_type);
            println!("{} {}", "Idea:".bold(), plan.idea);
            println!("{} {}", "Iteration:".bold(), plan.iteration);
            println!();
            println!("{}", plan.plan);
        }
        HistoryCommand::Delete { file } => {
            store.delete(&file)?;
            println!("Deleted {}", file);
        }
        HistoryCommand::Export { file, output } => {
            let plan = store.load(&file)?;
            let path = output.unwrap_or_else(|| PathBuf::from(plan.export_filename()));
            write_markdown(&path, &plan.plan)?;
            println!("Exported to {}", path.display());
        }
    }
    Ok(())
}
