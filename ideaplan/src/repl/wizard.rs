//! Terminal wizard - one page per step

use std::path::{Path, PathBuf};

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::brainstorm::BrainstormPhase;
use crate::domain::{ModelSelection, PlanType, Speaker};
use crate::history::{SavedPlan, write_markdown};
use crate::llm::{available_cloud_models, list_local_models};
use crate::planner::PlanPhase;
use crate::wizard::{WizardSession, WizardStep};

/// What the main loop does after a step returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Render whatever step the session is on now
    Stay,
    Quit,
}

/// A line of user input, or a navigation command already applied
enum Reply {
    Text(String),
    Nav(Flow),
}

/// Unwrap a text reply or leave the step function
macro_rules! text_or_return {
    ($reply:expr) => {
        match $reply {
            Reply::Text(text) => text,
            Reply::Nav(flow) => return Ok(flow),
        }
    };
}

/// Interactive wizard over a [`WizardSession`]
pub struct WizardRepl {
    session: WizardSession,
    rl: DefaultEditor,
}

impl WizardRepl {
    pub fn new(session: WizardSession) -> Result<Self> {
        let rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        Ok(Self { session, rl })
    }

    /// Run the wizard main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        loop {
            println!();
            println!("{}", format!("== {} ==", self.session.step()).bright_cyan().bold());

            let flow = match self.session.step() {
                WizardStep::Home => self.home()?,
                WizardStep::Configuration => self.configuration().await?,
                WizardStep::IdeaInput => self.idea_input()?,
                WizardStep::Brainstorming => self.brainstorming().await?,
                WizardStep::PlanGenerator => self.plan_generator().await?,
                WizardStep::History => self.history()?,
            };

            if flow == Flow::Quit {
                break;
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "IdeaPlan - from rough idea to implementation plan".bright_cyan().bold());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the wizard", "/quit".yellow());
        println!("  {:14} Go to the previous step", "/back".yellow());
        println!("  {:14} Start over with a new idea", "/new".yellow());
        println!("  {:14} Browse saved plans", "/history".yellow());
        println!();
    }

    /// Read one line; slash commands are handled here
    fn ask(&mut self, label: &str) -> Result<Reply> {
        loop {
            match self.rl.readline(&format!("{} ", label.bright_green())) {
                Ok(line) => {
                    let input = line.trim().to_string();
                    if !input.is_empty() {
                        let _ = self.rl.add_history_entry(input.as_str());
                    }

                    match input.as_str() {
                        "/help" | "/h" => self.print_help(),
                        "/quit" | "/q" | "/exit" => return Ok(Reply::Nav(Flow::Quit)),
                        "/back" | "/b" => {
                            self.session.back();
                            return Ok(Reply::Nav(Flow::Stay));
                        }
                        "/new" | "/n" => {
                            self.session.start_new_idea();
                            return Ok(Reply::Nav(Flow::Stay));
                        }
                        "/history" => {
                            self.session.open_history();
                            return Ok(Reply::Nav(Flow::Stay));
                        }
                        cmd if cmd.starts_with('/') => {
                            println!("{} Unknown command: {}", "?".yellow(), cmd);
                            println!("Type {} for available commands", "/help".yellow());
                        }
                        _ => return Ok(Reply::Text(input)),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    return Ok(Reply::Nav(Flow::Quit));
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            }
        }
    }

    /// Try to move forward, printing why not
    fn advance(&mut self) -> Flow {
        if let Err(e) = self.session.advance() {
            println!("{} {}", "!".yellow(), e);
        }
        Flow::Stay
    }

    fn home(&mut self) -> Result<Flow> {
        println!("Turn a rough idea and an optional sketch into a structured implementation plan.");
        println!();
        println!("  1. Configure a local or cloud model");
        println!("  2. Describe your idea and attach a sketch");
        println!("  3. Answer a few clarifying questions");
        println!("  4. Review, refine and save the generated plan");
        println!();
        text_or_return!(self.ask("Press Enter to begin >")?);
        Ok(self.advance())
    }

    async fn configuration(&mut self) -> Result<Flow> {
        if let Some(selection) = self.session.selection() {
            let status = if self.session.is_verified() {
                "verified".green()
            } else {
                "not verified".yellow()
            };
            println!("Current model: {} [{}]", selection, status);
        }

        let kind = text_or_return!(self.ask("Model type [local/cloud] (Enter keeps current) >")?);
        let selection = match kind.to_lowercase().as_str() {
            "" if self.session.is_verified() => return Ok(self.advance()),
            "" => {
                println!("{} Choose a model type first", "!".yellow());
                return Ok(Flow::Stay);
            }
            "local" | "l" => {
                let models = list_local_models(&self.session.config().local).await;
                if models.is_empty() {
                    println!(
                        "{} No local models found. Make sure the model server is running at {}",
                        "!".yellow(),
                        self.session.config().local.base_url
                    );
                }
                let model = text_or_return!(self.choose("Local model", &models)?);
                ModelSelection::Local { model }
            }
            "cloud" | "c" => {
                let catalogue: Vec<String> = available_cloud_models().into_iter().map(String::from).collect();
                let model = text_or_return!(self.choose("Cloud model", &catalogue)?);

                let env = self.session.config().cloud.api_key_env.clone();
                let key = text_or_return!(self.ask(&format!("API key (Enter to use ${}) >", env))?);
                let api_key = if key.is_empty() {
                    match self.session.config().validate_cloud_key() {
                        Ok(key) => key,
                        Err(e) => {
                            println!("{} {}", "!".yellow(), e);
                            return Ok(Flow::Stay);
                        }
                    }
                } else {
                    key
                };
                ModelSelection::Cloud { model, api_key }
            }
            other => {
                println!("{} Unknown model type: {}", "!".yellow(), other);
                return Ok(Flow::Stay);
            }
        };

        if let Err(e) = self.session.select_model(selection) {
            println!("{} {}", "!".red(), e);
            return Ok(Flow::Stay);
        }

        println!("{}", "Verifying connection...".dimmed());
        if self.session.verify().await {
            println!("{} Successfully connected", "✓".green());
            Ok(self.advance())
        } else {
            println!("{} Failed to connect to the selected model", "✗".red());
            Ok(Flow::Stay)
        }
    }

    /// Pick from a numbered list, or type a name directly
    fn choose(&mut self, label: &str, options: &[String]) -> Result<Reply> {
        for (i, option) in options.iter().enumerate() {
            println!("  {:>2}. {}", i + 1, option);
        }
        loop {
            let input = match self.ask(&format!("{} >", label))? {
                Reply::Text(text) => text,
                nav => return Ok(nav),
            };
            if input.is_empty() {
                continue;
            }
            let chosen = match input.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => options[n - 1].clone(),
                _ => input,
            };
            return Ok(Reply::Text(chosen));
        }
    }

    fn idea_input(&mut self) -> Result<Flow> {
        let current = self.session.context().idea_description.clone();
        if !current.is_empty() {
            println!("Current idea: {}", current.dimmed());
        }
        let mut idea = text_or_return!(self.ask("Describe your idea (Enter keeps current) >")?);
        if idea.is_empty() {
            idea = current;
        }

        let presets = PlanType::presets();
        let mut labels: Vec<String> = presets.iter().map(|p| p.label().to_string()).collect();
        labels.push(PlanType::OTHER_LABEL.to_string());
        let choice = text_or_return!(self.choose("Plan type", &labels)?);
        let plan_type = if choice == PlanType::OTHER_LABEL {
            let custom = text_or_return!(self.ask("Specify plan type >")?);
            PlanType::Other(custom)
        } else {
            PlanType::parse(&choice)
        };

        let image = text_or_return!(self.ask("Sketch image path (jpg/png/pdf, Enter to skip) >")?);

        if let Err(e) = self.session.commit_idea(&idea, plan_type) {
            println!("{} {}", "!".yellow(), e);
            return Ok(Flow::Stay);
        }
        if !image.is_empty()
            && let Err(e) = self.session.attach_image_file(Path::new(&image))
        {
            println!("{} {}", "!".yellow(), e);
            return Ok(Flow::Stay);
        }

        Ok(self.advance())
    }

    fn print_turn(&self, speaker: Speaker, text: &str) {
        match speaker {
            Speaker::Assistant => println!("{}\n{}\n", "AI:".bright_blue().bold(), text),
            Speaker::User => println!("{} {}\n", "You:".bright_green().bold(), text),
        }
    }

    async fn brainstorming(&mut self) -> Result<Flow> {
        let ctx = self.session.context();
        println!("{} {}", "Idea:".bold(), ctx.idea_description);
        println!("{} {}", "Plan type:".bold(), ctx.plan_type_label());
        if let Some(selection) = self.session.selection() {
            println!("{} {}", "Model:".bold(), selection);
        }
        println!();

        // Replay the dialogue so far, leaving any pending question for the loop
        let engine = self.session.engine();
        let shown = match engine.phase() {
            BrainstormPhase::AwaitingUserAnswer => engine.transcript().len().saturating_sub(1),
            _ => engine.transcript().len(),
        };
        for turn in &engine.transcript().turns()[..shown] {
            self.print_turn(turn.speaker, &turn.text);
        }

        loop {
            match self.session.engine().phase() {
                BrainstormPhase::NotStarted | BrainstormPhase::AwaitingModelQuestion => {
                    println!("{}", "Thinking...".dimmed());
                    if let Err(e) = self.session.brainstorm_step().await {
                        println!("{} {}", "!".red(), e);
                        self.session.back();
                        return Ok(Flow::Stay);
                    }
                }
                BrainstormPhase::AwaitingUserAnswer => {
                    let question = self.session.engine().pending_question().unwrap_or_default().to_string();
                    self.print_turn(Speaker::Assistant, &question);

                    loop {
                        let answer = text_or_return!(self.ask("Your response >")?);
                        match self.session.answer(&answer) {
                            Ok(()) => break,
                            Err(e) => println!("{} {}", "!".yellow(), e),
                        }
                    }
                }
                BrainstormPhase::Complete => {
                    println!(
                        "{} Brainstorming complete! Enough information has been gathered to generate your plan.",
                        "✓".green()
                    );
                    text_or_return!(self.ask("Press Enter to generate the plan >")?);
                    return Ok(self.advance());
                }
            }
        }
    }

    async fn plan_generator(&mut self) -> Result<Flow> {
        loop {
            if self.session.planner().phase() == PlanPhase::NoPlan {
                println!(
                    "{}",
                    format!(
                        "Generating implementation plan (iteration {})...",
                        self.session.planner().iteration() + 1
                    )
                    .dimmed()
                );
                if let Err(e) = self.session.generate_plan().await {
                    println!("{} {}", "!".red(), e);
                    self.session.back();
                    return Ok(Flow::Stay);
                }
            }

            let planner = self.session.planner();
            println!();
            println!(
                "{}",
                format!("Implementation Plan (Iteration {})", planner.iteration()).bright_cyan()
            );
            println!();
            println!("{}", planner.generated_text().unwrap_or_default());
            println!();
            println!(
                "  {} refine with feedback   {} save & view history   {} export markdown   {} new idea",
                "[f]".yellow(),
                "[s]".yellow(),
                "[e]".yellow(),
                "[n]".yellow()
            );

            let action = text_or_return!(self.ask("Action >")?);
            match action.to_lowercase().as_str() {
                "f" | "feedback" => {
                    let feedback = text_or_return!(self.ask("What would you like to change? >")?);
                    if let Err(e) = self.session.submit_feedback(&feedback) {
                        println!("{} {}", "!".yellow(), e);
                    }
                }
                "s" | "save" => {
                    match self.session.save_plan() {
                        Ok(path) => println!("{} Plan saved to {}", "✓".green(), path.display()),
                        Err(e) => println!("{} {}", "!".red(), e),
                    }
                    self.session.open_history();
                    return Ok(Flow::Stay);
                }
                "e" | "export" => {
                    let dir = std::env::current_dir()?;
                    match self.session.export_plan(&dir) {
                        Ok(path) => println!("{} Plan exported to {}", "✓".green(), path.display()),
                        Err(e) => println!("{} {}", "!".red(), e),
                    }
                }
                "n" | "new" => {
                    self.session.start_new_idea();
                    return Ok(Flow::Stay);
                }
                other => println!("{} Unknown action: {}", "?".yellow(), other),
            }
        }
    }

    fn history(&mut self) -> Result<Flow> {
        let listing = match self.session.store().list() {
            Ok(listing) => listing,
            Err(e) => {
                println!("{} {}", "!".red(), e);
                return Ok(Flow::Quit);
            }
        };
        for error in &listing.errors {
            println!("{} {}", "!".yellow(), error);
        }

        if listing.plans.is_empty() {
            println!("{}", "No saved plans found. Generate and save a plan to see it here.".dimmed());
        }
        for (i, plan) in listing.plans.iter().enumerate() {
            println!("  {:>2}. {}", i + 1, plan.summary());
        }
        println!();

        let input = text_or_return!(self.ask("Plan number, [n] new idea, [q] quit >")?);
        match input.to_lowercase().as_str() {
            "n" | "new" => {
                self.session.start_new_idea();
                Ok(Flow::Stay)
            }
            "q" | "quit" => Ok(Flow::Quit),
            "" => Ok(Flow::Stay),
            other => match other.parse::<usize>() {
                Ok(n) if (1..=listing.plans.len()).contains(&n) => self.show_plan(&listing.plans[n - 1]),
                _ => {
                    println!("{} Unknown selection: {}", "?".yellow(), other);
                    Ok(Flow::Stay)
                }
            },
        }
    }

    fn show_plan(&mut self, plan: &SavedPlan) -> Result<Flow> {
        println!();
        println!("{} {}", "Created:".bold(), plan.timestamp_text());
        println!("{} {}", "Plan Type:".bold(), plan.plan_type);
        println!("{} {}", "Idea:".bold(), plan.idea);
        println!("{} {}", "Iteration:".bold(), plan.iteration);
        println!();
        println!("{}", plan.plan);
        println!();

        let action = text_or_return!(self.ask("[e] export, [d] delete, Enter to return >")?);
        match action.to_lowercase().as_str() {
            "e" | "export" => {
                let default = plan.export_filename();
                let name = text_or_return!(self.ask(&format!("Filename [{}] >", default))?);
                let path = if name.is_empty() { PathBuf::from(default) } else { PathBuf::from(name) };
                match write_markdown(&path, &plan.plan) {
                    Ok(()) => println!("{} Plan exported to {}", "✓".green(), path.display()),
                    Err(e) => println!("{} {}", "!".red(), e),
                }
            }
            "d" | "delete" => match self.session.store().delete(&plan.filename) {
                Ok(()) => println!("{} Plan deleted", "✓".green()),
                Err(e) => println!("{} {}", "!".red(), e),
            },
            _ => {}
        }
        Ok(Flow::Stay)
    }
}
