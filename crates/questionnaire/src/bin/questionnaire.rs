//! Terminal front end: fill in a questionnaire or administer stored
//! submissions.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use questionnaire::{
    AdminView, Advance, HttpSubmissionGateway, Navigation, Phase, Prompter, Wizard, WizardError,
};

#[derive(Debug, Parser)]
#[command(name = "questionnaire", version, about)]
struct Cli {
    /// Root URL of the intake service.
    #[arg(
        long,
        env = "QUESTIONNAIRE_API_URL",
        default_value = "http://localhost:3001",
        global = true
    )]
    api_url: String,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Walk through the questionnaire and submit it (the default).
    Fill,
    /// List stored submissions, newest first.
    List {
        /// Print every submission in full.
        #[arg(long)]
        details: bool,
    },
    /// Print one submission in full.
    Show {
        /// Submission identifier.
        id: u64,
    },
    /// Delete a submission and its attachments.
    Delete {
        /// Submission identifier.
        id: u64,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.verbose) {
        // Logging is unavailable, so stderr is the only channel left.
        if writeln!(io::stderr().lock(), "questionnaire: {err:#}").is_err() {
            return ExitCode::FAILURE;
        }
    }
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("{err:#}");
            error!(error = %message, "questionnaire failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!("failed to initialise tracing: {err}"))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let gateway = HttpSubmissionGateway::new(&cli.api_url)
        .with_context(|| format!("cannot use service URL '{}'", cli.api_url))?;
    match cli.command.unwrap_or(Command::Fill) {
        Command::Fill => fill(&gateway).await,
        Command::List { details } => list(&gateway, details).await,
        Command::Show { id } => show(&gateway, id).await,
        Command::Delete { id, yes } => delete(&gateway, id, yes).await,
    }
}

async fn fill(gateway: &HttpSubmissionGateway) -> anyhow::Result<()> {
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
    let mut wizard = Wizard::new();
    loop {
        match wizard.phase() {
            Phase::Editing(step) => {
                if let Some(message) = wizard.last_error() {
                    prompter.say(&format!("Submission failed: {message}"))?;
                }
                match prompter.edit_step(step, wizard.answers_mut())? {
                    Navigation::Next => match wizard.advance(gateway).await {
                        Ok(Advance::Submitted(id)) => prompter.say(&format!(
                            "Thank you. Your questionnaire was received as submission #{id}."
                        ))?,
                        Ok(Advance::Moved(_) | Advance::InFlight | Advance::Finished)
                        | Err(WizardError::Submission(_)) => {}
                        Err(err @ WizardError::NotSubmitting) => return Err(err.into()),
                    },
                    Navigation::Previous => {
                        wizard.previous();
                    }
                    Navigation::Quit => return Ok(()),
                }
            }
            Phase::Submitted { .. } => {
                if prompter.confirm("Fill in another questionnaire?")? {
                    wizard.reset();
                } else {
                    return Ok(());
                }
            }
            Phase::Submitting => bail!("a submission is still in flight"),
        }
    }
}

async fn list(gateway: &HttpSubmissionGateway, details: bool) -> anyhow::Result<()> {
    let mut view = AdminView::new(gateway.base_url());
    view.refresh(gateway)
        .await
        .context("failed to fetch submissions")?;
    let mut out = io::stdout().lock();
    write!(out, "{}", view.render_table())?;
    if details {
        for record in view.records() {
            writeln!(out)?;
            write!(out, "{}", view.render_detail(record))?;
        }
    }
    Ok(())
}

async fn show(gateway: &HttpSubmissionGateway, id: u64) -> anyhow::Result<()> {
    let mut view = AdminView::new(gateway.base_url());
    view.refresh(gateway)
        .await
        .context("failed to fetch submissions")?;
    view.toggle(id);
    let detail = view
        .render_expanded()
        .with_context(|| format!("no submission with id {id}"))?;
    write!(io::stdout().lock(), "{detail}")?;
    Ok(())
}

async fn delete(gateway: &HttpSubmissionGateway, id: u64, yes: bool) -> anyhow::Result<()> {
    if !yes {
        let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
        let question = format!("Delete submission #{id} and its attachments?");
        if !prompter.confirm(&question)? {
            prompter.say("Nothing deleted.")?;
            return Ok(());
        }
    }
    let mut view = AdminView::new(gateway.base_url());
    view.delete(gateway, id)
        .await
        .with_context(|| format!("failed to delete submission {id}"))?;
    let mut out = io::stdout().lock();
    writeln!(out, "Deleted submission #{id}.")?;
    write!(out, "{}", view.render_table())?;
    Ok(())
}
