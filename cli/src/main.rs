//! intake CLI - validate and submit the site's forms, and manage drafts.
//!
//! ```text
//! intake validate quote --set firstName=Jane --check technologies:react
//! intake submit contact --file message.json
//! intake draft show
//! ```
//!
//! Settings come from `~/.intake/config.toml` (see `intake-config`); logs go
//! to stderr, filtered by `RUST_LOG`.

mod input;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use intake_config::IntakeConfig;
use intake_core::validate::TEXTAREA_MAX_CHARS;
use intake_core::{CharacterCount, CounterLevel, FormKind, PayloadOptions, Validator};
use intake_engine::{
    Autosave, DraftStore, FileDraftStore, FormEvent, SubmissionController, event_channel,
};
use intake_transport::HttpTransport;
use intake_types::FieldKind;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::input::FormInput;

#[derive(Parser)]
#[command(name = "intake", version)]
#[command(about = "Validate and submit contact and quote forms")]
struct Cli {
    /// Config file to use instead of ~/.intake/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check field values without sending anything
    Validate {
        #[command(flatten)]
        input: FormInput,
    },
    /// Validate and send a form to the backend
    Submit {
        #[command(flatten)]
        input: FormInput,
        /// Backend base URL, overriding the config
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
        /// Neither restore nor save a draft
        #[arg(long)]
        no_draft: bool,
    },
    /// Inspect or manage a form's saved draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
}

#[derive(Subcommand)]
enum DraftAction {
    /// Print the saved draft as JSON
    Show {
        #[arg(default_value = "quote")]
        form: FormKind,
    },
    /// Save field values as the form's draft
    Save {
        #[command(flatten)]
        input: FormInput,
    },
    /// Delete the saved draft
    Clear {
        #[arg(default_value = "quote")]
        form: FormKind,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<IntakeConfig> {
    match path {
        Some(path) => IntakeConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(IntakeConfig::load()
            .context("failed to load ~/.intake/config.toml")?
            .unwrap_or_default()),
    }
}

fn validator(config: &IntakeConfig) -> Result<Validator> {
    let rule = config.phone_rule()?;
    Ok(Validator::new(Arc::new(rule)))
}

fn draft_store(config: &IntakeConfig) -> Result<FileDraftStore> {
    let dir = config
        .draft_dir()
        .context("no home directory found; set [autosave] dir in the config")?;
    Ok(FileDraftStore::new(dir))
}

fn draft_key(form: FormKind) -> Result<&'static str> {
    match form.draft_key() {
        Some(key) => Ok(key),
        None => bail!("the {form} form does not keep drafts"),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Validate { input } => run_validate(&config, &input),
        Commands::Submit {
            input,
            base_url,
            no_draft,
        } => run_submit(&config, &input, base_url, no_draft).await,
        Commands::Draft { action } => run_draft(&config, action),
    }
}

fn run_validate(config: &IntakeConfig, input: &FormInput) -> Result<ExitCode> {
    let validator = validator(config)?;
    let mut model = input.form.model();
    let values = input.to_payload(&model)?;
    model.restore(&values);

    let errors = model.validate_all(&validator);

    for field in model.fields() {
        if field.kind() == FieldKind::Phone && !field.is_empty() {
            let formatted = validator.phone_rule().format(field.raw_value());
            println!("{}: {formatted}", field.id());
        }
        if field.kind() == FieldKind::Textarea && !field.is_empty() {
            let count = CharacterCount::measure(field.raw_value(), TEXTAREA_MAX_CHARS);
            let note = match count.level() {
                CounterLevel::Normal => "",
                CounterLevel::Warning => " (near limit)",
                CounterLevel::Over => " (over limit)",
            };
            println!("{}: {}{note}", field.id(), count.label());
        }
    }
    println!(
        "{} form: {}% of required fields filled",
        input.form,
        model.progress_percent()
    );

    if errors.is_empty() {
        println!("All fields are valid.");
        return Ok(ExitCode::SUCCESS);
    }
    for error in &errors {
        println!("  {}: {}", error.field, error.message);
    }
    Ok(ExitCode::FAILURE)
}

async fn run_submit(
    config: &IntakeConfig,
    input: &FormInput,
    base_url: Option<String>,
    no_draft: bool,
) -> Result<ExitCode> {
    let form = input.form;
    let mut transport_config = config.transport_config();
    if let Some(url) = base_url {
        transport_config.base_url = url;
    }
    let transport =
        HttpTransport::new(transport_config).context("failed to configure HTTP transport")?;

    let (events, rx) = event_channel();
    let printer = tokio::spawn(print_events(rx));

    let mut controller = SubmissionController::new(form, transport, events)
        .with_validator(validator(config)?)
        .with_timeout(config.submit_timeout());

    let use_draft = !no_draft && config.autosave_enabled();
    if use_draft && let Some(key) = form.draft_key() {
        let autosave =
            Autosave::new(Arc::new(draft_store(config)?), key).with_debounce(config.debounce());
        controller = controller.with_autosave(autosave);
        if let Err(e) = controller.restore_draft() {
            tracing::warn!("Ignoring unreadable draft: {e}");
        }
    }

    let values = input.to_payload(&controller.snapshot())?;
    controller.prefill(&values);

    let result = controller.submit().await;
    if result.is_err()
        && let Err(e) = controller.save_draft()
    {
        tracing::warn!("Failed to save draft: {e}");
    }

    // Dropping the controller closes the event channel.
    drop(controller);
    let _ = printer.await;

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!(kind = %e.kind(), "Submission failed: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<FormEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            FormEvent::InProgress => eprintln!("Sending..."),
            FormEvent::InProgressCleared => {}
            FormEvent::FieldErrors(errors) => {
                for error in errors {
                    eprintln!("  {}: {}", error.field, error.message);
                }
            }
            FormEvent::Succeeded { message } => println!("{message}"),
            FormEvent::Failed { message, .. } => eprintln!("Error: {message}"),
            FormEvent::DraftSaved => eprintln!("Draft saved"),
            FormEvent::DraftRestored { fields } => {
                eprintln!("Restored draft ({fields} fields)");
            }
        }
    }
}

fn run_draft(config: &IntakeConfig, action: DraftAction) -> Result<ExitCode> {
    let store = draft_store(config)?;
    match action {
        DraftAction::Show { form } => {
            let key = draft_key(form)?;
            match store.load(key)? {
                Some(draft) => println!("{}", serde_json::to_string_pretty(&draft)?),
                None => println!("No draft saved for the {form} form."),
            }
        }
        DraftAction::Save { input } => {
            let key = draft_key(input.form)?;
            let mut model = input.form.model();
            let values = input.to_payload(&model)?;
            model.restore(&values);
            store.save(key, &model.to_payload(PayloadOptions::default()))?;
            println!("Draft saved ({}% complete).", model.progress_percent());
        }
        DraftAction::Clear { form } => {
            store.remove(draft_key(form)?)?;
            println!("Draft cleared.");
        }
    }
    Ok(ExitCode::SUCCESS)
}
