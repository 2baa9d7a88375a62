use anyhow::Result;
use atelier_application::VolleyOrchestrator;
use atelier_core::config::AtelierConfig;
use atelier_core::notify::ProgressNotifier;
use atelier_infrastructure::{AtelierPaths, JsonHistoryRepository, SecretStore};
use atelier_interaction::{
    HttpGenerationTransport, HttpIntentClassifier, HttpPromptRewriter, ResilientGenerationClient,
    builtin_detectors,
};
use clap::Parser;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(about = "Atelier - conversational image generation sessions", long_about = None)]
struct Cli {
    /// User whose session to continue
    #[arg(short, long, default_value = "default")]
    user: String,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Prints progress messages (backoff notices, turn summaries) dimmed.
struct TerminalNotifier;

impl ProgressNotifier for TerminalNotifier {
    fn notify(&self, message: &str) {
        println!("{}", message.dimmed());
    }
}

fn build_orchestrator(config: AtelierConfig) -> Result<VolleyOrchestrator> {
    let secrets = SecretStore::default_location()?.load()?;
    let history = Arc::new(JsonHistoryRepository::default_location()?);

    let mut classifier = HttpIntentClassifier::new(&config.services.classifier_url);
    if let Some(key) = secrets.classifier_key() {
        classifier = classifier.with_api_key(key);
    }

    let mut rewriter = HttpPromptRewriter::new(&config.services.rewriter_url);
    if let Some(key) = &secrets.api_key {
        rewriter = rewriter.with_api_key(key);
    }

    let mut transport = HttpGenerationTransport::new(
        &config.services.generation_url,
        config.generation.width,
        config.generation.height,
        config.generation.image_count,
    );
    if let Some(key) = &secrets.api_key {
        transport = transport.with_api_key(key);
    }

    Ok(VolleyOrchestrator::new(
        config,
        builtin_detectors()?,
        history,
        Arc::new(classifier),
        Arc::new(rewriter),
        ResilientGenerationClient::new(Arc::new(transport)),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => AtelierPaths::config_file()?,
    };
    let config = AtelierConfig::load_or_default(&config_path)?;
    let orchestrator = build_orchestrator(config)?;

    println!("{}", "atelier".bold());
    println!("Describe what to create. Type 'exit' to quit.\n");

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                let _ = editor.add_history_entry(line);

                match orchestrator
                    .process_turn(&cli.user, line, &TerminalNotifier)
                    .await
                {
                    Ok(outcome) => {
                        for url in &outcome.image_urls {
                            println!("{}", url.blue().underline());
                        }
                        println!();
                    }
                    Err(err) => {
                        eprintln!("{} {}", "error:".red().bold(), err);
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
