use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use policyqa::{PolicyQaConfig, QueryEngine};

const SELF_TEST_QUESTION: &str = "What is the current status of Air India?";

#[derive(Parser, Debug)]
#[command(name = "policyqa", version, about = "Ask questions about the indexed policy documents")]
struct Cli {
    /// Pipeline configuration file. Defaults apply when omitted.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `policyqa=debug`. Falls back to RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer one question and print the answer text.
    Ask { question: String },
    /// Print the number of indexed chunks and their embedding model.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    // A blank question never needs the index or the model endpoints.
    if cli.asks_blank_question() {
        eprintln!("Please enter a question.");
        return Ok(());
    }

    let cfg = match &cli.config {
        Some(path) => PolicyQaConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PolicyQaConfig::default(),
    }
    .with_env_overrides();

    let engine = QueryEngine::from_config(&cfg).context("building query engine")?;

    match cli.command {
        Some(Command::Ask { question }) => ask(&engine, &question).await,
        Some(Command::Status) => {
            let status = engine.index_status().await?;
            println!("{} chunks embedded with {}", status.chunks, status.embedding_model);
            Ok(())
        }
        None => ask(&engine, SELF_TEST_QUESTION).await,
    }
}

impl Cli {
    fn asks_blank_question(&self) -> bool {
        matches!(&self.command, Some(Command::Ask { question }) if question.trim().is_empty())
    }
}

async fn ask(engine: &QueryEngine, question: &str) -> anyhow::Result<()> {
    let response = engine.answer(question).await?;
    println!("{}", response.text());
    Ok(())
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
