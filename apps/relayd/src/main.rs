mod pipeline;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use relay_events::{JournalConfig, SessionJournal};
use relay_protocol::{SessionId, StaticInvocationContext};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::pipeline::{Direction, JournalSink};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "relayd")]
#[command(about = "Translate agent-to-agent protocol events to session events and back")]
struct Cli {
    /// JSON-lines input file; stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "inbound")]
    direction: Direction,
    /// Name of the agent the translated events are attributed to.
    #[arg(long, default_value = "remote_agent")]
    agent: String,
    #[arg(long, default_value = "")]
    branch: String,
    /// Invocation id; a fresh one per run when omitted.
    #[arg(long)]
    invocation: Option<String>,
    /// Journal root directory. Inbound events are appended there when set.
    #[arg(long)]
    journal: Option<PathBuf>,
    #[arg(long)]
    session: Option<String>,
    #[arg(long, value_enum, default_value = "compact")]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn open_input(input: Option<&PathBuf>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    Ok(match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed opening input {path:?}"))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let invocation = cli
        .invocation
        .unwrap_or_else(|| relay_protocol::EventId::new_uuid().to_string());
    let ctx = StaticInvocationContext::new(invocation, cli.agent).with_branch(cli.branch);

    let journal = cli
        .journal
        .as_ref()
        .map(|root| SessionJournal::from_config(&JournalConfig::new(root)));
    let session_id = cli
        .session
        .map(SessionId::from)
        .unwrap_or_else(SessionId::new_uuid);
    if let Some(root) = &cli.journal {
        info!(root = %root.display(), session_id = %session_id, "journal enabled");
    }

    let reader = open_input(cli.input.as_ref()).await?;
    let mut stdout = tokio::io::stdout();
    let sink = journal.as_ref().map(|journal| JournalSink {
        journal,
        session_id: &session_id,
    });
    let summary = pipeline::run(cli.direction, &ctx, sink, reader, &mut stdout).await?;

    info!(
        direction = ?cli.direction,
        read = summary.read,
        emitted = summary.emitted,
        skipped = summary.skipped,
        failed = summary.failed,
        "translation finished"
    );
    Ok(())
}
