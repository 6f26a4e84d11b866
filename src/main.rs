//! Driveway monitor binary entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use driveway_monitor::{start_server, Config, ControlState, DeliverySink, Pipeline, StdoutSink};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "driveway-monitor",
    version,
    about = "Notify when something arrives in the driveway",
    long_about = "Reads object detections as JSON lines, groups them into tracks, and \
                  prints a JSON line for every track that qualifies for a notification.",
    after_help = "EXAMPLES:\n  \
                  # Read detections from stdin\n  \
                  detector | driveway-monitor --config config.json\n\n  \
                  # Replay a recorded detection log without the control server\n  \
                  driveway-monitor --config config.json --input detections.jsonl --no-web"
)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long)]
    config: PathBuf,

    /// JSON-lines prediction input; `-` reads stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Do not start the control server
    #[arg(long)]
    no_web: bool,
}

async fn open_input(input: &str) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("Failed to open input {input}"))?;
    Ok(Box::new(BufReader::new(file)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug {
        "driveway_monitor=debug,driveway_tracking=debug,driveway_rules=debug,driveway_notify=debug,tower_http=debug"
    } else {
        "info"
    };
    // stdout carries deliveries, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let mut pipeline = Pipeline::new(&config).context("Failed to initialize pipeline")?;

    let sink: Arc<dyn DeliverySink> = Arc::new(StdoutSink);

    if config.web.enabled && !cli.no_web {
        let state = ControlState::new(
            pipeline.notifier().clone(),
            pipeline.clock().clone(),
            Arc::clone(&sink),
        );
        let addr = config.web.addr();
        tokio::spawn(async move {
            if let Err(e) = start_server(&addr, state).await {
                error!("Control server on {} stopped: {}", addr, e);
            }
        });
    }

    let input = open_input(&cli.input).await?;
    let stats = pipeline
        .run(input, sink.as_ref())
        .await
        .context("Failed to read predictions")?;

    info!(
        "Done: {} delivered, {} sink failures",
        stats.delivered, stats.sink_failures
    );
    Ok(())
}
