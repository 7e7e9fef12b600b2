//! roverctl CLI — the main entry point.
//!
//! One invocation runs one task:
//!
//! ```text
//! roverctl --robot-ip 192.168.1.42 --task "find the red ball"
//! ```

use clap::Parser;
use roverctl_agent::{PruningPolicy, TaskEvent, TaskRunner};
use roverctl_config::AppConfig;
use roverctl_device::DeviceClient;
use roverctl_engines::OpenAiCompatEngine;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "roverctl",
    about = "roverctl — drive a camera robot with natural-language tasks",
    version,
    author
)]
struct Cli {
    /// Robot address (IP or host[:port])
    #[arg(long)]
    robot_ip: String,

    /// The task to perform, in natural language
    #[arg(long)]
    task: String,

    /// Path to an alternate config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig, roverctl_config::ConfigError> {
    match path {
        None => AppConfig::load(),
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            // Env keys still win over a file named on the command line
            if config.engine.api_key.is_none() {
                config.engine.api_key = std::env::var("ROVERCTL_API_KEY")
                    .ok()
                    .or_else(|| std::env::var("OPENAI_API_KEY").ok());
            }
            Ok(config)
        }
    }
}

/// Render relayed task events to the terminal as they arrive.
async fn print_events(mut rx: tokio::sync::mpsc::Receiver<TaskEvent>) -> Option<String> {
    let mut final_text = None;
    let mut mid_line = false;

    while let Some(event) = rx.recv().await {
        match event {
            TaskEvent::Text { text } => {
                print!("{text}");
                let _ = std::io::stdout().flush();
                mid_line = true;
            }
            TaskEvent::Reasoning { .. } => {
                // Ephemeral; visible via RUST_LOG=debug only
            }
            TaskEvent::ToolCall { name, arguments } => {
                if mid_line {
                    println!();
                    mid_line = false;
                }
                println!("→ {name} {arguments}");
            }
            TaskEvent::ToolResult {
                name,
                success,
                summary,
            } => {
                let mark = if success { "✓" } else { "✗" };
                println!("{mark} {name}: {summary}");
            }
            TaskEvent::PhotoCaptured { action } => {
                tracing::debug!(action, "Photo captured");
            }
            TaskEvent::Pruned {
                discarded,
                retained,
            } => {
                info!(discarded, retained, "Conversation log pruned");
            }
            TaskEvent::Done {
                final_text: text,
                turns,
            } => {
                if mid_line {
                    println!();
                    mid_line = false;
                }
                info!(turns, "Task finished");
                final_text = text;
            }
            TaskEvent::Error { message } => {
                if mid_line {
                    println!();
                    mid_line = false;
                }
                eprintln!("Error: {message}");
            }
        }
    }

    final_text
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_ref())?;

    if !config.has_api_key() {
        eprintln!("No engine API key configured.");
        eprintln!("Set ROVERCTL_API_KEY or OPENAI_API_KEY, or add api_key to:");
        eprintln!("  {}", AppConfig::config_dir().join("config.toml").display());
        std::process::exit(1);
    }

    let client = Arc::new(DeviceClient::new(&cli.robot_ip, &config.device));
    let tools = Arc::new(roverctl_actions::registry(client, &config.device));
    let engine = Arc::new(OpenAiCompatEngine::from_config(&config.engine)?);

    let runner = TaskRunner::new(
        engine,
        tools,
        &config.engine.model,
        config.engine.temperature,
    )
    .with_max_output_tokens(config.engine.max_output_tokens)
    .with_pruning(PruningPolicy::from_config(&config.pruning))
    .with_max_turns(config.runner.max_turns);

    info!(robot = %cli.robot_ip, model = %config.engine.model, "Connecting");

    let (tx, rx) = tokio::sync::mpsc::channel(256);
    let printer = tokio::spawn(print_events(rx));

    let result = runner.run(&cli.task, tx).await;
    let printed_final = printer.await.unwrap_or(None);

    match result {
        Ok(final_text) => {
            println!();
            match final_text.or(printed_final) {
                Some(text) => println!("── Task result ──\n{text}"),
                None => println!("── Task ended without a final answer ──"),
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Task failed: {e}");
            std::process::exit(1);
        }
    }
}
