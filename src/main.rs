//! # Investment Approval Agent
//!
//! A quantitative investment agent with human oversight, built on the
//! rig-hitl Pregel runtime:
//! - An analyst (Ollama, OpenAI or offline) produces a JSON recommendation
//! - The run pauses until a human approves, refines or exits
//! - Refinements go back to the analyst with the reviewer's feedback
//!
//! ## Quick Start
//! ```bash
//! cargo run -- AAPL
//! cargo run -- --offline MSFT
//! ```

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================
/// Configuration management
mod config;

/// Model client construction
mod agent;

/// Terminal interaction with the reviewer
mod terminal;

// =============================================================================
// IMPORTS
// =============================================================================
use anyhow::Result;
use clap::Parser;
use rig_hitl::invest::{InvestMessage, InvestWorkflowBuilder};
use rig_hitl::pregel::{drive, LoopOutcome, ScriptedResponder};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::agent::build_model_client;
use crate::config::{Config, ModelProvider};
use crate::terminal::{EchoResponder, TerminalResponder};

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "invest-approval-agent",
    version = "0.1.0",
    about = "An AI investment analyst whose recommendations need human approval",
    long_about = r#"
Investment Approval Agent - recommendations you sign off on.

The agent analyses a stock ticker and proposes BUY, SELL or HOLD with a
rationale. Nothing is final until you answer:
  approve            - accept the recommendation
  refine <feedback>  - ask the analyst to revise it
  exit               - cancel the workflow

PREREQUISITES (default provider):
  1. Install Ollama: https://ollama.ai
  2. Pull a model: ollama pull llama3.2
  3. Start Ollama: ollama serve

EXAMPLES:
  # Interactive session with the local model
  invest-approval-agent AAPL

  # No model endpoint needed
  invest-approval-agent --offline MSFT

  # Scripted reviewer
  invest-approval-agent --offline --reply "refine focus on risk" --reply approve TSLA

  # Print the workflow graph as Mermaid
  invest-approval-agent --graph
"#
)]
struct Args {
    /// Stock ticker to analyze; asked for interactively when omitted
    #[arg(value_name = "TICKER")]
    ticker: Option<String>,

    /// Model backend (overrides MODEL_PROVIDER)
    #[arg(short = 'p', long = "provider", value_enum)]
    provider: Option<ModelProvider>,

    /// Model name (overrides MODEL_NAME)
    #[arg(short = 'm', long = "model", env = "MODEL_NAME")]
    model: Option<String>,

    /// Use canned recommendations instead of a model
    #[arg(long = "offline", default_value = "false")]
    offline: bool,

    /// Scripted reviewer replies, used in order instead of reading stdin
    #[arg(short = 'r', long = "reply", value_name = "REPLY")]
    replies: Vec<String>,

    /// Print the workflow graph as a Mermaid diagram and exit
    #[arg(long = "graph", default_value = "false")]
    graph: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    verbose: bool,
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let config = load_config(&args)?;
    info!(
        provider = %config.provider,
        model = %config.model,
        max_supersteps = config.max_supersteps,
        "Configuration loaded"
    );

    let client = build_model_client(&config)?;
    let mut runtime = InvestWorkflowBuilder::new(client)
        .config(config.pregel_config())
        .build_runtime()?;

    if args.graph {
        println!("{}", runtime.to_mermaid());
        return Ok(());
    }

    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("QUANTITATIVE INVESTMENT AGENT WITH HUMAN OVERSIGHT");
    println!("{}\n", rule);

    let mut terminal = TerminalResponder::stdio();

    let ticker = match args.ticker.clone() {
        Some(ticker) => ticker,
        None => terminal
            .read_line("Enter stock ticker to analyze (e.g., MSFT, AAPL): ")
            .await
            .unwrap_or_default(),
    };
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        println!("No ticker provided. Exiting.");
        return Ok(());
    }

    println!("\nAnalyzing {}...\n", ticker);
    let input = InvestMessage::Ticker(ticker.clone());

    let outcome = if args.replies.is_empty() {
        drive(&mut runtime, input, &mut terminal).await
    } else {
        info!(replies = args.replies.len(), "Using scripted reviewer replies");
        let script = ScriptedResponder::new(args.replies.clone()).with_abort_word("exit");
        let mut scripted = EchoResponder::new(script, std::io::stdout());
        drive(&mut runtime, input, &mut scripted).await
    };

    match outcome {
        Ok(LoopOutcome::Completed(result)) => {
            println!("\n{}", rule);
            println!("WORKFLOW COMPLETE");
            println!("{}", rule);
            println!("{}", result);
        }
        Ok(LoopOutcome::Cancelled) => {
            println!("\nWorkflow cancelled by user.");
        }
        Ok(LoopOutcome::Idle) => {
            warn!(ticker = %ticker, "Workflow stopped without a result");
            println!("\nWorkflow ended without a recommendation.");
        }
        Err(e) => {
            error!(error = %e, "Workflow failed");
            eprintln!("\nWorkflow failed: {}", e);
            if config.provider == ModelProvider::Ollama && e.is_timeout() {
                eprintln!("\nTip: make sure Ollama is running (ollama serve)");
            }
            return Err(e.into());
        }
    }

    info!(workflow_id = %runtime.workflow_id(), "Workflow finished");
    Ok(())
}

/// Environment configuration with command-line overrides applied
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(provider) = args.provider {
        config.provider = provider;
        if args.model.is_none() {
            config.model = provider.default_model().to_string();
        }
    }
    if args.offline {
        config.provider = ModelProvider::Offline;
    }
    if let Some(model) = &args.model {
        info!(model = %model, "Using model from command line");
        config.model = model.clone();
    }

    config.validate()?;
    Ok(config)
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["test", "AAPL"]);
        assert_eq!(args.ticker.as_deref(), Some("AAPL"));
        assert!(!args.offline);
        assert!(!args.graph);
        assert!(args.replies.is_empty());
    }

    #[test]
    fn test_args_with_flags() {
        let args = Args::parse_from([
            "test",
            "--offline",
            "--verbose",
            "--provider",
            "openai",
            "--reply",
            "refine focus on risk",
            "--reply",
            "approve",
            "MSFT",
        ]);

        assert_eq!(args.ticker.as_deref(), Some("MSFT"));
        assert!(args.offline);
        assert!(args.verbose);
        assert_eq!(args.provider, Some(ModelProvider::OpenAi));
        assert_eq!(args.replies, vec!["refine focus on risk", "approve"]);
    }

    #[test]
    fn test_ticker_optional() {
        let args = Args::parse_from(["test", "--graph"]);
        assert!(args.ticker.is_none());
        assert!(args.graph);
    }
}
