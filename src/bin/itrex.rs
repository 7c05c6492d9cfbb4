use std::collections::HashMap;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use itrex::{render, Evaluator, EvaluatorConfig, Shell};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Worker threads for thread/join and the concurrent iterators
    #[arg(short, long)]
    workers: Option<usize>,

    /// Elements the concurrent iterators compute ahead of the consumer
    #[arg(short, long)]
    lookahead: Option<usize>,

    /// JSON file with evaluator settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Evaluate an expression and print the result (repeatable)
    #[arg(short, long = "eval")]
    eval: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Script files to evaluate in order
    files: Vec<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<EvaluatorConfig> {
    let config = match &cli.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        None => EvaluatorConfig::default(),
    };
    let env: HashMap<String, String> = std::env::vars().collect();
    let mut config = config.with_overrides(&env);

    if let Some(workers) = cli.workers {
        config.worker_threads = workers;
    }
    if let Some(lookahead) = cli.lookahead {
        config.lookahead = lookahead;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    debug!("config: {:?}", config);

    let evaluator = Evaluator::with_config(config).context("Failed to start evaluator")?;

    if cli.eval.is_empty() && cli.files.is_empty() {
        let stdin = io::stdin();
        let mut shell = Shell::new(evaluator, BufReader::new(stdin.lock()), io::stdout());
        shell.run()?;
        return Ok(());
    }

    for source in &cli.eval {
        let value = evaluator.evaluate_str(source)?;
        println!("{}", render(&value)?);
    }
    for path in &cli.files {
        info!("evaluating {}", path.display());
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value = evaluator
            .evaluate_str(&source)
            .with_context(|| format!("Error in {}", path.display()))?;
        println!("{}", render(&value)?);
    }
    evaluator.shutdown();
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
