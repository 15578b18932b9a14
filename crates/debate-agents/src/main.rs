use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use debate_agents::{check_endpoint, report, EndpointConfig, OpenAiCompatClient};
use debate_coordination::{DebateConfig, DebateController, DebateStatus, SimilarityMethod};
use tracing::info;

/// Run a multi-agent debate against an OpenAI-compatible endpoint.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The question to debate
    question: String,

    /// TOML config file (debaters, orchestrator, thresholds)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum completed rounds (overrides DEBATE_MAX_ROUNDS)
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Consensus threshold in [0, 1] (overrides DEBATE_CONSENSUS_THRESHOLD)
    #[arg(long)]
    threshold: Option<f64>,

    /// Similarity method: keyword, hashed or semantic (overrides DEBATE_SIMILARITY)
    #[arg(long)]
    similarity: Option<SimilarityMethod>,

    /// Print the run record as JSON instead of a text report
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Probe the endpoint before starting and abort if it is unreachable
    #[arg(long, default_value_t = false)]
    check: bool,
}

fn load_config(args: &Args) -> Result<DebateConfig> {
    let mut config = match &args.config {
        Some(path) => DebateConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DebateConfig::default(),
    };
    config.apply_env_overrides();

    if let Some(max_rounds) = args.max_rounds {
        config.max_rounds = max_rounds;
    }
    if let Some(threshold) = args.threshold {
        config.consensus_threshold = threshold;
    }
    if let Some(similarity) = args.similarity {
        config.similarity = similarity;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let endpoint = EndpointConfig::default();

    info!(
        endpoint = %endpoint.base_url,
        debaters = config.debaters.len(),
        max_rounds = config.max_rounds,
        threshold = config.consensus_threshold,
        similarity = %config.similarity,
        "Debate runner starting"
    );

    if args.check && !check_endpoint(&endpoint.base_url, endpoint.api_key.as_deref()).await {
        bail!("Inference endpoint {} is not reachable", endpoint.base_url);
    }

    let client = OpenAiCompatClient::new(endpoint).context("Failed to build HTTP client")?;
    let controller = DebateController::new(config, Arc::new(client))
        .context("Invalid debate configuration")?;

    let run = controller.conduct(&args.question, None).await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&run).context("Failed to serialize run")?
        );
    } else {
        print!("{}", report::render_text(&run));
    }

    Ok(if run.status == DebateStatus::Failed {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}
