//! CLI entrypoint for doc-researcher
//!
//! Wires the layers together and runs an n-participant group in one
//! process: every participant gets its own artifact directory and
//! orchestrator, while the round bus, blob store and checkpoint register
//! are shared.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use researcher_application::{
    BlobStore, CheckDocumentsStage, CheckpointChain, EmbeddingStage, ExecutionParams,
    PipelineStage, ProcessHtmlStage, PublishStage, RoundOrchestrator, SampleQueryStage,
    SamplingStage, SearchEngineStage, UpdateFilesStage, UpdateQueriesStage, WebScrapeStage,
};
use researcher_domain::{researcher_table, RoundId};
use researcher_infrastructure::{
    ConfigLoader, FileArtifactRepository, FileConfig, HtmlTextExtractor, HttpBlobStore,
    HttpEmbedClient, HttpQueryFeed, HttpScrapeClient, HttpSearchClient, LocalRoundBus,
    MemoryBlobStore, MemoryCheckpointRegister,
};

#[derive(Parser, Debug)]
#[command(name = "doc-researcher", version, about = "Replicated document research pipeline")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip configuration files and use defaults
    #[arg(long)]
    no_config: bool,

    /// Number of participants in the group
    #[arg(long)]
    agents: Option<usize>,

    /// Stop after this many published checkpoints
    #[arg(long)]
    cycles: Option<usize>,

    /// Upper bound on rounds per participant
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Root directory for the participants' artifact files
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn build_stages(
    config: &FileConfig,
    params: &ExecutionParams,
    artifacts: Arc<FileArtifactRepository>,
    chain: CheckpointChain,
) -> Vec<Arc<dyn PipelineStage>> {
    let attempts = params.retry_attempts;
    let backoff = params.retry_backoff;
    let request_timeout = params.request_timeout;

    let feed = Arc::new(HttpQueryFeed::new(
        &config.feed.endpoint,
        attempts,
        backoff,
        request_timeout,
    ));
    let search = Arc::new(HttpSearchClient::new(
        &config.search.endpoint,
        &config.search.api_key,
        attempts,
        backoff,
        request_timeout,
    ));
    let scrape = Arc::new(HttpScrapeClient::new(attempts, backoff, request_timeout));
    let embed = Arc::new(HttpEmbedClient::new(
        &config.embeddings.endpoint,
        &config.embeddings.api_key,
        &config.embeddings.model,
        attempts,
        backoff,
        request_timeout,
    ));

    vec![
        Arc::new(UpdateQueriesStage::new(feed, artifacts.clone())),
        Arc::new(UpdateFilesStage::new(chain.clone(), artifacts.clone())),
        Arc::new(CheckDocumentsStage::new(artifacts.clone())),
        Arc::new(SampleQueryStage::new(artifacts.clone())),
        Arc::new(SearchEngineStage::new(
            search,
            artifacts.clone(),
            params.clone(),
        )),
        Arc::new(SamplingStage::new(artifacts.clone())),
        Arc::new(WebScrapeStage::new(
            scrape,
            artifacts.clone(),
            params.clone(),
        )),
        Arc::new(ProcessHtmlStage::new(
            Arc::new(HtmlTextExtractor),
            artifacts.clone(),
            params.clone(),
        )),
        Arc::new(EmbeddingStage::new(embed, artifacts.clone())),
        Arc::new(PublishStage::new(chain, artifacts)),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")?
    };

    let mut params = config.execution.clone();
    if let Some(agents) = cli.agents {
        params.num_agents = agents;
    }
    if let Some(cycles) = cli.cycles {
        params.max_cycles = cycles;
    }
    if let Some(max_rounds) = cli.max_rounds {
        params.max_rounds = max_rounds;
    }
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.participant.data_dir.clone());

    info!(
        agents = params.num_agents,
        cycles = params.max_cycles,
        "starting research group"
    );

    // === Dependency Injection ===
    let bus = Arc::new(LocalRoundBus::new(params.num_agents, params.threshold));
    let blobs: Arc<dyn BlobStore> = if config.blob.endpoint.is_empty() {
        Arc::new(MemoryBlobStore::new())
    } else {
        Arc::new(HttpBlobStore::new(
            &config.blob.endpoint,
            params.retry_attempts,
            params.retry_backoff,
            config.blob.request_timeout.unwrap_or(params.request_timeout),
        ))
    };
    let register = Arc::new(MemoryCheckpointRegister::new());

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing current round");
                cancel.cancel();
            }
        });
    }

    let mut handles = Vec::new();
    for i in 0..params.num_agents {
        let artifacts = Arc::new(FileArtifactRepository::new(
            data_dir.join(format!("agent-{i}")),
        ));
        let chain = CheckpointChain::new(blobs.clone(), register.clone());
        let stages = build_stages(&config, &params, artifacts, chain.clone());
        let mut orchestrator = RoundOrchestrator::new(
            format!("agent-{i}"),
            researcher_table(),
            bus.clone(),
            stages,
            params.clone(),
        )
        .with_checkpoint_chain(chain);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            orchestrator.run(RoundId::UpdateQueries, cancel).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let report = handle
            .await
            .context("participant task panicked")?
            .with_context(|| format!("participant agent-{i} failed"))?;
        println!(
            "agent-{i}: {} rounds, {} cycles, {} commits, stopped at {}",
            report.rounds_completed, report.cycles_completed, report.commits, report.final_round
        );
    }

    Ok(())
}
