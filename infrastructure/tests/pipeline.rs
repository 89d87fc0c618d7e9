//! End-to-end local run: three participants drive the full research
//! pipeline over the in-process bus with in-memory storage and stub
//! providers, publish one checkpoint and end up with identical state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use researcher_application::ports::embed::{EmbedClient, EmbedError};
use researcher_application::ports::feed::{FeedError, QueryFeed};
use researcher_application::ports::scrape::{ScrapeClient, ScrapeError};
use researcher_application::ports::search::{SearchClient, SearchError, SearchHit};
use researcher_application::{
    CheckDocumentsStage, CheckpointChain, EmbeddingStage, ExecutionParams, PipelineStage,
    ProcessHtmlStage, PublishStage, RoundOrchestrator, SampleQueryStage, SamplingStage,
    SearchEngineStage, UpdateFilesStage, UpdateQueriesStage, WebScrapeStage,
};
use researcher_domain::{keys, researcher_table, Query, RoundId};
use researcher_infrastructure::{
    FileArtifactRepository, HtmlTextExtractor, LocalRoundBus, MemoryBlobStore,
    MemoryCheckpointRegister,
};

struct StubFeed;

#[async_trait]
impl QueryFeed for StubFeed {
    async fn fetch_queries(&self) -> Result<Vec<Query>, FeedError> {
        Ok(vec![
            Query::new("https://feed.example/rust-pipelines").with_title("rust pipelines")
        ])
    }
}

struct StubSearch;

#[async_trait]
impl SearchClient for StubSearch {
    async fn search(&self, _query: &str, _max: usize) -> Result<Vec<SearchHit>, SearchError> {
        Ok(vec![SearchHit {
            url: "https://article.example/pipelines".to_string(),
            title: Some("Pipelines in practice".to_string()),
            description: Some("How research pipelines work".to_string()),
            publisher: None,
            publication_date: None,
        }])
    }
}

struct StubScrape;

#[async_trait]
impl ScrapeClient for StubScrape {
    async fn fetch(&self, _url: &str) -> Result<String, ScrapeError> {
        Ok("<html><body><h1>Pipelines</h1><p>Replicated research pipelines \
            process one document per cycle.</p></body></html>"
            .to_string())
    }
}

struct StubEmbed;

#[async_trait]
impl EmbedClient for StubEmbed {
    async fn embed(&self, chunks: &[String]) -> Result<Vec<Vec<f64>>, EmbedError> {
        Ok(chunks.iter().map(|c| vec![c.len() as f64, 1.0]).collect())
    }
}

fn stages(
    artifacts: Arc<FileArtifactRepository>,
    chain: CheckpointChain,
    params: ExecutionParams,
) -> Vec<Arc<dyn PipelineStage>> {
    vec![
        Arc::new(UpdateQueriesStage::new(Arc::new(StubFeed), artifacts.clone())),
        Arc::new(UpdateFilesStage::new(chain.clone(), artifacts.clone())),
        Arc::new(CheckDocumentsStage::new(artifacts.clone())),
        Arc::new(SampleQueryStage::new(artifacts.clone())),
        Arc::new(SearchEngineStage::new(
            Arc::new(StubSearch),
            artifacts.clone(),
            params.clone(),
        )),
        Arc::new(SamplingStage::new(artifacts.clone())),
        Arc::new(WebScrapeStage::new(
            Arc::new(StubScrape),
            artifacts.clone(),
            params.clone(),
        )),
        Arc::new(ProcessHtmlStage::new(
            Arc::new(HtmlTextExtractor),
            artifacts.clone(),
            params,
        )),
        Arc::new(EmbeddingStage::new(Arc::new(StubEmbed), artifacts.clone())),
        Arc::new(PublishStage::new(chain, artifacts)),
    ]
}

#[tokio::test]
async fn test_three_participants_publish_one_checkpoint() {
    let num_agents = 3;
    let params = ExecutionParams::default()
        .with_num_agents(num_agents)
        .with_max_cycles(1)
        .with_round_timeout(Duration::from_secs(5));

    let bus = Arc::new(LocalRoundBus::new(num_agents, None));
    let blobs = Arc::new(MemoryBlobStore::new());
    let register = Arc::new(MemoryCheckpointRegister::new());

    let mut handles = Vec::new();
    let mut data_dirs = Vec::new();
    for i in 0..num_agents {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = Arc::new(FileArtifactRepository::new(dir.path()));
        data_dirs.push(dir);

        let chain = CheckpointChain::new(blobs.clone(), register.clone());
        let mut orchestrator = RoundOrchestrator::new(
            format!("agent-{i}"),
            researcher_table(),
            bus.clone(),
            stages(artifacts, chain.clone(), params.clone()),
            params.clone(),
        )
        .with_checkpoint_chain(chain);
        handles.push(tokio::spawn(async move {
            let report = orchestrator
                .run(RoundId::UpdateQueries, CancellationToken::new())
                .await
                .unwrap();
            let manifest = orchestrator
                .store()
                .get(keys::MANIFEST_HASH)
                .cloned()
                .unwrap();
            (report, manifest)
        }));
    }

    let mut manifests = Vec::new();
    for handle in handles {
        let (report, manifest) = handle.await.unwrap();
        assert_eq!(report.cycles_completed, 1);
        // 11 agreed rounds: the documents-manager pass, the scraper pass
        // and the second documents check in between.
        assert_eq!(report.rounds_completed, 11);
        manifests.push(manifest);
    }

    // Every participant committed the same manifest hash.
    manifests.dedup();
    assert_eq!(manifests.len(), 1);

    // And the chain holds exactly that checkpoint.
    use researcher_application::ports::checkpoint::CheckpointRegister;
    let history = register.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(
        serde_json::json!(history[0].as_str()),
        manifests[0]
    );

    // The published artifacts on disk agree across participants.
    let docs: Vec<String> = data_dirs
        .iter()
        .map(|dir| std::fs::read_to_string(dir.path().join("documents.json")).unwrap())
        .collect();
    assert!(docs.windows(2).all(|w| w[0] == w[1]));
    assert!(docs[0].contains("article.example"));
    assert!(docs[0].contains("text_chunks"));
}
