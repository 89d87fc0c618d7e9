//! Configuration file schema

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use researcher_application::ExecutionParams;

/// Top-level configuration, merged from defaults, `researcher.toml` and
/// `RESEARCHER_`-prefixed environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub participant: ParticipantConfig,
    pub execution: ExecutionParams,
    pub search: SearchConfig,
    pub embeddings: EmbeddingsConfig,
    pub feed: FeedConfig,
    pub blob: BlobConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantConfig {
    /// Stable identifier of this participant within the group.
    pub id: String,
    /// Directory holding the local artifact files.
    pub data_dir: PathBuf,
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            id: "agent-0".to_string(),
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub endpoint: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// Gateway base URL. Empty selects the in-memory store.
    pub endpoint: String,
    /// Per-request timeout for gateway calls.
    #[serde(with = "humantime_secs")]
    pub request_timeout: Option<Duration>,
}

/// Plain-seconds (de)serialization for optional durations.
mod humantime_secs {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let config = FileConfig::default();
        assert_eq!(config.participant.id, "agent-0");
        assert_eq!(config.execution.num_agents, 1);
        assert!(config.blob.endpoint.is_empty());
    }
}
