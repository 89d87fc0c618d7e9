//! Configuration loader with multi-source merging

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::file_config::FileConfig;

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `RESEARCHER_`-prefixed environment variables
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./researcher.toml` or `./.researcher.toml`
    /// 4. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for filename in &["researcher.toml", ".researcher.toml"] {
            let path = PathBuf::from(filename);
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
                break;
            }
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("RESEARCHER_").split("__"));
        figment.extract().map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_no_sources_exist() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.execution.max_cycles, 1);
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[participant]\nid = \"agent-7\"\n\n[search]\napi_key = \"k\""
        )
        .unwrap();

        let config = ConfigLoader::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.participant.id, "agent-7");
        assert_eq!(config.search.api_key, "k");
        // Untouched sections keep their defaults.
        assert_eq!(config.embeddings.model, "text-embedding-3-small");
    }
}
