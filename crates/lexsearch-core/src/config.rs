//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nesting, e.g.
//! `APP_RETRIEVAL__CORPUS_TIMEOUT_MS=1500`). Provides helpers to expand `~`
//! and `${VAR}` and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::DEFAULT_MAX_RESULTS;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Loads configuration files from `dir`, layered for the `RUST_ENV` environment.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base_dir: dir.to_path_buf() };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment, base_dir: &Path) -> Self {
        Self { figment, base_dir: base_dir.to_path_buf() }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extracts and validates the typed settings tree.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                let provider: EmbeddingProvider = self.get("embedding.provider")?;
                if provider == EmbeddingProvider::Hash {
                    return Err(anyhow::anyhow!(
                        "Prod config uses the hash embedder; set embedding.provider to \"model\" or \"http\""
                    ));
                }
            }
            "dev" | "development" => {}
            "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

/// Which embedding backend answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local candle model loaded from `embedding.model_dir`.
    Model,
    /// Deterministic feature-hashing embedder; no model weights needed.
    Hash,
    /// OpenAI-compatible embeddings endpoint.
    Http,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub retrieval: RetrievalSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub dimension: usize,
    pub max_len: usize,
    pub model_dir: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub request_timeout_ms: u64,
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub default_max_results: usize,
    pub max_limit: usize,
    pub embed_timeout_ms: u64,
    pub corpus_timeout_ms: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hash,
            dimension: 1024,
            max_len: 256,
            model_dir: None,
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_ms: 8_000,
            cache_capacity: 512,
            cache_ttl_secs: 600,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { uri: "../data/indexes/lancedb".to_string() }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_max_results: DEFAULT_MAX_RESULTS,
            max_limit: 50,
            embed_timeout_ms: 10_000,
            corpus_timeout_ms: 3_000,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be greater than 0".into()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be greater than 0".into()));
        }
        if self.retrieval.embed_timeout_ms == 0 || self.retrieval.corpus_timeout_ms == 0 {
            return Err(Error::InvalidConfig("retrieval timeouts must be greater than 0".into()));
        }
        if self.retrieval.default_max_results == 0 {
            return Err(Error::InvalidConfig("retrieval.default_max_results must be greater than 0".into()));
        }
        if self.retrieval.default_max_results > self.retrieval.max_limit {
            return Err(Error::InvalidConfig(format!(
                "retrieval.default_max_results ({}) exceeds retrieval.max_limit ({})",
                self.retrieval.default_max_results, self.retrieval.max_limit
            )));
        }
        if self.embedding.provider == EmbeddingProvider::Http && self.embedding.endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig("embedding.endpoint is required for the http provider".into()));
        }
        Ok(())
    }
}

impl StoreSettings {
    /// The store URI with local paths expanded and resolved against `base`.
    /// URIs with a scheme (`s3://...`) pass through untouched.
    pub fn resolved_uri(&self, base: &Path) -> String {
        if self.uri.contains("://") {
            return self.uri.clone();
        }
        resolve_with_base(base, &self.uri).to_string_lossy().into_owned()
    }
}

impl RetrievalSettings {
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }

    pub fn corpus_timeout(&self) -> Duration {
        Duration::from_millis(self.corpus_timeout_ms)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
