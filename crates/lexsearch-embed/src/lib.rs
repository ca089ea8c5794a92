//! lexsearch-embed
//!
//! Query embedders: a local BGE-M3 model on candle, a deterministic hashing
//! embedder, and an OpenAI-compatible HTTP client, each optionally wrapped in
//! an in-process cache. [`build_embedder`] picks one from configuration.

use anyhow::Result;
use std::path::Path;
use std::time::Duration;

use lexsearch_core::config::{EmbeddingProvider, EmbeddingSettings};
use lexsearch_core::traits::Embedder;

pub mod cache;
pub mod device;
pub mod hashing;
pub mod http;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use cache::CachedEmbedder;
pub use hashing::HashEmbedder;
pub use http::HttpEmbedder;
pub use model::EmbeddingModel;
pub use pool::masked_mean_l2;

/// True when `APP_USE_FAKE_EMBEDDINGS` forces the hashing embedder.
pub fn fake_embeddings_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Builds the configured embedder, resolving relative model paths against `base`.
pub fn build_embedder(settings: &EmbeddingSettings, base: &Path) -> Result<Box<dyn Embedder>> {
    let provider = if fake_embeddings_requested() { EmbeddingProvider::Hash } else { settings.provider };
    let inner: Box<dyn Embedder> = match provider {
        EmbeddingProvider::Hash => {
            tracing::info!(dim = settings.dimension, "using hashing embedder");
            Box::new(HashEmbedder::new(settings.dimension).with_max_len(settings.max_len))
        }
        EmbeddingProvider::Model => {
            let dir = model::resolve_model_dir(settings.model_dir.as_deref(), base)?;
            Box::new(EmbeddingModel::load(&dir, settings.dimension, settings.max_len)?)
        }
        EmbeddingProvider::Http => {
            tracing::info!(endpoint = %settings.endpoint, model = %settings.model, "using HTTP embedder");
            Box::new(HttpEmbedder::new(settings)?)
        }
    };
    if settings.cache_capacity == 0 {
        return Ok(inner);
    }
    let ttl = Duration::from_secs(settings.cache_ttl_secs);
    Ok(Box::new(CachedEmbedder::new(inner, settings.cache_capacity, ttl)))
}
