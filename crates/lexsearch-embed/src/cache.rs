//! In-process query embedding cache.
//!
//! Keys are blake3 hashes of the whitespace-normalised text, so repeated or
//! re-spaced queries skip the provider. Backed by a bounded [`moka`] cache
//! with a time-to-live.

use anyhow::{bail, Result};
use moka::sync::Cache;
use std::time::Duration;

use lexsearch_core::traits::Embedder;

pub struct CachedEmbedder<E> {
    inner: E,
    cache: Cache<String, Vec<f32>>,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E, capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(capacity).time_to_live(ttl).build();
        Self { inner, cache }
    }

    /// Number of cached vectors, after flushing pending maintenance.
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

pub fn cache_key(text: &str) -> String {
    let normalised = text.split_whitespace().collect::<Vec<_>>().join(" ");
    blake3::hash(normalised.as_bytes()).to_hex().to_string()
}

impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let keys: Vec<String> = texts.iter().map(|t| cache_key(t)).collect();
        let mut vectors: Vec<Option<Vec<f32>>> = keys.iter().map(|k| self.cache.get(k)).collect();

        let misses: Vec<usize> = (0..texts.len()).filter(|&i| vectors[i].is_none()).collect();
        if !misses.is_empty() {
            let miss_texts: Vec<String> = misses.iter().map(|&i| texts[i].clone()).collect();
            let computed = self.inner.embed_batch(&miss_texts)?;
            if computed.len() != miss_texts.len() {
                bail!("embedder returned {} vectors for {} inputs", computed.len(), miss_texts.len());
            }
            for (&i, v) in misses.iter().zip(computed) {
                self.cache.insert(keys[i].clone(), v.clone());
                vectors[i] = Some(v);
            }
        }
        tracing::trace!(hits = texts.len() - misses.len(), misses = misses.len(), "embedding cache lookup");
        Ok(vectors.into_iter().flatten().collect())
    }
}
