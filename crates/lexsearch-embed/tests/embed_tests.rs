use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lexsearch_core::config::{EmbeddingProvider, EmbeddingSettings};
use lexsearch_core::traits::Embedder;
use lexsearch_embed::cache::cache_key;
use lexsearch_embed::{build_embedder, CachedEmbedder, HashEmbedder};

fn hash_settings(dim: usize, cache_capacity: u64) -> EmbeddingSettings {
    EmbeddingSettings { provider: EmbeddingProvider::Hash, dimension: dim, cache_capacity, ..Default::default() }
}

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = build_embedder(&hash_settings(1024, 0), Path::new(".")).expect("embedder");
    let texts = vec!["inquiry timeline".to_string(), "inquiry timeline".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let (v1, v2) = (&embs[0], &embs[1]);

    assert_eq!(v1.len(), 1024, "embedding dim follows settings");
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn cached_factory_output_matches_uncached() {
    let cached = build_embedder(&hash_settings(64, 16), Path::new(".")).expect("cached");
    let plain = HashEmbedder::new(64);
    assert_eq!(cached.dim(), 64);
    assert_eq!(cached.embed_one("appeal deadline").unwrap(), plain.embed_one("appeal deadline").unwrap());
}

#[test]
fn model_provider_without_weights_fails_cleanly() {
    let settings = EmbeddingSettings {
        provider: EmbeddingProvider::Model,
        model_dir: Some("/nonexistent/lexsearch/models".to_string()),
        ..Default::default()
    };
    let tmp = tempfile::TempDir::new().unwrap();
    if ["APP_MODEL_DIR", "MODEL_DIR", "APP_USE_FAKE_EMBEDDINGS"].iter().any(|v| std::env::var(v).is_ok()) { return; }
    let err = build_embedder(&settings, tmp.path()).err().expect("no model available");
    assert!(err.to_string().contains("BGE-M3"));
}

struct CountingEmbedder {
    inner: HashEmbedder,
    calls: Arc<AtomicUsize>,
    texts_seen: Arc<AtomicUsize>,
}

impl Embedder for CountingEmbedder {
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_seen.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

fn counting(dim: usize) -> (CountingEmbedder, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(AtomicUsize::new(0));
    (CountingEmbedder { inner: HashEmbedder::new(dim), calls: calls.clone(), texts_seen: seen.clone() }, calls, seen)
}

#[test]
fn cache_serves_repeat_queries_without_calling_inner() {
    let (inner, calls, _) = counting(32);
    let cached = CachedEmbedder::new(inner, 100, Duration::from_secs(60));

    let first = cached.embed_one("what is the inquiry timeline").unwrap();
    let second = cached.embed_one("what  is the   inquiry timeline ").unwrap();
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "re-spaced query is a cache hit");
    assert_eq!(cached.entry_count(), 1);
}

#[test]
fn cache_only_embeds_misses_in_a_batch() {
    let (inner, calls, seen) = counting(32);
    let cached = CachedEmbedder::new(inner, 100, Duration::from_secs(60));
    cached.embed_one("statute of limitations").unwrap();

    let batch = vec!["notice period".to_string(), "statute of limitations".to_string(), "hearing".to_string()];
    let out = cached.embed_batch(&batch).unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(seen.load(Ordering::SeqCst), 3, "one text on the first call, two misses on the second");
    assert_eq!(out[1], HashEmbedder::new(32).embed_one("statute of limitations").unwrap());
}

#[test]
fn cache_keys_ignore_whitespace_but_not_case() {
    assert_eq!(cache_key(" a  b "), cache_key("a b"));
    assert_ne!(cache_key("Act"), cache_key("act"));
}
