use std::sync::Arc;

use futures::future::BoxFuture;

use crate::types::{CorpusTag, QueryVector, RankedResult};

/// Turns text into fixed-dimension vectors.
///
/// Calls may block (model inference, HTTP); async callers should run them on
/// a blocking thread.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vectors"))
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dim(&self) -> usize { (**self).dim() }
    fn max_len(&self) -> usize { (**self).max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { (**self).embed_batch(texts) }
    fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> { (**self).embed_one(text) }
}

impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn dim(&self) -> usize { (**self).dim() }
    fn max_len(&self) -> usize { (**self).max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { (**self).embed_batch(texts) }
    fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> { (**self).embed_one(text) }
}

/// Nearest-neighbour lookup against a single corpus.
///
/// Implementations return at most `limit` results ordered by descending
/// similarity, already mapped into the common [`RankedResult`] shape. The
/// returned future runs on its own task; do the work inside it and await
/// rather than block.
pub trait SourceAdapter: Send + Sync {
    fn corpus(&self) -> CorpusTag;

    fn search<'a>(
        &'a self,
        vector: &'a QueryVector,
        limit: usize,
    ) -> BoxFuture<'a, anyhow::Result<Vec<RankedResult>>>;
}
