//! Query embedding plus concurrent fan-out over the selected corpora.
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lexsearch_core::config::RetrievalSettings;
use lexsearch_core::types::finalize_ranking;
use lexsearch_core::{CorpusTag, Embedder, Error, QueryVector, RankedResult, Result, SearchRequest, SearchResponse, SourceAdapter};

use crate::aggregator::aggregate;
use crate::router::SourceRouter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalOptions {
    pub default_max_results: usize,
    /// Per-corpus limits above this are clamped.
    pub max_limit: usize,
    pub embed_timeout: Duration,
    pub corpus_timeout: Duration,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self::from(&RetrievalSettings::default())
    }
}

impl From<&RetrievalSettings> for RetrievalOptions {
    fn from(s: &RetrievalSettings) -> Self {
        Self {
            default_max_results: s.default_max_results,
            max_limit: s.max_limit,
            embed_timeout: s.embed_timeout(),
            corpus_timeout: s.corpus_timeout(),
        }
    }
}

pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    adapters: BTreeMap<CorpusTag, Arc<dyn SourceAdapter>>,
    router: SourceRouter,
    options: RetrievalOptions,
}

impl RetrievalEngine {
    pub fn new(embedder: Arc<dyn Embedder>, options: RetrievalOptions) -> Self {
        Self { embedder, adapters: BTreeMap::new(), router: SourceRouter::new(), options }
    }

    /// Registers `adapter` for its corpus, replacing any previous one.
    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.insert(adapter.corpus(), adapter);
        self
    }

    pub fn with_adapters<I: IntoIterator<Item = Arc<dyn SourceAdapter>>>(self, adapters: I) -> Self {
        adapters.into_iter().fold(self, Self::with_adapter)
    }

    /// Convenience over [`semantic_search`](Self::semantic_search);
    /// `max_results` defaults to the configured value.
    pub async fn search(&self, query: &str, sources: Option<Vec<String>>, max_results: Option<usize>) -> Result<SearchResponse> {
        let request = SearchRequest {
            query: query.to_string(),
            sources,
            max_results: max_results.unwrap_or(self.options.default_max_results),
        };
        self.semantic_search(request).await
    }

    /// Embeds the query once and searches every resolved corpus concurrently.
    ///
    /// Fails only on an empty query, a zero limit, or an embedding failure.
    /// Corpus failures and timeouts are reported in the response `errors`.
    pub async fn semantic_search(&self, request: SearchRequest) -> Result<SearchResponse> {
        let SearchRequest { query, sources, max_results } = request;
        if query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }
        if max_results == 0 {
            return Err(Error::InvalidLimit(max_results));
        }
        let limit = if max_results > self.options.max_limit {
            tracing::debug!(requested = max_results, max = self.options.max_limit, "clamping max_results");
            self.options.max_limit
        } else {
            max_results
        };

        let resolution = self.router.resolve(sources.as_deref());
        if !resolution.unknown.is_empty() {
            tracing::debug!(unknown = ?resolution.unknown, "unknown sources ignored");
        }
        if resolution.is_empty() {
            return Ok(SearchResponse::empty(query));
        }

        tracing::debug!(%query, corpora = resolution.tags.len(), limit, "semantic search");
        let vector = self.embed(&query).await?;

        let vector = Arc::new(vector);
        let searches = resolution.tags.iter().map(|&corpus| {
            let vector = vector.clone();
            async move { (corpus, self.search_corpus(corpus, vector, limit).await) }
        });
        let mut per_source = BTreeMap::new();
        let mut failures = BTreeMap::new();
        for (corpus, outcome) in join_all(searches).await {
            match outcome {
                Ok(results) => {
                    per_source.insert(corpus, results);
                }
                Err(Error::CorpusUnavailable { reason, .. }) => {
                    tracing::warn!(%corpus, %reason, "corpus unavailable");
                    failures.insert(corpus, reason);
                }
                Err(other) => {
                    tracing::warn!(%corpus, error = %other, "corpus search failed");
                    failures.insert(corpus, other.to_string());
                }
            }
        }
        Ok(aggregate(&query, per_source, failures))
    }

    async fn embed(&self, query: &str) -> Result<QueryVector> {
        let embedder = self.embedder.clone();
        let text = query.to_string();
        let task = tokio::task::spawn_blocking(move || embedder.embed_one(&text));
        let started = Instant::now();
        let raw = match tokio::time::timeout(self.options.embed_timeout, task).await {
            Err(_) => {
                tracing::warn!(timeout = ?self.options.embed_timeout, "query embedding timed out");
                return Err(Error::EmbeddingTimeout(self.options.embed_timeout));
            }
            Ok(Err(join)) => return Err(Error::EmbeddingUnavailable(format!("embedding task failed: {join}"))),
            Ok(Ok(Err(e))) => return Err(Error::EmbeddingUnavailable(e.to_string())),
            Ok(Ok(Ok(raw))) => raw,
        };
        let expected = self.embedder.dim();
        if raw.len() != expected {
            return Err(Error::EmbeddingUnavailable(format!(
                "provider returned {} dimensions, expected {}",
                raw.len(),
                expected
            )));
        }
        tracing::debug!(elapsed = ?started.elapsed(), "query embedded");
        QueryVector::new(raw)
    }

    /// Runs one adapter on its own task so a slow or blocking store cannot
    /// hold up the other corpora; the task is aborted when its timeout fires.
    async fn search_corpus(&self, corpus: CorpusTag, vector: Arc<QueryVector>, limit: usize) -> Result<Vec<RankedResult>> {
        let unavailable = |reason: String| Error::CorpusUnavailable { corpus, reason };
        let adapter = self
            .adapters
            .get(&corpus)
            .cloned()
            .ok_or_else(|| unavailable("no adapter registered".to_string()))?;
        let started = Instant::now();
        let task = tokio::spawn(async move { adapter.search(&vector, limit).await });
        let abort = task.abort_handle();
        match tokio::time::timeout(self.options.corpus_timeout, task).await {
            Ok(Ok(Ok(results))) => {
                tracing::debug!(%corpus, hits = results.len(), elapsed = ?started.elapsed(), "corpus searched");
                Ok(finalize_ranking(results, limit))
            }
            Ok(Ok(Err(e))) => Err(unavailable(e.to_string())),
            Ok(Err(join)) => Err(unavailable(format!("search task failed: {join}"))),
            Err(_) => {
                abort.abort();
                Err(unavailable(format!("timed out after {:?}", self.options.corpus_timeout)))
            }
        }
    }
}
