//! LanceDB-backed corpus adapters.
use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

use lexsearch_core::similarity::similarity_from_distance;
use lexsearch_core::types::finalize_ranking;
use lexsearch_core::{CorpusTag, QueryVector, RankedResult, SourceAdapter};

use crate::schema::{CorpusSchema, DISTANCE_COLUMN};
use crate::store::LanceStore;

/// Searches one corpus table in a shared [`LanceStore`].
pub struct LanceCorpusAdapter {
    store: Arc<LanceStore>,
    schema: CorpusSchema,
}

impl LanceCorpusAdapter {
    pub fn new(store: Arc<LanceStore>, schema: CorpusSchema) -> Self {
        Self { store, schema }
    }

    pub fn act(store: Arc<LanceStore>) -> Self { Self::new(store, crate::schema::ACT_SECTIONS) }
    pub fn rules(store: Arc<LanceStore>) -> Self { Self::new(store, crate::schema::RULE_SECTIONS) }
    pub fn case_law(store: Arc<LanceStore>) -> Self { Self::new(store, crate::schema::CASE_LAW) }
    pub fn playbooks(store: Arc<LanceStore>) -> Self { Self::new(store, crate::schema::PLAYBOOKS) }

    pub fn schema(&self) -> &CorpusSchema {
        &self.schema
    }

    async fn run(&self, vector: &QueryVector, limit: usize) -> Result<Vec<RankedResult>> {
        vector.expect_dim(self.store.dim())?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        let batches = self
            .store
            .nearest(self.schema.table, vector.as_slice(), &self.schema.projection(), limit)
            .await?;
        let mut results = Vec::new();
        for batch in &batches {
            self.map_batch(batch, &mut results)?;
        }
        tracing::debug!(corpus = %self.schema.corpus, hits = results.len(), "corpus search done");
        Ok(finalize_ranking(results, limit))
    }

    fn map_batch(&self, batch: &RecordBatch, out: &mut Vec<RankedResult>) -> Result<()> {
        let ids = string_column(batch, self.schema.identifier)?;
        let titles = string_column(batch, self.schema.title)?;
        let contents = string_column(batch, self.schema.content)?;
        let sources = string_column(batch, self.schema.source)?;
        let distances = batch
            .column_by_name(DISTANCE_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| anyhow!("missing {} column", DISTANCE_COLUMN))?;
        for i in 0..batch.num_rows() {
            let source = if sources.is_null(i) {
                self.schema.corpus.display_name().to_string()
            } else {
                sources.value(i).to_string()
            };
            out.push(RankedResult {
                identifier: ids.value(i).to_string(),
                title: titles.value(i).to_string(),
                content: contents.value(i).to_string(),
                source,
                similarity: similarity_from_distance(distances.value(i)),
            });
        }
        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("missing {} column", name))
}

impl SourceAdapter for LanceCorpusAdapter {
    fn corpus(&self) -> CorpusTag {
        self.schema.corpus
    }

    fn search<'a>(&'a self, vector: &'a QueryVector, limit: usize) -> BoxFuture<'a, Result<Vec<RankedResult>>> {
        self.run(vector, limit).boxed()
    }
}

/// One adapter per corpus, all sharing `store`.
pub fn corpus_adapters(store: Arc<LanceStore>) -> Vec<Arc<dyn SourceAdapter>> {
    CorpusTag::ALL
        .iter()
        .map(|tag| Arc::new(LanceCorpusAdapter::new(store.clone(), *CorpusSchema::for_tag(*tag))) as Arc<dyn SourceAdapter>)
        .collect()
}
