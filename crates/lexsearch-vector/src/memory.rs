use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;

use lexsearch_core::similarity::{cosine_distance, similarity_from_distance};
use lexsearch_core::types::finalize_ranking;
use lexsearch_core::{CorpusRecord, CorpusTag, Error, QueryVector, RankedResult, SourceAdapter};

/// Brute-force cosine search over records held in memory.
///
/// Useful for tests and small fixture corpora. Records must match the corpus
/// dimension; inserted records are re-tagged into this corpus.
pub struct InMemoryCorpus {
    corpus: CorpusTag,
    dim: usize,
    records: Vec<CorpusRecord>,
}

impl InMemoryCorpus {
    pub fn new(corpus: CorpusTag, dim: usize) -> Self {
        Self { corpus, dim, records: Vec::new() }
    }

    pub fn insert(&mut self, mut record: CorpusRecord) -> lexsearch_core::Result<()> {
        if record.embedding.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: record.embedding.len() });
        }
        record.corpus = self.corpus;
        self.records.push(record);
        Ok(())
    }

    pub fn with_records<I>(mut self, records: I) -> lexsearch_core::Result<Self>
    where
        I: IntoIterator<Item = CorpusRecord>,
    {
        for r in records {
            self.insert(r)?;
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn rank(&self, vector: &QueryVector, limit: usize) -> Result<Vec<RankedResult>> {
        vector.expect_dim(self.dim)?;
        let mut scored = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let d = cosine_distance(vector.as_slice(), &record.embedding)?;
            scored.push(record.ranked(similarity_from_distance(d)));
        }
        Ok(finalize_ranking(scored, limit))
    }
}

impl SourceAdapter for InMemoryCorpus {
    fn corpus(&self) -> CorpusTag {
        self.corpus
    }

    fn search<'a>(&'a self, vector: &'a QueryVector, limit: usize) -> BoxFuture<'a, Result<Vec<RankedResult>>> {
        async move { self.rank(vector, limit) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, embedding: Vec<f32>) -> CorpusRecord {
        CorpusRecord {
            identifier: id.into(),
            title: format!("Title {id}"),
            content: format!("Content {id}"),
            source: "s. 1".into(),
            embedding,
            corpus: CorpusTag::Act,
        }
    }

    #[test]
    fn rejects_records_of_the_wrong_dimension() {
        let mut corpus = InMemoryCorpus::new(CorpusTag::Rules, 3);
        let err = corpus.insert(record("r1", vec![1.0, 0.0])).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
        assert!(corpus.is_empty());
    }

    #[tokio::test]
    async fn ranks_by_cosine_and_truncates() {
        let corpus = InMemoryCorpus::new(CorpusTag::Act, 2)
            .with_records(vec![
                record("orthogonal", vec![0.0, 1.0]),
                record("exact", vec![2.0, 0.0]),
                record("close", vec![1.0, 0.2]),
                record("opposite", vec![-1.0, 0.0]),
            ])
            .unwrap();
        let q = QueryVector::new(vec![1.0, 0.0]).unwrap();
        let hits = corpus.search(&q, 3).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.identifier.as_str()).collect();
        assert_eq!(ids, ["exact", "close", "orthogonal"]);
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(hits[2].similarity, 0.0);
    }

    #[tokio::test]
    async fn query_of_the_wrong_dimension_fails() {
        let corpus = InMemoryCorpus::new(CorpusTag::Act, 2).with_records(vec![record("a", vec![1.0, 0.0])]).unwrap();
        let q = QueryVector::new(vec![1.0, 0.0, 0.0]).unwrap();
        let err = corpus.search(&q, 5).await.unwrap_err();
        assert!(err.to_string().contains("dimension"), "{err}");
    }
}
