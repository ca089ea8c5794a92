//! Domain types shared by embedders, corpus adapters and the retrieval engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::similarity::clamp_similarity;

/// Per-corpus result cap used when the caller does not supply one.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Identifies one of the knowledge corpora.
///
/// Serialized as its wire tag (`act`, `rules`, `case_law`, `playbooks`).
/// `Ord` follows declaration order, which is also the order results are
/// reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusTag {
    Act,
    Rules,
    CaseLaw,
    Playbooks,
}

impl CorpusTag {
    pub const ALL: [CorpusTag; 4] = [CorpusTag::Act, CorpusTag::Rules, CorpusTag::CaseLaw, CorpusTag::Playbooks];

    pub fn as_str(&self) -> &'static str {
        match self {
            CorpusTag::Act => "act",
            CorpusTag::Rules => "rules",
            CorpusTag::CaseLaw => "case_law",
            CorpusTag::Playbooks => "playbooks",
        }
    }

    /// Human label, used as the provenance fallback when a record has none.
    pub fn display_name(&self) -> &'static str {
        match self {
            CorpusTag::Act => "Act",
            CorpusTag::Rules => "Rules",
            CorpusTag::CaseLaw => "Case law",
            CorpusTag::Playbooks => "Playbook",
        }
    }
}

impl fmt::Display for CorpusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorpusTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase();
        CorpusTag::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| Error::InvalidSourceTag(s.to_string()))
    }
}

/// A query embedding. Always non-empty with finite components.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVector(Vec<f32>);

impl QueryVector {
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::EmbeddingUnavailable("embedder returned an empty vector".into()));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::EmbeddingUnavailable(format!("non-finite component at index {pos}")));
        }
        Ok(Self(values))
    }

    pub fn dim(&self) -> usize { self.0.len() }

    pub fn as_slice(&self) -> &[f32] { &self.0 }

    pub fn to_vec(&self) -> Vec<f32> { self.0.clone() }

    /// Fails unless this vector has exactly `expected` components.
    pub fn expect_dim(&self, expected: usize) -> Result<()> {
        if self.dim() == expected {
            Ok(())
        } else {
            Err(Error::DimensionMismatch { expected, actual: self.dim() })
        }
    }
}

/// A record stored in one corpus, already mapped out of its corpus schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub identifier: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub embedding: Vec<f32>,
    pub corpus: CorpusTag,
}

impl CorpusRecord {
    pub fn ranked(&self, similarity: f32) -> RankedResult {
        RankedResult {
            identifier: self.identifier.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            source: self.source.clone(),
            similarity,
        }
    }
}

/// A corpus record projected with its similarity to the query, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub identifier: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub similarity: f32,
}

/// Clamps scores into `[0, 1]`, orders by similarity (highest first) and keeps
/// at most `limit` entries.
///
/// The sort is stable, so results the store already returned in order keep
/// their relative positions on ties.
pub fn finalize_ranking(mut results: Vec<RankedResult>, limit: usize) -> Vec<RankedResult> {
    for r in &mut results {
        r.similarity = clamp_similarity(r.similarity);
    }
    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    results.truncate(limit);
    results
}

/// A semantic search request as received from a calling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize { DEFAULT_MAX_RESULTS }

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), sources: None, max_results: DEFAULT_MAX_RESULTS }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// The aggregated answer to one search.
///
/// `results` holds an entry for every corpus that was searched, including
/// ones that failed (with an empty list). Failed corpora are also listed in
/// `errors`, which is omitted from JSON when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: BTreeMap<CorpusTag, Vec<RankedResult>>,
    pub total_results: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<CorpusTag, String>,
}

impl SearchResponse {
    pub fn empty(query: impl Into<String>) -> Self {
        Self { query: query.into(), results: BTreeMap::new(), total_results: 0, errors: BTreeMap::new() }
    }

    pub fn results_for(&self, corpus: CorpusTag) -> &[RankedResult] {
        self.results.get(&corpus).map(Vec::as_slice).unwrap_or(&[])
    }

    /// False when the corpus was searched but could not be reached.
    pub fn is_available(&self, corpus: CorpusTag) -> bool {
        self.results.contains_key(&corpus) && !self.errors.contains_key(&corpus)
    }

    pub fn searched(&self) -> impl Iterator<Item = CorpusTag> + '_ {
        self.results.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, similarity: f32) -> RankedResult {
        RankedResult {
            identifier: id.into(),
            title: id.into(),
            content: String::new(),
            source: "test".into(),
            similarity,
        }
    }

    #[test]
    fn tag_parsing_is_case_insensitive_and_trimmed() {
        assert_eq!(" Case_Law ".parse::<CorpusTag>().ok(), Some(CorpusTag::CaseLaw));
        assert_eq!("PLAYBOOKS".parse::<CorpusTag>().ok(), Some(CorpusTag::Playbooks));
        assert!(matches!("caselaw".parse::<CorpusTag>(), Err(Error::InvalidSourceTag(t)) if t == "caselaw"));
    }

    #[test]
    fn tag_display_round_trips_through_from_str() {
        for tag in CorpusTag::ALL {
            assert_eq!(tag.to_string().parse::<CorpusTag>().ok(), Some(tag));
        }
    }

    #[test]
    fn query_vector_rejects_empty_and_non_finite() {
        assert!(QueryVector::new(vec![]).is_err());
        assert!(QueryVector::new(vec![0.1, f32::NAN]).is_err());
        assert!(QueryVector::new(vec![0.1, f32::INFINITY]).is_err());
        let v = QueryVector::new(vec![0.5, 0.5]).expect("valid vector");
        assert_eq!(v.dim(), 2);
        assert!(matches!(v.expect_dim(3), Err(Error::DimensionMismatch { expected: 3, actual: 2 })));
    }

    #[test]
    fn finalize_ranking_sorts_descending_and_truncates() {
        let ranked = finalize_ranking(vec![hit("a", 0.2), hit("b", 0.9), hit("c", 0.5), hit("d", 0.9)], 3);
        let ids: Vec<&str> = ranked.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "c"]);
    }

    #[test]
    fn finalize_ranking_clamps_scores_before_sorting() {
        let ranked = finalize_ranking(vec![hit("nan", f32::NAN), hit("low", 0.3), hit("over", 1.3), hit("neg", -0.5)], 4);
        let ids: Vec<&str> = ranked.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["over", "low", "nan", "neg"]);
        let scores: Vec<f32> = ranked.iter().map(|r| r.similarity).collect();
        assert_eq!(scores, vec![1.0, 0.3, 0.0, 0.0]);
    }

    #[test]
    fn request_defaults_when_decoded_from_json() {
        let req: SearchRequest = serde_json::from_str(r#"{"query":"inquiry timeline"}"#).expect("decode");
        assert_eq!(req.max_results, DEFAULT_MAX_RESULTS);
        assert!(req.sources.is_none());
    }

    #[test]
    fn response_omits_errors_when_every_corpus_answered() {
        let mut resp = SearchResponse::empty("q");
        resp.results.insert(CorpusTag::Act, vec![hit("s1", 0.8)]);
        resp.total_results = 1;
        let json = serde_json::to_value(&resp).expect("encode");
        assert!(json.get("errors").is_none());
        assert_eq!(json["results"]["act"][0]["identifier"], "s1");
        assert!(resp.is_available(CorpusTag::Act));
        assert!(!resp.is_available(CorpusTag::Rules));
    }
}
