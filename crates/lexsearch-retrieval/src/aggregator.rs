use std::collections::BTreeMap;

use lexsearch_core::{CorpusTag, RankedResult, SearchResponse};

/// Assembles the response from per-corpus lists.
///
/// Lists are copied as-is; scores are corpus-local and never re-ranked
/// across corpora. Every failed corpus gets an empty list plus an `errors`
/// entry.
pub fn aggregate(
    query: &str,
    per_source: BTreeMap<CorpusTag, Vec<RankedResult>>,
    failures: BTreeMap<CorpusTag, String>,
) -> SearchResponse {
    let mut results = per_source;
    for corpus in failures.keys() {
        results.entry(*corpus).or_default();
    }
    let total_results = results.values().map(Vec::len).sum();
    SearchResponse { query: query.to_string(), results, total_results, errors: failures }
}
