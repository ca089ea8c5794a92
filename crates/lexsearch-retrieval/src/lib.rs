//! lexsearch-retrieval
//!
//! Routes a query to the requested corpora, searches them concurrently and
//! aggregates the per-corpus rankings into one [`SearchResponse`](lexsearch_core::SearchResponse).

pub mod aggregator;
pub mod engine;
pub mod router;

pub use aggregator::aggregate;
pub use engine::{RetrievalEngine, RetrievalOptions};
pub use router::{Resolution, SourceRouter};
