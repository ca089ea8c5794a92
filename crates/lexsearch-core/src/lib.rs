#![deny(dead_code)]
#![deny(unused_variables)]

pub mod config;
pub mod error;
pub mod similarity;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Embedder, SourceAdapter};
pub use types::{CorpusRecord, CorpusTag, QueryVector, RankedResult, SearchRequest, SearchResponse};
