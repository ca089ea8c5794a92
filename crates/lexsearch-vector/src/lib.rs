//! lexsearch-vector
//!
//! LanceDB storage for the four corpora: table layouts, the shared store
//! handle, one [`SourceAdapter`](lexsearch_core::SourceAdapter) per corpus,
//! an in-memory adapter, and a record writer.

pub mod adapter;
pub mod memory;
pub mod schema;
pub mod store;
pub mod writer;

pub use adapter::{corpus_adapters, LanceCorpusAdapter};
pub use memory::InMemoryCorpus;
pub use schema::CorpusSchema;
pub use store::{CorpusStatus, LanceStore};
pub use writer::CorpusWriter;
