//! Shared LanceDB handle.
//!
//! One [`LanceStore`] is opened per process and handed to every corpus
//! adapter; it is read-only at query time.
use anyhow::{anyhow, Result};
use arrow_array::RecordBatch;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{connect, Connection, DistanceType};

use lexsearch_core::CorpusTag;

use crate::schema::{CorpusSchema, EMBEDDING_COLUMN};

pub struct LanceStore {
    conn: Connection,
    uri: String,
    dim: usize,
}

/// Row count for one corpus table, or why it could not be read.
#[derive(Debug)]
pub struct CorpusStatus {
    pub corpus: CorpusTag,
    pub table: &'static str,
    pub rows: std::result::Result<usize, String>,
}

impl LanceStore {
    pub async fn open(uri: &str, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(anyhow!("vector dimension must be positive"));
        }
        let conn = connect(uri).execute().await?;
        tracing::info!(uri, dim, "opened vector store");
        Ok(Self { conn, uri: uri.to_string(), dim })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Dimensionality every stored and queried vector must have.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub async fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.conn.table_names().execute().await?)
    }

    pub async fn has_table(&self, name: &str) -> Result<bool> {
        Ok(self.table_names().await?.iter().any(|n| n == name))
    }

    pub async fn count_rows(&self, table: &str) -> Result<usize> {
        let tbl = self.conn.open_table(table).execute().await?;
        Ok(tbl.count_rows(None).await?)
    }

    /// Cosine nearest-neighbour query returning the projected columns plus
    /// `_distance`, ascending by distance.
    pub async fn nearest(&self, table: &str, vector: &[f32], columns: &[&str], k: usize) -> Result<Vec<RecordBatch>> {
        let tbl = self
            .conn
            .open_table(table)
            .execute()
            .await
            .map_err(|e| anyhow!("cannot open table '{}': {}", table, e))?;
        let mut stream = tbl
            .vector_search(vector.to_vec())?
            .column(EMBEDDING_COLUMN)
            .distance_type(DistanceType::Cosine)
            .select(Select::columns(columns))
            .limit(k)
            .execute()
            .await?;
        let mut batches = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            batches.push(batch);
        }
        Ok(batches)
    }

    pub async fn status(&self) -> Vec<CorpusStatus> {
        let mut out = Vec::with_capacity(CorpusTag::ALL.len());
        for corpus in CorpusTag::ALL {
            let schema = CorpusSchema::for_tag(corpus);
            let rows = match self.has_table(schema.table).await {
                Ok(true) => self.count_rows(schema.table).await.map_err(|e| e.to_string()),
                Ok(false) => Err(format!("table '{}' does not exist", schema.table)),
                Err(e) => Err(e.to_string()),
            };
            out.push(CorpusStatus { corpus, table: schema.table, rows });
        }
        out
    }
}
