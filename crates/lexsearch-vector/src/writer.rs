//! Loads corpus records into their LanceDB tables.
use anyhow::{bail, Result};
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use std::sync::Arc;

use lexsearch_core::CorpusRecord;

use crate::schema::CorpusSchema;
use crate::store::LanceStore;

const BATCH_SIZE: usize = 1000;

pub struct CorpusWriter {
    store: Arc<LanceStore>,
}

impl CorpusWriter {
    pub fn new(store: Arc<LanceStore>) -> Self {
        Self { store }
    }

    /// Appends `records` to the corpus table, creating it on first write.
    /// Every record must carry an embedding of the store's dimension.
    pub async fn write(&self, schema: &CorpusSchema, records: &[CorpusRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        for r in records {
            if r.embedding.len() != self.store.dim() {
                bail!(
                    "record '{}' has {} dimensions, store expects {}",
                    r.identifier,
                    r.embedding.len(),
                    self.store.dim()
                );
            }
        }
        let mut written = 0usize;
        for chunk in records.chunks(BATCH_SIZE) {
            self.insert_batch(schema, chunk).await?;
            written += chunk.len();
        }
        tracing::info!(table = schema.table, written, "corpus records written");
        Ok(written)
    }

    async fn insert_batch(&self, schema: &CorpusSchema, records: &[CorpusRecord]) -> Result<()> {
        let record_batch = self.to_record_batch(schema, records)?;
        let arrow_schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), arrow_schema));
        let conn = self.store.connection();
        if self.store.has_table(schema.table).await? {
            conn.open_table(schema.table).execute().await?.add(reader).execute().await?;
        } else {
            conn.create_table(schema.table, reader).execute().await?;
        }
        Ok(())
    }

    fn to_record_batch(&self, schema: &CorpusSchema, records: &[CorpusRecord]) -> Result<RecordBatch> {
        let dim = i32::try_from(self.store.dim())?;
        let mut ids = Vec::new();
        let mut titles = Vec::new();
        let mut contents = Vec::new();
        let mut sources: Vec<Option<String>> = Vec::new();
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        for r in records {
            ids.push(r.identifier.clone());
            titles.push(r.title.clone());
            contents.push(r.content.clone());
            let blank = r.source.trim().is_empty();
            if blank && !schema.source_nullable {
                bail!("record '{}' has no {} value", r.identifier, schema.source);
            }
            sources.push(if blank { None } else { Some(r.source.clone()) });
            vectors.push(Some(r.embedding.iter().map(|&x| Some(x)).collect()));
        }
        let batch = RecordBatch::try_new(
            schema.arrow_schema(dim),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(titles)),
                Arc::new(StringArray::from(contents)),
                Arc::new(StringArray::from(sources)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                    vectors.into_iter(),
                    dim,
                )),
            ],
        )?;
        Ok(batch)
    }
}
