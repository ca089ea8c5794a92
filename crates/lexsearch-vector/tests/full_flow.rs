use std::sync::Arc;

use lexsearch_core::traits::Embedder;
use lexsearch_core::{CorpusRecord, CorpusTag, QueryVector, SourceAdapter};
use lexsearch_embed::HashEmbedder;
use lexsearch_vector::schema::{ACT_SECTIONS, PLAYBOOKS};
use lexsearch_vector::{corpus_adapters, CorpusWriter, LanceCorpusAdapter, LanceStore};
use tempfile::TempDir;

const DIM: usize = 16;

fn record(embedder: &HashEmbedder, corpus: CorpusTag, id: &str, title: &str, content: &str, source: &str) -> CorpusRecord {
    CorpusRecord {
        identifier: id.into(),
        title: title.into(),
        content: content.into(),
        source: source.into(),
        embedding: embedder.embed_one(content).expect("embed"),
        corpus,
    }
}

async fn open_store(tmp: &TempDir) -> Arc<LanceStore> {
    let uri = tmp.path().to_string_lossy().to_string();
    Arc::new(LanceStore::open(&uri, DIM).await.expect("open store"))
}

fn query(embedder: &HashEmbedder, text: &str) -> QueryVector {
    QueryVector::new(embedder.embed_one(text).unwrap()).unwrap()
}

#[tokio::test]
async fn act_sections_round_trip_through_lance() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;
    let e = HashEmbedder::new(DIM);
    let records = vec![
        record(&e, CorpusTag::Act, "s12", "Inquiry period", "inquiry timeline", "Act s. 12"),
        record(&e, CorpusTag::Act, "s40", "Parking", "parking permits for visitors", "Act s. 40"),
        record(&e, CorpusTag::Act, "s7", "Notices", "notice must be served in writing", "Act s. 7"),
    ];
    let written = CorpusWriter::new(store.clone()).write(&ACT_SECTIONS, &records).await.expect("write");
    assert_eq!(written, 3);
    assert_eq!(store.count_rows("act_sections").await.unwrap(), 3);

    let adapter = LanceCorpusAdapter::act(store.clone());
    assert_eq!(adapter.corpus(), CorpusTag::Act);
    let q = query(&e, "Inquiry timeline");
    let hits = adapter.search(&q, 2).await.expect("search");

    assert_eq!(hits.len(), 2, "limit applies per corpus");
    assert_eq!(hits[0].identifier, "s12");
    assert_eq!(hits[0].title, "Inquiry period");
    assert_eq!(hits[0].source, "Act s. 12");
    assert!(hits[0].similarity > 0.999, "identical vector scores ~1, got {}", hits[0].similarity);
    for w in hits.windows(2) {
        assert!(w[0].similarity >= w[1].similarity);
    }
    for h in &hits {
        assert!((0.0..=1.0).contains(&h.similarity));
    }
}

#[tokio::test]
async fn missing_playbook_source_falls_back_to_display_name() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;
    let e = HashEmbedder::new(DIM);
    let records = vec![
        record(&e, CorpusTag::Playbooks, "pb-1", "Handling inquiries", "respond to an inquiry within ten days", ""),
        record(&e, CorpusTag::Playbooks, "pb-2", "Appeals", "lodging an appeal", "Appeals Guide 2023"),
    ];
    CorpusWriter::new(store.clone()).write(&PLAYBOOKS, &records).await.expect("write");

    let hits = LanceCorpusAdapter::playbooks(store).search(&query(&e, "respond to an inquiry within ten days"), 5).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].identifier, "pb-1");
    assert_eq!(hits[0].source, "Playbook");
    assert_eq!(hits[1].source, "Appeals Guide 2023");
}

#[tokio::test]
async fn query_dimension_mismatch_is_an_error() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;
    let e = HashEmbedder::new(DIM);
    CorpusWriter::new(store.clone())
        .write(&ACT_SECTIONS, &[record(&e, CorpusTag::Act, "s1", "Title", "text", "s. 1")])
        .await
        .unwrap();

    let short = QueryVector::new(vec![0.5; DIM / 2]).unwrap();
    let err = LanceCorpusAdapter::act(store).search(&short, 3).await.expect_err("mismatch");
    assert!(err.to_string().contains("expected 16, got 8"), "{err}");
}

#[tokio::test]
async fn missing_table_fails_only_that_corpus() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;
    let e = HashEmbedder::new(DIM);
    CorpusWriter::new(store.clone())
        .write(&ACT_SECTIONS, &[record(&e, CorpusTag::Act, "s1", "Title", "inquiry timeline", "s. 1")])
        .await
        .unwrap();

    let q = query(&e, "inquiry timeline");
    for adapter in corpus_adapters(store.clone()) {
        let outcome = adapter.search(&q, 5).await;
        match adapter.corpus() {
            CorpusTag::Act => assert_eq!(outcome.unwrap().len(), 1),
            other => assert!(outcome.is_err(), "{other} has no table"),
        }
    }

    let status = store.status().await;
    assert_eq!(status.len(), 4);
    assert_eq!(status[0].corpus, CorpusTag::Act);
    assert_eq!(status[0].rows, Ok(1));
    assert!(status[1..].iter().all(|s| s.rows.is_err()));
}

#[tokio::test]
async fn writer_validates_records() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;
    let e = HashEmbedder::new(DIM);
    let writer = CorpusWriter::new(store.clone());

    let mut wrong_dim = record(&e, CorpusTag::Act, "s1", "T", "text", "s. 1");
    wrong_dim.embedding.truncate(4);
    assert!(writer.write(&ACT_SECTIONS, &[wrong_dim]).await.is_err());

    let no_citation = record(&e, CorpusTag::Act, "s2", "T", "text", "  ");
    let err = writer.write(&ACT_SECTIONS, &[no_citation]).await.expect_err("citation required");
    assert!(err.to_string().contains("citation"));
    assert!(!store.has_table("act_sections").await.unwrap());
}
