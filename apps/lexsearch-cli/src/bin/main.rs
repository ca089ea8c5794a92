use std::env;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use lexsearch_core::config::{Config, Settings};
use lexsearch_core::{CorpusRecord, CorpusTag, Embedder, SearchRequest};
use lexsearch_embed::build_embedder;
use lexsearch_retrieval::{RetrievalEngine, RetrievalOptions};
use lexsearch_vector::{corpus_adapters, CorpusSchema, CorpusWriter, LanceStore};

const USAGE: &str = "Usage:
  lexsearch search \"<query>\" [--sources act,rules,case_law,playbooks] [--max N]
  lexsearch status
  lexsearch index <corpus> <records.jsonl>";

/// One line of an index input file.
#[derive(Debug, Deserialize)]
struct SourceLine {
    identifier: String,
    title: String,
    content: String,
    #[serde(default)]
    source: Option<String>,
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn parse_search(args: &[String], settings: &Settings) -> anyhow::Result<SearchRequest> {
    let mut query = None;
    let mut sources = None;
    let mut max_results = settings.retrieval.default_max_results;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--sources" => {
                let list = it.next().ok_or_else(|| anyhow!("--sources needs a value"))?;
                sources = Some(list.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect());
            }
            "--max" => {
                let n = it.next().ok_or_else(|| anyhow!("--max needs a value"))?;
                max_results = n.parse().with_context(|| format!("invalid --max value '{n}'"))?;
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            text if query.is_none() => query = Some(text.to_string()),
            extra => bail!("unexpected argument '{extra}'"),
        }
    }
    let query = query.ok_or_else(|| anyhow!("missing query\n{USAGE}"))?;
    Ok(SearchRequest { query, sources, max_results })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,lance=warn,lancedb=warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let uri = settings.store.resolved_uri(config.base_dir());
    let dim = settings.embedding.dimension;
    let (cmd, args) = parse_args();
    let rt = tokio::runtime::Runtime::new()?;

    match cmd.as_str() {
        "search" => {
            let request = parse_search(&args, &settings)?;
            let embedder: Arc<dyn Embedder> = Arc::from(build_embedder(&settings.embedding, config.base_dir())?);
            let store = Arc::new(rt.block_on(LanceStore::open(&uri, dim))?);
            let engine = RetrievalEngine::new(embedder, RetrievalOptions::from(&settings.retrieval))
                .with_adapters(corpus_adapters(store));
            let response = rt.block_on(engine.semantic_search(request))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        "status" => {
            let store = rt.block_on(LanceStore::open(&uri, dim))?;
            println!("store: {} (dim {})", store.uri(), store.dim());
            for status in rt.block_on(store.status()) {
                match status.rows {
                    Ok(n) => println!("{:<10} {:<14} {} rows", status.corpus.as_str(), status.table, n),
                    Err(reason) => println!("{:<10} {:<14} unavailable: {}", status.corpus.as_str(), status.table, reason),
                }
            }
        }
        "index" => {
            let (corpus, path) = match args.as_slice() {
                [corpus, path] => (corpus.parse::<CorpusTag>()?, PathBuf::from(path)),
                _ => bail!("index needs <corpus> <records.jsonl>\n{USAGE}"),
            };
            let embedder = build_embedder(&settings.embedding, config.base_dir())?;
            let records = load_records(&path, corpus, embedder.as_ref())?;
            let store = Arc::new(rt.block_on(LanceStore::open(&uri, dim))?);
            let schema = CorpusSchema::for_tag(corpus);
            let written = rt.block_on(CorpusWriter::new(store).write(schema, &records))?;
            println!("indexed {} {} records into '{}'", written, corpus, schema.table);
        }
        _ => {
            eprintln!("Unknown command: {}\n{}", cmd, USAGE);
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Reads JSONL records and embeds `title` plus `content` in batches.
fn load_records(path: &Path, corpus: CorpusTag, embedder: &dyn Embedder) -> anyhow::Result<Vec<CorpusRecord>> {
    let file = std::fs::File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut lines = Vec::new();
    for (n, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: SourceLine = serde_json::from_str(&line).with_context(|| format!("{}:{}", path.display(), n + 1))?;
        lines.push(parsed);
    }
    let mut records = Vec::with_capacity(lines.len());
    for chunk in lines.chunks(32) {
        let texts: Vec<String> = chunk.iter().map(|l| format!("{}\n{}", l.title, l.content)).collect();
        let vectors = embedder.embed_batch(&texts)?;
        if vectors.len() != chunk.len() {
            bail!("embedder returned {} vectors for {} records", vectors.len(), chunk.len());
        }
        for (line, embedding) in chunk.iter().zip(vectors) {
            records.push(CorpusRecord {
                identifier: line.identifier.clone(),
                title: line.title.clone(),
                content: line.content.clone(),
                source: line.source.clone().unwrap_or_default(),
                embedding,
                corpus,
            });
        }
    }
    tracing::info!(count = records.len(), %corpus, "records embedded");
    Ok(records)
}
