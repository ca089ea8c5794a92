//! Embeddings over an OpenAI-compatible HTTP endpoint.
//!
//! Sends `{"model", "input"}` and expects `{"data": [{"index", "embedding"}]}`.
//! The API key is read once from the environment variable named in
//! `embedding.api_key_env`; a missing key sends no `Authorization` header,
//! which suits self-hosted endpoints.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use lexsearch_core::config::EmbeddingSettings;
use lexsearch_core::traits::Embedder;

pub struct HttpEmbedder {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dim: usize,
    max_len: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()?;
        let api_key = std::env::var(&settings.api_key_env).ok().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::debug!(var = %settings.api_key_env, "no API key in environment, sending unauthenticated requests");
        }
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key,
            dim: settings.dimension,
            max_len: settings.max_len,
        })
    }
}

impl Embedder for HttpEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&EmbeddingRequest { model: &self.model, input: texts });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .map_err(|e| anyhow!("embedding request to {} failed: {}", self.endpoint, e))?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            let excerpt: String = body.chars().take(200).collect();
            bail!("embedding provider returned {}: {}", status, excerpt);
        }
        parse_embeddings(&body, texts.len(), self.dim)
    }
}

/// Decodes a provider response, restoring input order by `index` and
/// checking the count and dimensionality of every vector.
pub fn parse_embeddings(body: &str, expected: usize, dim: usize) -> Result<Vec<Vec<f32>>> {
    let mut response: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| anyhow!("malformed embedding response: {}", e))?;
    if response.data.len() != expected {
        bail!("embedding provider returned {} vectors for {} inputs", response.data.len(), expected);
    }
    response.data.sort_by_key(|d| d.index);
    response
        .data
        .into_iter()
        .enumerate()
        .map(|(pos, datum)| {
            if datum.index != pos {
                bail!("embedding response is missing index {}", pos);
            }
            if datum.embedding.len() != dim {
                bail!("embedding {} has {} dimensions, expected {}", pos, datum.embedding.len(), dim);
            }
            Ok(datum.embedding)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_input_order_from_index() {
        let body = r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}],"model":"m"}"#;
        let vectors = parse_embeddings(body, 2, 2).expect("parse");
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn rejects_wrong_count() {
        let body = r#"{"data":[{"index":0,"embedding":[1.0,0.0]}]}"#;
        let err = parse_embeddings(body, 2, 2).expect_err("count mismatch");
        assert!(err.to_string().contains("1 vectors for 2 inputs"));
    }

    #[test]
    fn rejects_wrong_dimension() {
        let body = r#"{"data":[{"index":0,"embedding":[1.0,0.0,0.0]}]}"#;
        let err = parse_embeddings(body, 1, 2).expect_err("dim mismatch");
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn rejects_duplicate_indices() {
        let body = r#"{"data":[{"index":0,"embedding":[1.0]},{"index":0,"embedding":[0.5]}]}"#;
        assert!(parse_embeddings(body, 2, 1).is_err());
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_embeddings("<html>bad gateway</html>", 1, 2).expect_err("not json");
        assert!(err.to_string().contains("malformed"));
    }
}
