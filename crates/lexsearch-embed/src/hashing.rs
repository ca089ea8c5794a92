use anyhow::Result;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use lexsearch_core::similarity::l2_normalize;
use lexsearch_core::traits::Embedder;

/// Deterministic feature-hashing embedder.
///
/// Each lowercased token lands in one bucket with a hash-derived sign and
/// weight, and the result is L2-normalised. Texts sharing vocabulary end up
/// close under cosine; no model weights are needed.
pub struct HashEmbedder {
    dim: usize,
    max_len: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, max_len: 256 }
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .take(self.max_len);
        for token in tokens {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let sign = if h & 1 == 0 { 1.0 } else { -1.0 };
            let weight = 0.5 + ((h >> 32) as u32) as f32 / (u32::MAX as f32) * 0.5;
            v[idx] += sign * weight;
        }
        l2_normalize(&mut v);
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.dim == 0 {
            anyhow::bail!("hash embedder dimension must be positive");
        }
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
