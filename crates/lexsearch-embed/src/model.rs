//! BGE-M3 query embedder running an XLM-RoBERTa backbone on candle.
//!
//! Expects a model directory holding `tokenizer.json`, `config.json` and
//! `pytorch_model.bin`. Output vectors are masked-mean pooled and
//! L2-normalised.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use lexsearch_core::config::resolve_with_base;
use lexsearch_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;

pub struct EmbeddingModel {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl EmbeddingModel {
    pub fn load(model_dir: &Path, dim: usize, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading BGE-M3 model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path)?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;

        tracing::info!(dim, max_len, "BGE-M3 model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros((1, self.max_len), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        if emb.len() != self.dim {
            return Err(anyhow!("model produced {} dimensions, expected {}", emb.len(), self.dim));
        }
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 {
            tracing::debug!(?elapsed, chars = text.len(), "slow embedding");
        }
        Ok(emb)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

/// Locates the model directory: configured path first, then `APP_MODEL_DIR`,
/// `MODEL_DIR`, `../models/bge-m3` and `models/bge-m3`.
pub fn resolve_model_dir(configured: Option<&str>, base: &Path) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = resolve_with_base(base, dir);
        if p.exists() {
            return Ok(p);
        }
        tracing::warn!(dir = %p.display(), "configured model_dir does not exist");
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() {
                tracing::debug!(var, dir = %p.display(), "model dir from environment");
                return Ok(p);
            }
        }
    }
    for candidate in ["../models/bge-m3", "models/bge-m3"] {
        let p = base.join(candidate);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(anyhow!(
        "Could not locate BGE-M3 model directory. Checked embedding.model_dir, APP_MODEL_DIR, MODEL_DIR, ../models/bge-m3, and models/bge-m3"
    ))
}
