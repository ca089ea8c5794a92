//! Cosine helpers shared by the in-memory corpus and the embedders.

use crate::error::{Error, Result};

/// Cosine similarity in `[-1, 1]`. Zero-norm inputs score 0.
///
/// Vectors of different length are an error, never truncated or padded.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch { expected: a.len(), actual: b.len() });
    }
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0))
}

/// Cosine distance `1 - cos`, in `[0, 2]`, as vector stores report it.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    Ok(1.0 - cosine_similarity(a, b)?)
}

/// Maps a cosine distance onto the `[0, 1]` similarity scale.
///
/// Identical vectors score 1.0; orthogonal or opposed vectors score 0.0.
pub fn similarity_from_distance(distance: f32) -> f32 {
    clamp_similarity(1.0 - distance)
}

/// Forces a score into `[0, 1]`; NaN becomes 0.0.
pub fn clamp_similarity(score: f32) -> f32 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
    for x in v.iter_mut() {
        *x /= norm;
    }
}
