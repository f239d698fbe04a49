//! Output heads: turn raw decision values into scores in [0, 1].

use ndarray::Array1;

use super::types::ModelFamily;

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let values = Array1::from(logits.to_vec());
    let max = values.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let exp = values.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    if !sum.is_finite() || sum <= 0.0 {
        let uniform = 1.0 / logits.len() as f32;
        return vec![uniform; logits.len()];
    }
    (exp / sum).to_vec()
}

pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Index of the largest score; ties go to the lowest index.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            Some((_, b)) if s <= b => {}
            _ if s.is_nan() => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

/// Scores for a family given its raw outputs and expected label count.
///
/// Linear models trained on two classes emit one decision value for the
/// positive class; it expands to `[1 - p, p]`.
pub fn scores_for(family: ModelFamily, raw: &[f32], label_count: usize) -> Option<Vec<f32>> {
    let scores = match family {
        ModelFamily::BaselineLinear if raw.len() == 1 && label_count == 2 => {
            let p = sigmoid(raw[0]);
            vec![1.0 - p, p]
        }
        ModelFamily::BaselineLinear | ModelFamily::TransformerSingleLabel => softmax(raw),
        ModelFamily::TransformerMultiLabel => raw.iter().map(|&x| sigmoid(x)).collect(),
    };
    (scores.len() == label_count).then_some(scores)
}
