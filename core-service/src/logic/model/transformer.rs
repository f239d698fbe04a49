//! Transformer backend - WordPiece tokenization + ONNX Runtime forward pass.
//!
//! Artifact directory layout:
//! - `model.onnx`: exported sequence classifier, inputs `input_ids` and
//!   `attention_mask` (i64, shape `[1, seq]`), first output = logits `[1, labels]`
//! - `tokenizer.json` (preferred) or `vocab.txt`

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::{Tokenizer, TruncationDirection, TruncationParams};

use crate::constants::{
    CLS_TOKEN, ONNX_MODEL_FILE, SEP_TOKEN, TOKENIZER_JSON_FILE, UNK_TOKEN, VOCAB_FILE,
};
use crate::error::{LoadError, PredictError};
use super::loader::Scorer;

// ============================================================================
// TOKENIZATION
// ============================================================================

/// Token ids and attention mask for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedText {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

impl EncodedText {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Tokenizer with fixed maximum length; longer input is truncated from the right.
pub struct TextEncoder {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl TextEncoder {
    /// Load `tokenizer.json`, falling back to building WordPiece from `vocab.txt`.
    pub fn from_dir(dir: &Path, max_length: usize) -> Result<Self, LoadError> {
        let json_path = dir.join(TOKENIZER_JSON_FILE);
        let tokenizer = if json_path.exists() {
            log::debug!("Loading tokenizer from {}", json_path.display());
            Tokenizer::from_file(&json_path)
                .map_err(|e| LoadError::corrupt(json_path.display().to_string(), e))?
        } else {
            let vocab_path = dir.join(VOCAB_FILE);
            if !vocab_path.exists() {
                return Err(LoadError::ArtifactMissing(format!(
                    "{} (no {} or {})",
                    dir.display(),
                    TOKENIZER_JSON_FILE,
                    VOCAB_FILE
                )));
            }
            log::debug!("Building WordPiece tokenizer from {}", vocab_path.display());
            build_wordpiece(&vocab_path)?
        };

        Self::new(tokenizer, max_length)
            .map_err(|e| LoadError::corrupt(dir.display().to_string(), e))
    }

    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self, String> {
        if max_length < 2 {
            return Err(format!("max_length {} leaves no room for special tokens", max_length));
        }
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                direction: TruncationDirection::Right,
                ..Default::default()
            }))
            .map_err(|e| e.to_string())?;
        tokenizer.with_padding(None);
        Ok(Self { tokenizer, max_length })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn encode(&self, text: &str) -> Result<EncodedText, PredictError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| PredictError::InferenceFailure(format!("tokenization failed: {}", e)))?;

        Ok(EncodedText {
            input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
            attention_mask: encoding.get_attention_mask().iter().map(|&m| m as i64).collect(),
        })
    }
}

/// Uncased BERT pipeline over a plain vocabulary file.
fn build_wordpiece(vocab_path: &Path) -> Result<Tokenizer, LoadError> {
    let location = vocab_path.display().to_string();
    let wordpiece = WordPiece::from_file(&vocab_path.to_string_lossy())
        .unk_token(UNK_TOKEN.to_string())
        .build()
        .map_err(|e| LoadError::corrupt(&location, e))?;

    let mut tokenizer = Tokenizer::new(wordpiece);
    let cls = tokenizer
        .token_to_id(CLS_TOKEN)
        .ok_or_else(|| LoadError::corrupt(&location, format!("vocabulary lacks {}", CLS_TOKEN)))?;
    let sep = tokenizer
        .token_to_id(SEP_TOKEN)
        .ok_or_else(|| LoadError::corrupt(&location, format!("vocabulary lacks {}", SEP_TOKEN)))?;

    tokenizer.with_normalizer(Some(BertNormalizer::default()));
    tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
    tokenizer.with_post_processor(Some(BertProcessing::new(
        (SEP_TOKEN.to_string(), sep),
        (CLS_TOKEN.to_string(), cls),
    )));
    Ok(tokenizer)
}

// ============================================================================
// ONNX NETWORK
// ============================================================================

/// ONNX sequence classifier. `Session::run` needs exclusive access.
pub struct OnnxNetwork {
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxNetwork {
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let location = path.display().to_string();
        if !path.exists() {
            return Err(LoadError::ArtifactMissing(location));
        }

        log::info!("Loading ONNX model from: {}", location);
        let session = Session::builder()
            .map_err(|e| LoadError::corrupt(&location, format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| LoadError::corrupt(&location, format!("optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| LoadError::corrupt(&location, e))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| LoadError::corrupt(&location, "no output defined"))?;

        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }

    /// Logits for one encoded sequence.
    pub fn forward(&self, encoded: &EncodedText) -> Result<Vec<f32>, PredictError> {
        let seq_len = encoded.len();
        let ids = Array2::<i64>::from_shape_vec((1, seq_len), encoded.input_ids.clone())
            .map_err(|e| PredictError::InferenceFailure(format!("array error: {}", e)))?;
        let mask = Array2::<i64>::from_shape_vec((1, seq_len), encoded.attention_mask.clone())
            .map_err(|e| PredictError::InferenceFailure(format!("array error: {}", e)))?;

        let ids = Value::from_array(ids)
            .map_err(|e| PredictError::InferenceFailure(format!("tensor error: {}", e)))?;
        let mask = Value::from_array(mask)
            .map_err(|e| PredictError::InferenceFailure(format!("tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs!["input_ids" => ids, "attention_mask" => mask])
            .map_err(|e| PredictError::InferenceFailure(format!("forward pass: {}", e)))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| PredictError::InferenceFailure("no output".to_string()))?;
        let (_, logits) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| PredictError::InferenceFailure(format!("extract error: {}", e)))?;

        Ok(logits.to_vec())
    }
}

// ============================================================================
// SCORER
// ============================================================================

/// Tokenizer + network bundle for both transformer families.
pub struct TransformerModel {
    encoder: TextEncoder,
    network: OnnxNetwork,
}

impl TransformerModel {
    pub fn from_dir(dir: &Path, max_length: usize) -> Result<Self, LoadError> {
        if !dir.is_dir() {
            return Err(LoadError::ArtifactMissing(dir.display().to_string()));
        }
        let network = OnnxNetwork::from_file(&dir.join(ONNX_MODEL_FILE))?;
        let encoder = TextEncoder::from_dir(dir, max_length)?;
        Ok(Self { encoder, network })
    }
}

impl Scorer for TransformerModel {
    fn decision(&self, text: &str) -> Result<Vec<f32>, PredictError> {
        let encoded = self.encoder.encode(text)?;
        self.network.forward(&encoded)
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }
}
