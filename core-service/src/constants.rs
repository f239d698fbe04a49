//! Central Configuration Constants
//!
//! Single source of truth for inference defaults.

/// Maximum token count fed to transformer models (DistilBERT limit)
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Multi-label decision threshold
pub const DEFAULT_MULTI_LABEL_THRESHOLD: f32 = 0.5;

/// ONNX graph file inside a transformer artifact directory
pub const ONNX_MODEL_FILE: &str = "model.onnx";

/// Tokenizer files inside a transformer artifact directory, in lookup order
pub const TOKENIZER_JSON_FILE: &str = "tokenizer.json";
pub const VOCAB_FILE: &str = "vocab.txt";

/// WordPiece special tokens
pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const UNK_TOKEN: &str = "[UNK]";

/// Core version
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
