use std::path::Path;
use tokenizers::{PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection, TruncationParams};

use super::error::ClassifierError;

/// Number of token positions the encoder was trained on.
pub const MAX_SEQUENCE_LENGTH: usize = 32;

const DEFAULT_PAD_TOKEN: &str = "[PAD]";

/// A fixed-length model input: token ids and the matching attention mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

impl TokenizedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of positions the encoder attends to, special tokens included.
    pub fn attended(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m != 0).count()
    }
}

/// Wraps a pretrained subword tokenizer so every encoding comes out at exactly
/// `max_length` positions: `[CLS] … [SEP]`, truncated on the right and padded on
/// the right with the tokenizer's pad token.
#[derive(Debug, Clone)]
pub struct SequenceTokenizer {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl SequenceTokenizer {
    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self, ClassifierError> {
        // Room for [CLS] and [SEP]
        if max_length < 2 {
            return Err(ClassifierError::ValidationError(format!(
                "Sequence length must be at least 2, got {}",
                max_length
            )));
        }

        let (pad_token, pad_id) = match tokenizer.get_padding() {
            Some(params) => (params.pad_token.clone(), params.pad_id),
            None => (
                DEFAULT_PAD_TOKEN.to_string(),
                tokenizer.token_to_id(DEFAULT_PAD_TOKEN).unwrap_or(0),
            ),
        };

        tokenizer.with_truncation(Some(TruncationParams {
            max_length,
            direction: TruncationDirection::Right,
            ..Default::default()
        }))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            direction: PaddingDirection::Right,
            pad_id,
            pad_token,
            ..Default::default()
        }));

        Ok(Self { tokenizer, max_length })
    }

    pub fn from_file<P: AsRef<Path>>(path: P, max_length: usize) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            ClassifierError::TokenizerError(format!("Failed to load tokenizer {:?}: {}", path, e))
        })?;
        Self::new(tokenizer, max_length)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn encode(&self, text: &str) -> Result<TokenizedInput, ClassifierError> {
        let encoding = self.tokenizer.encode(text, true)?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let attention_mask: Vec<i64> = encoding.get_attention_mask().iter().map(|&m| i64::from(m)).collect();

        if input_ids.len() != self.max_length || attention_mask.len() != self.max_length {
            return Err(ClassifierError::TokenizerError(format!(
                "Expected {} positions, tokenizer produced {}",
                self.max_length,
                input_ids.len()
            )));
        }

        Ok(TokenizedInput { input_ids, attention_mask })
    }

    /// Counts the positions the encoder will attend to for `text` after truncation.
    pub fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        self.encode(text).map(|input| input.attended())
    }
}
