#![allow(dead_code)]

use ndarray::{array, Array1, Array2};
use spendsort::{ClassifierError, Encoder, LabelMap, LinearHead, TokenizedInput, TransactionClassifier};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::models::ModelWrapper;
use tokenizers::normalizers::bert::BertNormalizer;
use tokenizers::normalizers::NormalizerWrapper;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::pre_tokenizers::PreTokenizerWrapper;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::processors::PostProcessorWrapper;
use tokenizers::Tokenizer;

pub const VOCAB: &[&str] = &[
    "[PAD]", "[UNK]", "[CLS]", "[SEP]",
    "starbucks", "coffee", "shell", "gas", "netflix", "subscription", "uber", "trip",
    "#", "boom",
];

pub const CATEGORIES: &[&str] = &["Food & Dining", "Auto & Transport", "Entertainment"];

pub const HIDDEN_SIZE: usize = 4;

pub fn token_id(token: &str) -> u32 {
    VOCAB.iter().position(|t| *t == token).expect("token in vocab") as u32
}

/// Uncased BERT-style WordPiece tokenizer over [`VOCAB`].
pub fn tokenizer() -> Tokenizer {
    let vocab: HashMap<String, u32> = VOCAB.iter()
        .enumerate()
        .map(|(i, t)| (t.to_string(), i as u32))
        .collect();
    let model = WordPiece::builder()
        .vocab(vocab)
        .unk_token("[UNK]".to_string())
        .build()
        .expect("valid wordpiece model");

    let mut tokenizer = Tokenizer::new(ModelWrapper::WordPiece(model));
    tokenizer.with_normalizer(NormalizerWrapper::BertNormalizer(BertNormalizer::default()));
    tokenizer.with_pre_tokenizer(PreTokenizerWrapper::BertPreTokenizer(BertPreTokenizer));
    tokenizer.with_post_processor(PostProcessorWrapper::Bert(BertProcessing::new(
        ("[SEP]".to_string(), token_id("[SEP]")),
        ("[CLS]".to_string(), token_id("[CLS]")),
    )));
    tokenizer
}

/// Deterministic stand-in for the transformer: the "[CLS]" representation is the
/// sum of per-token embeddings over attended positions.
///
/// Dimensions: food, transport, entertainment, constant.
#[derive(Debug, Default)]
pub struct KeywordEncoder {
    /// Token that makes the encoder fail, to exercise error paths
    pub fail_on: Option<u32>,
}

impl KeywordEncoder {
    fn embedding(id: u32) -> Array1<f32> {
        match VOCAB[id as usize] {
            "starbucks" | "coffee" => array![1.0, 0.0, 0.0, 0.0],
            "shell" | "gas" | "uber" | "trip" => array![0.0, 1.0, 0.0, 0.0],
            "netflix" | "subscription" => array![0.0, 0.0, 1.0, 0.0],
            "[PAD]" => Array1::zeros(HIDDEN_SIZE),
            _ => array![0.0, 0.0, 0.0, 0.1],
        }
    }
}

impl Encoder for KeywordEncoder {
    fn encode(&self, input: &TokenizedInput) -> Result<Array1<f32>, ClassifierError> {
        let mut hidden = Array1::zeros(HIDDEN_SIZE);
        for (&id, &mask) in input.input_ids.iter().zip(input.attention_mask.iter()) {
            if mask == 0 {
                continue;
            }
            if Some(id as u32) == self.fail_on {
                return Err(ClassifierError::ModelError("simulated encoder failure".into()));
            }
            hidden += &Self::embedding(id as u32);
        }
        Ok(hidden)
    }
}

/// Picks the dominant keyword dimension; food wins on an empty description.
pub fn head() -> LinearHead {
    let weight = Array2::from_shape_vec(
        (CATEGORIES.len(), HIDDEN_SIZE),
        vec![
            2.0, 0.0, 0.0, 0.0,
            0.0, 2.0, 0.0, 0.0,
            0.0, 0.0, 2.0, 0.0,
        ],
    )
    .expect("valid head shape");
    LinearHead::new(weight, array![0.1, 0.0, 0.0]).expect("valid head")
}

pub fn head_json() -> String {
    r#"{"weight": [[2.0, 0.0, 0.0, 0.0], [0.0, 2.0, 0.0, 0.0], [0.0, 0.0, 2.0, 0.0]], "bias": [0.1, 0.0, 0.0]}"#
        .to_string()
}

pub fn label_map() -> LabelMap {
    LabelMap::from_pairs(CATEGORIES.iter().enumerate().map(|(i, c)| (*c, i))).expect("valid label map")
}

pub fn label_map_json() -> String {
    let map: HashMap<&str, usize> = CATEGORIES.iter().enumerate().map(|(i, c)| (*c, i)).collect();
    serde_json::to_string(&map).expect("serializable label map")
}

pub fn classifier_with(encoder: KeywordEncoder) -> TransactionClassifier {
    TransactionClassifier::builder()
        .with_tokenizer(tokenizer())
        .and_then(|b| b.with_encoder(Arc::new(encoder)))
        .map(|b| b.with_head(head()).with_label_map(label_map()))
        .and_then(|b| b.build())
        .expect("Failed to create classifier")
}

pub fn classifier() -> TransactionClassifier {
    classifier_with(KeywordEncoder::default())
}

/// Writes the tokenizer, head and label map (everything but the encoder) into `dir`.
pub fn write_artifacts(dir: &Path) {
    tokenizer()
        .save(dir.join("tokenizer.json"), false)
        .expect("tokenizer saved");
    std::fs::write(dir.join("classifier_head.json"), head_json()).expect("head written");
    std::fs::write(dir.join("label_map.json"), label_map_json()).expect("label map written");
}
