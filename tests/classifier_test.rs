mod common;

use common::{classifier, classifier_with, token_id, KeywordEncoder, CATEGORIES};
use spendsort::{ClassifierError, TransactionClassifier, MAX_SEQUENCE_LENGTH};
use std::sync::Arc;
use std::thread;

#[test]
fn test_category_from_known_set() -> Result<(), ClassifierError> {
    let classifier = classifier();

    for text in ["STARBUCKS COFFEE #2198", "SHELL OIL 57444", "NETFLIX.COM", "POS 4411 REF 00912", "x"] {
        let result = classifier.classify(text)?;
        assert!(CATEGORIES.contains(&result.category.as_str()), "unexpected category {}", result.category);
        assert!(result.confidence > 0.0 && result.confidence <= 1.0);
    }
    Ok(())
}

#[test]
fn test_keyword_predictions() -> Result<(), ClassifierError> {
    let classifier = classifier();

    assert_eq!(classifier.classify("STARBUCKS COFFEE #2198")?.category, "Food & Dining");
    assert_eq!(classifier.classify("UBER *TRIP HELP.UBER.COM")?.category, "Auto & Transport");
    assert_eq!(classifier.classify("Netflix subscription")?.category, "Entertainment");
    Ok(())
}

#[test]
fn test_determinism() -> Result<(), ClassifierError> {
    let classifier = classifier();
    let first = classifier.classify("SHELL GAS 0042")?;
    let second = classifier.classify("SHELL GAS 0042")?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_trailing_whitespace_and_case_are_normalized() -> Result<(), ClassifierError> {
    let classifier = classifier();
    let plain = classifier.classify("STARBUCKS COFFEE")?;
    assert_eq!(classifier.classify("STARBUCKS COFFEE   \t")?, plain);
    assert_eq!(classifier.classify("starbucks coffee")?, plain);
    Ok(())
}

#[test]
fn test_empty_description_is_legal() -> Result<(), ClassifierError> {
    let classifier = classifier();
    assert_eq!(classifier.count_tokens("")?, 2);

    let result = classifier.classify("")?;
    assert_eq!(result.category, "Food & Dining");
    assert!(result.confidence > 0.0 && result.confidence <= 1.0);
    Ok(())
}

#[test]
fn test_truncation_boundary() -> Result<(), ClassifierError> {
    let classifier = classifier();
    let long_text = "coffee ".repeat(50);
    assert_eq!(classifier.count_tokens(&long_text)?, MAX_SEQUENCE_LENGTH);

    // Everything past the first 30 word pieces is dropped
    let first_thirty = "coffee ".repeat(30);
    let with_tail = format!("{}{}", first_thirty, "netflix ".repeat(40));
    assert_eq!(classifier.logits(&with_tail)?, classifier.logits(&first_thirty)?);
    assert_eq!(classifier.classify(&with_tail)?.category, "Food & Dining");
    Ok(())
}

#[test]
fn test_scores_form_a_distribution() -> Result<(), ClassifierError> {
    let classifier = classifier();
    let prediction = classifier.predict("uber trip")?;

    assert_eq!(prediction.scores.len(), CATEGORIES.len());
    let total: f32 = prediction.scores.values().sum();
    assert!((total - 1.0).abs() < 1e-5);
    assert_eq!(prediction.scores[&prediction.category], prediction.confidence);
    assert!(prediction.scores.values().all(|&p| p <= prediction.confidence));
    Ok(())
}

#[test]
fn test_encoder_failure_is_reported() {
    let classifier = classifier_with(KeywordEncoder { fail_on: Some(token_id("boom")) });
    let err = classifier.classify("boom").unwrap_err();
    assert!(matches!(err, ClassifierError::ModelError(_)));
    assert!(classifier.classify("coffee").is_ok());
}

#[test]
fn test_categories_follow_class_index() {
    let classifier = classifier();
    assert_eq!(classifier.categories(), CATEGORIES);

    let info = classifier.info();
    assert_eq!(info.num_classes, 3);
    assert_eq!(info.hidden_size, common::HIDDEN_SIZE);
    assert_eq!(info.max_sequence_length, MAX_SEQUENCE_LENGTH);
    assert!(info.encoder_path.is_none());
}

#[test]
fn test_thread_safety() {
    let classifier = Arc::new(classifier());
    let expected = classifier.classify("starbucks").unwrap();
    let mut handles = vec![];

    for _ in 0..4 {
        let classifier = Arc::clone(&classifier);
        let expected = expected.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..10 {
                assert_eq!(classifier.classify("starbucks").unwrap(), expected);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_build_requires_every_part() {
    let result = TransactionClassifier::builder()
        .with_tokenizer(common::tokenizer())
        .map(|b| b.with_head(common::head()).with_label_map(common::label_map()))
        .and_then(|b| b.build());
    assert!(matches!(result, Err(ClassifierError::BuildError(_))));
}
