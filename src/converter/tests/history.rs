use super::super::testutil::*;
use super::segments_with_keys;
use crate::segments::{Candidate, SegmentType, Segments};

#[test]
fn test_reconstruct_history_alphabet() {
    let fx = fixture();
    let mut segments = Segments::new();

    assert!(fx.converter.reconstruct_history(&mut segments, "Hello "));

    assert_eq!(segments.len(), 1);
    let segment = segments.segment(0);
    assert_eq!(segment.segment_type, SegmentType::History);
    assert_eq!(segment.key, "Hello");
    let candidate = &segment.candidates[0];
    assert_eq!(candidate.key, "Hello");
    assert_eq!(candidate.value, "Hello");
    assert_eq!(candidate.content_key, "Hello");
    assert_eq!(candidate.content_value, "Hello");
    assert_eq!(candidate.lid, UNIQUE_NOUN_ID);
    assert_eq!(candidate.rid, UNIQUE_NOUN_ID);
    assert!(candidate.has_attribute(Candidate::NO_LEARNING));
}

#[test]
fn test_reconstruct_history_number() {
    let fx = fixture();
    let mut segments = Segments::new();

    assert!(fx.converter.reconstruct_history(&mut segments, "C60"));

    let candidate = &segments.segment(0).candidates[0];
    assert_eq!(candidate.key, "60");
    assert_eq!(candidate.value, "60");
    assert_eq!(candidate.lid, NUMBER_ID);
    assert_eq!(candidate.rid, NUMBER_ID);
}

#[test]
fn test_reconstruct_history_folds_fullwidth_key() {
    let fx = fixture();
    let mut segments = Segments::new();

    assert!(fx.converter.reconstruct_history(&mut segments, "１２３"));

    let candidate = &segments.segment(0).candidates[0];
    // The key connects through the half-width form; the value keeps the
    // text as it appeared.
    assert_eq!(candidate.key, "123");
    assert_eq!(candidate.value, "１２３");
    assert_eq!(segments.segment(0).key, "123");
}

#[test]
fn test_reconstruct_history_rejects_other_scripts() {
    let fx = fixture();
    let mut segments = Segments::new();

    assert!(!fx.converter.reconstruct_history(&mut segments, "漢字"));
    assert!(!fx.converter.reconstruct_history(&mut segments, "ひらがな"));
    assert!(segments.is_empty());
}

#[test]
fn test_reconstruct_history_rejects_empty_and_double_space() {
    let fx = fixture();
    let mut segments = Segments::new();

    assert!(!fx.converter.reconstruct_history(&mut segments, ""));
    assert!(!fx.converter.reconstruct_history(&mut segments, "x  "));
}

#[test]
fn test_reconstruct_history_discards_previous_segments() {
    let fx = fixture();
    let mut segments = segments_with_keys(&["のこり"]);

    assert!(fx.converter.reconstruct_history(&mut segments, "abc"));

    assert_eq!(segments.len(), 1);
    assert_eq!(segments.segment(0).key, "abc");
}
