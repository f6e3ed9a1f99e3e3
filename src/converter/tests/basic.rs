use std::sync::Arc;

use super::super::testutil::*;
use super::super::{
    is_valid_segments, set_key, should_set_key_for_prediction, trim_candidates,
};
use super::segments_with_keys;
use crate::request::{ConversionRequest, KeySelection, RequestType};
use crate::segments::{Candidate, SegmentType, Segments};

#[test]
fn test_conversion_with_empty_key_fails() {
    let mut fx = fixture();
    let mut segments = Segments::new();

    assert!(!fx.converter.start_conversion_with_key(&mut segments, ""));
    assert!(segments.is_empty());
}

#[test]
fn test_conversion_with_key_fills_one_free_segment() {
    let mut fx = fixture();
    let mut segments = Segments::new();

    assert!(fx.converter.start_conversion_with_key(&mut segments, "きょう"));

    assert_eq!(segments.conversion_segments_size(), 1);
    let segment = segments.conversion_segment(0);
    assert_eq!(segment.key, "きょう");
    assert!(!segment.candidates.is_empty());
    assert_eq!(
        fx.immutable.recorded_calls()[0].0,
        RequestType::Conversion
    );
}

#[test]
fn test_conversion_resets_previous_conversion_segments() {
    let mut fx = fixture();
    let mut segments = Segments::new();

    assert!(fx.converter.start_conversion_with_key(&mut segments, "きょう"));
    assert!(fx.converter.start_conversion_with_key(&mut segments, "あした"));

    assert_eq!(segments.conversion_segments_size(), 1);
    assert_eq!(segments.conversion_segment(0).key, "あした");
    assert_eq!(segments.conversion_segment(0).segment_type, SegmentType::Free);
}

#[test]
fn test_conversion_without_composer_fails() {
    let mut fx = fixture();
    let mut segments = Segments::new();
    let request = ConversionRequest::default();

    assert!(!fx.converter.start_conversion(&request, &mut segments));
}

#[test]
fn test_conversion_key_selection() {
    let mut fx = fixture();
    let mut segments = Segments::new();
    let composer = StubComposer {
        conversion_query: "かい".to_string(),
        prediction_query: "か".to_string(),
        cursor: 2,
    };
    let mut request = ConversionRequest::default();
    request.composer = Some(Arc::new(composer));

    assert!(fx.converter.start_conversion(&request, &mut segments));
    assert_eq!(segments.conversion_segment(0).key, "かい");

    request.composer_key_selection = KeySelection::PredictionKey;
    assert!(fx.converter.start_conversion(&request, &mut segments));
    assert_eq!(segments.conversion_segment(0).key, "か");
}

#[test]
fn test_converter_failure_is_soft_when_rewriter_fills() {
    let mut fx = FixtureBuilder::new()
        .immutable(StubImmutableConverter::failing())
        .rewriter_add_value("リライト")
        .build();
    let mut segments = Segments::new();

    assert!(fx.converter.start_conversion_with_key(&mut segments, "りらいと"));
    assert_eq!(segments.conversion_segment(0).candidates[0].value, "リライト");
}

#[test]
fn test_converter_failure_without_candidates_fails() {
    let mut fx = FixtureBuilder::new()
        .immutable(StubImmutableConverter::failing())
        .build();
    let mut segments = Segments::new();

    assert!(!fx.converter.start_conversion_with_key(&mut segments, "りらいと"));
    // The segment layout survives; it simply has nothing to show.
    assert_eq!(segments.conversion_segments_size(), 1);
    assert!(segments.conversion_segment(0).candidates.is_empty());
}

#[test]
fn test_suppression_removes_forbidden_candidates() {
    let immutable = StubImmutableConverter::echo().with_canned(
        "きょう",
        vec![candidate("きょう", "今日"), candidate("きょう", "協")],
    );
    let mut fx = FixtureBuilder::new()
        .immutable(immutable)
        .suppression(StubSuppressionDictionary::with_entry("きょう", "協"))
        .build();
    let mut segments = Segments::new();

    assert!(fx.converter.start_conversion_with_key(&mut segments, "きょう"));

    let values: Vec<&str> = segments
        .conversion_segment(0)
        .candidates
        .iter()
        .map(|c| c.value.as_str())
        .collect();
    assert_eq!(values, vec!["今日"]);
}

#[test]
fn test_rewrite_false_skips_suppression() {
    let mut fx = FixtureBuilder::new()
        .suppression(StubSuppressionDictionary::with_entry("きょう", "きょう"))
        .rewriter_fail()
        .build();
    let mut segments = Segments::new();

    assert!(fx.converter.start_conversion_with_key(&mut segments, "きょう"));
    // The echoed candidate matches a suppression entry but survives because
    // the rewriter bailed out first.
    assert_eq!(segments.conversion_segment(0).candidates.len(), 1);
    assert_eq!(fx.rewriter_state.lock().unwrap().rewrite_calls, 1);
}

#[test]
fn test_trim_candidates_respects_limit_and_meta() {
    let mut request = ConversionRequest::default();
    request.client.candidates_size_limit = Some(3);

    let mut segments = segments_with_keys(&["き"]);
    let segment = segments.conversion_segment_mut(0);
    segment.candidates = (0..5).map(|i| candidate("き", &format!("値{i}"))).collect();
    segment.meta_candidates = vec![candidate("き", "キ"), candidate("き", "ｷ")];

    trim_candidates(&request, &mut segments);

    // limit 3 minus 2 meta candidates leaves 1 ranked entry.
    assert_eq!(segments.conversion_segment(0).candidates.len(), 1);
}

#[test]
fn test_trim_candidates_keeps_at_least_one() {
    let mut request = ConversionRequest::default();
    request.client.candidates_size_limit = Some(1);

    let mut segments = segments_with_keys(&["き"]);
    let segment = segments.conversion_segment_mut(0);
    segment.candidates = (0..3).map(|i| candidate("き", &format!("値{i}"))).collect();
    segment.meta_candidates = vec![candidate("き", "キ"), candidate("き", "ｷ")];

    trim_candidates(&request, &mut segments);

    assert_eq!(segments.conversion_segment(0).candidates.len(), 1);
}

#[test]
fn test_trim_candidates_without_limit_is_noop() {
    let request = ConversionRequest::default();
    let mut segments = segments_with_keys(&["き"]);
    segments.conversion_segment_mut(0).candidates =
        (0..30).map(|i| candidate("き", &format!("値{i}"))).collect();

    trim_candidates(&request, &mut segments);

    assert_eq!(segments.conversion_segment(0).candidates.len(), 30);
}

#[test]
fn test_validity_requires_candidates_everywhere() {
    let request = ConversionRequest::default();
    let mut segments = segments_with_keys(&["き", "た"]);
    assert!(is_valid_segments(&request, &segments));

    segments.conversion_segment_mut(1).candidates.clear();
    assert!(!is_valid_segments(&request, &segments));
}

#[test]
fn test_validity_accepts_meta_only_on_mobile() {
    let mut segments = segments_with_keys(&["き"]);
    let segment = segments.conversion_segment_mut(0);
    segment.candidates.clear();
    segment.meta_candidates.push(candidate("き", "キ"));

    let desktop = ConversionRequest::default();
    assert!(!is_valid_segments(&desktop, &segments));

    let mut mobile = ConversionRequest::default();
    mobile.client.zero_query_suggestion = true;
    mobile.client.mixed_conversion = true;
    assert!(is_valid_segments(&mobile, &segments));
}

#[test]
fn test_set_key_replaces_conversion_suffix_only() {
    let mut segments = Segments::new();
    super::push_history_segment(&mut segments, "まえ", "前");
    let segment = segments.push_segment();
    segment.key = "ふるい".to_string();

    set_key(&mut segments, "あたらしい", 4);

    assert_eq!(segments.len(), 2);
    assert_eq!(segments.segment(0).key, "まえ");
    assert_eq!(segments.conversion_segment(0).key, "あたらしい");
    assert_eq!(segments.conversion_segment(0).segment_type, SegmentType::Free);
    assert_eq!(segments.max_history_segments_size(), 4);
}

#[test]
fn test_prediction_gating_keeps_segments_for_same_key() {
    let mut fx = fixture();
    let mut segments = Segments::new();

    assert!(fx.converter.start_suggestion_with_key(&mut segments, "あ"));
    let shown = segments.conversion_segment(0).candidates.len();
    assert!(shown > 0);

    // Same key, no forced reset: the predictor appends to what is shown.
    assert!(fx.converter.start_prediction_with_key(&mut segments, "あ"));
    assert_eq!(segments.conversion_segments_size(), 1);
    assert!(segments.conversion_segment(0).candidates.len() > shown);
}

#[test]
fn test_prediction_gating_resets_on_key_change() {
    let mut fx = fixture();
    let mut segments = Segments::new();

    assert!(fx.converter.start_suggestion_with_key(&mut segments, "あ"));
    assert!(fx.converter.start_prediction_with_key(&mut segments, "あい"));

    assert_eq!(segments.conversion_segments_size(), 1);
    assert_eq!(segments.conversion_segment(0).key, "あい");
    assert_eq!(segments.conversion_segment(0).candidates.len(), 1);
}

#[test]
fn test_prediction_gating_forced_reset() {
    let request = ConversionRequest::with_type(RequestType::Prediction);
    let segments = segments_with_keys(&["あ"]);
    assert!(!should_set_key_for_prediction(&request, "あ", &segments));

    let mut forced = request.clone();
    forced.should_call_set_key_in_prediction = true;
    assert!(should_set_key_for_prediction(&forced, "あ", &segments));
    assert!(should_set_key_for_prediction(&request, "い", &segments));
    assert!(should_set_key_for_prediction(
        &request,
        "あ",
        &Segments::new()
    ));
}

#[test]
fn test_prediction_failure_is_soft() {
    let mut fx = FixtureBuilder::new()
        .predictor_fail()
        .rewriter_add_value("補完")
        .build();
    let mut segments = Segments::new();

    assert!(fx.converter.start_prediction_with_key(&mut segments, "ほかん"));
    assert_eq!(segments.conversion_segment(0).candidates[0].value, "補完");
}

#[test]
fn test_partial_prediction_marks_consumed_key_size() {
    let mut fx = fixture();
    let mut segments = Segments::new();
    segments
        .push_segment()
        .meta_candidates
        .push(candidate("わた", "ワタ"));
    segments.segment_mut(0).key = "わた".to_string();

    assert!(fx
        .converter
        .start_partial_prediction_with_key(&mut segments, "わた"));

    let segment = segments.conversion_segment(0);
    for c in segment.candidates.iter().chain(segment.meta_candidates.iter()) {
        assert!(c.has_attribute(Candidate::PARTIALLY_KEY_CONSUMED));
        assert_eq!(c.consumed_key_size, 2);
    }
}

#[test]
fn test_partial_prediction_keeps_predictor_consumed_size() {
    let mut fx = FixtureBuilder::new().predictor_preset_consumed(1).build();
    let mut segments = Segments::new();

    assert!(fx
        .converter
        .start_partial_suggestion_with_key(&mut segments, "わた"));

    let predicted = &segments.conversion_segment(0).candidates[0];
    assert!(predicted.has_attribute(Candidate::PARTIALLY_KEY_CONSUMED));
    assert_eq!(predicted.consumed_key_size, 1);
}

#[test]
fn test_partial_prediction_slices_key_at_cursor() {
    let mut fx = fixture();
    let mut segments = Segments::new();
    let mut request = ConversionRequest::default();
    request.composer = Some(Arc::new(StubComposer::with_cursor("わたしは", 2)));

    assert!(fx.converter.start_partial_prediction(&request, &mut segments));

    assert_eq!(segments.conversion_segment(0).key, "わた");
    assert_eq!(
        fx.predictor_state.lock().unwrap().requests,
        vec![RequestType::PartialPrediction]
    );
}

#[test]
fn test_partial_suggestion_at_boundary_delegates() {
    for cursor in [0, 4] {
        let mut fx = fixture();
        let mut segments = Segments::new();
        let mut request = ConversionRequest::default();
        request.composer = Some(Arc::new(StubComposer::with_cursor("わたしは", cursor)));

        assert!(fx.converter.start_partial_suggestion(&request, &mut segments));

        // The delegate re-stamps the non-partial request type.
        assert_eq!(segments.conversion_segment(0).key, "わたしは");
        assert_eq!(
            fx.predictor_state.lock().unwrap().requests,
            vec![RequestType::Suggestion]
        );
    }
}

#[test]
fn test_partial_prediction_at_boundary_delegates() {
    let mut fx = fixture();
    let mut segments = Segments::new();
    let mut request = ConversionRequest::default();
    request.composer = Some(Arc::new(StubComposer::with_cursor("わたしは", 0)));

    assert!(fx.converter.start_partial_prediction(&request, &mut segments));

    assert_eq!(
        fx.predictor_state.lock().unwrap().requests,
        vec![RequestType::Prediction]
    );
}

#[test]
fn test_reverse_conversion_math_expression() {
    let fx = fixture();
    let mut segments = Segments::new();

    assert!(fx.converter.start_reverse_conversion(&mut segments, "1+2"));

    assert_eq!(segments.len(), 1);
    let candidate = &segments.segment(0).candidates[0];
    assert_eq!(candidate.key, "1+2");
    assert_eq!(candidate.value, "1+2");
    // The lattice is never consulted on the math path.
    assert!(fx.immutable.recorded_calls().is_empty());
}

#[test]
fn test_reverse_conversion_math_expression_fullwidth() {
    let fx = fixture();
    let mut segments = Segments::new();

    assert!(fx.converter.start_reverse_conversion(&mut segments, "１＋２"));

    let candidate = &segments.segment(0).candidates[0];
    assert_eq!(candidate.key, "１＋２");
    assert_eq!(candidate.value, "1+2");
}

#[test]
fn test_reverse_conversion_uses_lattice_for_text() {
    let fx = FixtureBuilder::new()
        .immutable(
            StubImmutableConverter::echo()
                .with_canned("漢字", vec![candidate("漢字", "かんじ")]),
        )
        .build();
    let mut segments = Segments::new();

    assert!(fx.converter.start_reverse_conversion(&mut segments, "漢字"));

    assert_eq!(segments.segment(0).candidates[0].value, "かんじ");
    assert_eq!(
        fx.immutable.recorded_calls()[0].0,
        RequestType::ReverseConversion
    );
}

#[test]
fn test_reverse_conversion_empty_key_fails() {
    let fx = fixture();
    let mut segments = segments_with_keys(&["のこり"]);

    assert!(!fx.converter.start_reverse_conversion(&mut segments, ""));
    assert!(segments.is_empty());
}

#[test]
fn test_reverse_conversion_failure_is_all_or_nothing() {
    let fx = FixtureBuilder::new()
        .immutable(StubImmutableConverter::failing())
        .build();
    let mut segments = Segments::new();

    assert!(!fx.converter.start_reverse_conversion(&mut segments, "漢字"));
}

#[test]
fn test_reverse_conversion_empty_value_resets() {
    let fx = FixtureBuilder::new()
        .immutable(StubImmutableConverter::echo().with_canned("漢字", vec![candidate("漢字", "")]))
        .build();
    let mut segments = Segments::new();

    assert!(!fx.converter.start_reverse_conversion(&mut segments, "漢字"));
    assert!(segments.is_empty());
}
