//! Conversion session orchestration over a mutable segment sequence.
//!
//! `Converter` owns the prediction and rewrite collaborators, shares the
//! lattice converter and dictionaries published by [`Modules`], and drives
//! a caller-owned [`Segments`] through the session operations: the start
//! family here, commits and lifecycle in `commit`, boundary adjustment in
//! `resize`. Collaborator failures are soft; an operation succeeds as long
//! as every conversion segment ends up with at least one candidate.

mod commit;
mod pos_ids;
mod resize;
pub(crate) mod testutil;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::ConverterConfig;
use crate::math::normalize_math_expression;
use crate::modules::{
    ImmutableConverter, Modules, PosMatcher, Predictor, Rewriter, SuppressionDictionary,
};
use crate::request::{ConversionRequest, KeySelection, RequestType};
use crate::segments::{Candidate, Segment, SegmentType, Segments};
use crate::stats::StatsSink;
use crate::unicode::{char_len, utf8_substring};

/// Conversion session state machine.
///
/// One instance per session; the shared modules may back any number of
/// concurrent converters, while the predictor and rewriter belong to this
/// one exclusively.
pub struct Converter {
    immutable_converter: Arc<dyn ImmutableConverter>,
    suppression_dictionary: Arc<dyn SuppressionDictionary>,
    pos_matcher: Arc<dyn PosMatcher>,
    predictor: Box<dyn Predictor>,
    rewriter: Box<dyn Rewriter>,
    stats: Arc<dyn StatsSink>,
    config: ConverterConfig,
    general_noun_id: u16,
}

impl Converter {
    pub fn new(modules: &Modules, predictor: Box<dyn Predictor>, rewriter: Box<dyn Rewriter>) -> Self {
        Self::with_config(modules, predictor, rewriter, ConverterConfig::default())
    }

    pub fn with_config(
        modules: &Modules,
        predictor: Box<dyn Predictor>,
        rewriter: Box<dyn Rewriter>,
        config: ConverterConfig,
    ) -> Self {
        let general_noun_id = modules.pos_matcher.general_noun_id();
        Self {
            immutable_converter: Arc::clone(&modules.immutable_converter),
            suppression_dictionary: Arc::clone(&modules.suppression_dictionary),
            pos_matcher: Arc::clone(&modules.pos_matcher),
            predictor,
            rewriter,
            stats: Arc::clone(&modules.stats),
            config,
            general_noun_id,
        }
    }

    pub fn start_conversion(&mut self, request: &ConversionRequest, segments: &mut Segments) -> bool {
        let request = request.with_request_type(RequestType::Conversion);
        let Some(composer) = request.composer.as_deref() else {
            error!("conversion request has no composer");
            return false;
        };
        let conversion_key = match request.composer_key_selection {
            KeySelection::ConversionKey => composer.query_for_conversion(),
            KeySelection::PredictionKey => composer.query_for_prediction(),
        };
        if conversion_key.is_empty() {
            return false;
        }
        self.convert(&request, &conversion_key, segments)
    }

    pub fn start_conversion_with_key(&mut self, segments: &mut Segments, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        let request = ConversionRequest::default();
        self.convert(&request, key, segments)
    }

    pub fn start_prediction(&mut self, request: &ConversionRequest, segments: &mut Segments) -> bool {
        let request = request.with_request_type(RequestType::Prediction);
        let Some(composer) = request.composer.as_deref() else {
            error!("prediction request has no composer");
            return false;
        };
        let prediction_key = composer.query_for_prediction();
        self.predict(&request, &prediction_key, segments)
    }

    pub fn start_prediction_with_key(&mut self, segments: &mut Segments, key: &str) -> bool {
        let request = ConversionRequest::with_type(RequestType::Prediction);
        self.predict(&request, key, segments)
    }

    pub fn start_suggestion(&mut self, request: &ConversionRequest, segments: &mut Segments) -> bool {
        let request = request.with_request_type(RequestType::Suggestion);
        let Some(composer) = request.composer.as_deref() else {
            error!("suggestion request has no composer");
            return false;
        };
        let prediction_key = composer.query_for_prediction();
        self.predict(&request, &prediction_key, segments)
    }

    pub fn start_suggestion_with_key(&mut self, segments: &mut Segments, key: &str) -> bool {
        let request = ConversionRequest::with_type(RequestType::Suggestion);
        self.predict(&request, key, segments)
    }

    pub fn start_partial_prediction(
        &mut self,
        request: &ConversionRequest,
        segments: &mut Segments,
    ) -> bool {
        let request = request.with_request_type(RequestType::PartialPrediction);
        let Some(composer) = request.composer.as_deref() else {
            error!("partial prediction request has no composer");
            return false;
        };
        let cursor = composer.cursor();
        if cursor == 0 || cursor == composer.length() {
            return self.start_prediction(&request, segments);
        }
        let query = composer.query_for_conversion();
        let conversion_key = utf8_substring(&query, 0, cursor).to_string();
        self.predict(&request, &conversion_key, segments)
    }

    pub fn start_partial_prediction_with_key(&mut self, segments: &mut Segments, key: &str) -> bool {
        let request = ConversionRequest::with_type(RequestType::PartialPrediction);
        self.predict(&request, key, segments)
    }

    pub fn start_partial_suggestion(
        &mut self,
        request: &ConversionRequest,
        segments: &mut Segments,
    ) -> bool {
        let request = request.with_request_type(RequestType::PartialSuggestion);
        let Some(composer) = request.composer.as_deref() else {
            error!("partial suggestion request has no composer");
            return false;
        };
        let cursor = composer.cursor();
        if cursor == 0 || cursor == composer.length() {
            return self.start_suggestion(&request, segments);
        }
        let query = composer.query_for_conversion();
        let conversion_key = utf8_substring(&query, 0, cursor).to_string();
        self.predict(&request, &conversion_key, segments)
    }

    pub fn start_partial_suggestion_with_key(&mut self, segments: &mut Segments, key: &str) -> bool {
        let request = ConversionRequest::with_type(RequestType::PartialSuggestion);
        self.predict(&request, key, segments)
    }

    /// Surface→reading conversion. All-or-nothing: any empty result resets
    /// the segments and fails.
    pub fn start_reverse_conversion(&self, segments: &mut Segments, key: &str) -> bool {
        segments.clear();
        if key.is_empty() {
            return false;
        }
        set_key(segments, key, self.config.max_history_segments);

        // A math expression never gets a useful reading out of the lattice;
        // hand back the normalised form directly.
        if let Some(value) = normalize_math_expression(key) {
            let candidate = Candidate {
                key: key.to_string(),
                value,
                ..Candidate::default()
            };
            segments.segment_mut(0).candidates.push(candidate);
            return true;
        }

        let request = ConversionRequest::with_type(RequestType::ReverseConversion);
        if !self.immutable_converter.convert_for_request(&request, segments) {
            return false;
        }
        if segments.is_empty() {
            warn!("no segments from reverse conversion");
            return false;
        }
        let has_empty_result = segments
            .iter()
            .any(|s| s.candidates.first().map_or(true, |c| c.value.is_empty()));
        if has_empty_result {
            segments.clear();
            warn!("got an empty segment from reverse conversion");
            return false;
        }
        true
    }

    fn convert(&mut self, request: &ConversionRequest, key: &str, segments: &mut Segments) -> bool {
        set_key(segments, key, self.config.max_history_segments);
        self.convert_current_segments(request, segments);
        is_valid_segments(request, segments)
    }

    fn predict(&mut self, request: &ConversionRequest, key: &str, segments: &mut Segments) -> bool {
        if should_set_key_for_prediction(request, key, segments) {
            set_key(segments, key, self.config.max_history_segments);
        }
        debug_assert_eq!(1, segments.conversion_segments_size());
        debug_assert_eq!(key, segments.conversion_segment(0).key);

        if !self.predictor.predict_for_request(request, segments) {
            // Prediction can fail for keys like "12"; rewriters may still
            // produce candidates, so this is not an error.
            debug!(key, "predict_for_request failed");
        }
        self.rewrite_and_suppress_candidates(request, segments);
        trim_candidates(request, segments);
        if matches!(
            request.request_type,
            RequestType::PartialSuggestion | RequestType::PartialPrediction
        ) {
            // When a partial candidate is committed, everything from the
            // head of the composition to the cursor is submitted with it,
            // so every candidate must record how much of the reading it
            // consumed.
            let consumed = char_len(key).min(u16::MAX as usize) as u16;
            set_consumed_key_size_to_segment(consumed, segments.conversion_segment_mut(0));
        }
        is_valid_segments(request, segments)
    }

    /// Run the lattice converter over the current segment layout, then the
    /// rewriter pipeline and candidate trimming.
    fn convert_current_segments(&mut self, request: &ConversionRequest, segments: &mut Segments) {
        if !self.immutable_converter.convert_for_request(request, segments) {
            // Conversion can fail for keys like "12"; rewriters (number,
            // variant, ...) may still produce candidates, so this is not an
            // error.
            debug!(key = segments.segment(0).key.as_str(), "convert_for_request failed");
        }
        self.rewrite_and_suppress_candidates(request, segments);
        trim_candidates(request, segments);
    }

    fn rewrite_and_suppress_candidates(
        &mut self,
        request: &ConversionRequest,
        segments: &mut Segments,
    ) {
        if !self.rewriter.rewrite(request, segments) {
            return;
        }
        // Most users have no suppression entries; skip the scan outright.
        if self.suppression_dictionary.is_empty() {
            return;
        }
        // The dictionary layer already filters at node level, but bad words
        // can be assembled across nodes or added by rewriters, so the
        // filter runs once more here.
        let suppression = &self.suppression_dictionary;
        for segment in segments.conversion_segments_mut() {
            segment
                .candidates
                .retain(|c| !suppression.suppress_entry(&c.key, &c.value));
        }
    }
}

/// Reset the conversion suffix to a single free segment holding `key`.
fn set_key(segments: &mut Segments, key: &str, max_history_segments: usize) {
    segments.set_max_history_segments_size(max_history_segments);
    segments.clear_conversion_segments();
    let segment = segments.push_segment();
    segment.key = key.to_string();
    segment.segment_type = SegmentType::Free;
}

/// Keep the current segment (and its on-screen candidates) only when the
/// caller did not ask for a reset and the key is unchanged; mobile
/// predictors rely on this to append expansion results after suggestions
/// already shown.
fn should_set_key_for_prediction(
    request: &ConversionRequest,
    key: &str,
    segments: &Segments,
) -> bool {
    if request.should_call_set_key_in_prediction {
        return true;
    }
    if segments.conversion_segments_size() == 0 || segments.conversion_segment(0).key != key {
        return true;
    }
    false
}

fn is_mobile(request: &ConversionRequest) -> bool {
    request.client.zero_query_suggestion && request.client.mixed_conversion
}

/// Every segment must carry a candidate. Mobile clients render meta
/// candidates in the same list, so a meta-only segment passes there.
fn is_valid_segments(request: &ConversionRequest, segments: &Segments) -> bool {
    for segment in segments.iter() {
        if !segment.candidates.is_empty() {
            continue;
        }
        if is_mobile(request) && !segment.meta_candidates.is_empty() {
            continue;
        }
        return false;
    }
    true
}

fn set_consumed_key_size_to_candidate(consumed_key_size: u16, candidate: &mut Candidate) {
    if candidate.has_attribute(Candidate::PARTIALLY_KEY_CONSUMED) {
        // The predictor already recorded its own consumption.
        return;
    }
    candidate.attributes |= Candidate::PARTIALLY_KEY_CONSUMED;
    candidate.consumed_key_size = consumed_key_size;
}

fn set_consumed_key_size_to_segment(consumed_key_size: u16, segment: &mut Segment) {
    for candidate in segment
        .candidates
        .iter_mut()
        .chain(segment.meta_candidates.iter_mut())
    {
        set_consumed_key_size_to_candidate(consumed_key_size, candidate);
    }
}

/// Cap each conversion segment's ranked list at the client's limit, less
/// the meta candidates it will also render, keeping at least one entry.
fn trim_candidates(request: &ConversionRequest, segments: &mut Segments) {
    let Some(limit) = request.client.candidates_size_limit else {
        return;
    };
    for segment in segments.conversion_segments_mut() {
        let candidates_limit = limit.saturating_sub(segment.meta_candidates.len()).max(1);
        segment.candidates.truncate(candidates_limit);
    }
}

/// Translate a caller-visible conversion-segment index to an absolute one.
fn get_segment_index(segments: &Segments, segment_index: usize) -> Option<usize> {
    let result = segments.history_segments_size() + segment_index;
    if result >= segments.len() {
        return None;
    }
    Some(result)
}
