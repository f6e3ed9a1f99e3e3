//! Commit operations and session lifecycle: fixing candidates, finishing a
//! conversion into history, cancel/reset/revert, and history
//! reconstruction from surrounding text.

use tracing::{debug_span, error, warn};

use crate::request::ConversionRequest;
use crate::segments::{Candidate, CandidateRef, SegmentType, Segments};
use crate::unicode::{
    char_len, extract_last_token_of_same_script, fullwidth_ascii_to_halfwidth, ScriptType,
};

use super::{get_segment_index, Converter};

impl Converter {
    /// Fix `candidate` as the committed value of the given conversion
    /// segment, moving it to the top of the ranked list.
    pub fn commit_segment_value(
        &self,
        segments: &mut Segments,
        segment_index: usize,
        candidate: CandidateRef,
    ) -> bool {
        self.commit_segment_value_internal(segments, segment_index, candidate, SegmentType::FixedValue)
    }

    fn commit_segment_value_internal(
        &self,
        segments: &mut Segments,
        segment_index: usize,
        candidate: CandidateRef,
        segment_type: SegmentType,
    ) -> bool {
        let Some(index) = get_segment_index(segments, segment_index) else {
            warn!(segment_index, "segment index out of range");
            return false;
        };
        let segment = segments.segment_mut(index);
        if !segment.move_candidate(candidate, 0) {
            warn!(?candidate, "candidate index out of range");
            return false;
        }
        segment.segment_type = segment_type;
        if candidate != CandidateRef::Regular(0) {
            segment.candidates[0].attributes |= Candidate::RERANKED;
        }
        true
    }

    /// Commit a partial suggestion: the segment is submitted with its key
    /// shrunk to `current_segment_key`, and the unconsumed remainder
    /// `new_segment_key` becomes a fresh free segment right after it.
    pub fn commit_partial_suggestion_segment_value(
        &self,
        segments: &mut Segments,
        segment_index: usize,
        candidate: CandidateRef,
        current_segment_key: &str,
        new_segment_key: &str,
    ) -> bool {
        let Some(raw_index) = get_segment_index(segments, segment_index) else {
            warn!(segment_index, "segment index out of range");
            return false;
        };
        if !self.commit_segment_value_internal(segments, segment_index, candidate, SegmentType::Submitted)
        {
            return false;
        }
        self.commit_usage_stats(segments, raw_index, 1);

        let segment = segments.segment_mut(raw_index);
        let auto_partial_suggestion =
            char_len(&segment.candidates[0].key) != char_len(&segment.key);
        segment.key = current_segment_key.to_string();

        let new_segment = segments.insert_segment(raw_index + 1);
        new_segment.segment_type = SegmentType::Free;
        new_segment.key = new_segment_key.to_string();

        if auto_partial_suggestion {
            self.stats.increment_count("CommitAutoPartialSuggestion");
        } else {
            self.stats.increment_count("CommitPartialSuggestion");
        }
        true
    }

    /// Commit the leading conversion segments in one batch. Index 0 is
    /// committed on every iteration: a submitted segment joins the history
    /// prefix, so the next conversion segment slides into position 0.
    pub fn commit_segments(&self, segments: &mut Segments, candidate_indices: &[usize]) -> bool {
        let conversion_segment_index = segments.history_segments_size();
        for &candidate_index in candidate_indices {
            if !self.commit_segment_value_internal(
                segments,
                0,
                CandidateRef::Regular(candidate_index),
                SegmentType::Submitted,
            ) {
                return false;
            }
        }
        self.commit_usage_stats(segments, conversion_segment_index, candidate_indices.len());
        true
    }

    /// Let the rewriter react to the user focusing a candidate.
    pub fn focus_segment_value(
        &mut self,
        segments: &mut Segments,
        segment_index: usize,
        candidate: CandidateRef,
    ) -> bool {
        let Some(index) = get_segment_index(segments, segment_index) else {
            warn!(segment_index, "segment index out of range");
            return false;
        };
        self.rewriter.focus(segments, index, candidate)
    }

    /// Close the conversion: promote submitted segments, hand the result to
    /// the learning hooks, and retain the tail as history context.
    pub fn finish_conversion(&mut self, request: &ConversionRequest, segments: &mut Segments) {
        let _span = debug_span!("finish_conversion", segments = segments.len()).entered();
        self.commit_usage_stats(
            segments,
            segments.history_segments_size(),
            segments.conversion_segments_size(),
        );

        for index in 0..segments.len() {
            let segment = segments.segment_mut(index);
            // Submitted segments come from submit-first-segment commits;
            // learning needs them recorded as fixed values.
            if segment.segment_type == SegmentType::Submitted {
                segment.segment_type = SegmentType::FixedValue;
            }
            if let Some(candidate) = segment.candidates.first_mut() {
                self.complete_pos_ids(candidate);
            }
        }

        segments.clear_revert_entries();
        self.rewriter.finish(request, segments);
        self.predictor.finish(request, segments);

        // Only the trailing segments serve as context for what follows.
        while segments.len() > segments.max_history_segments_size() {
            segments.pop_front_segment();
        }
        for segment in segments.iter_mut() {
            segment.segment_type = SegmentType::History;
        }
    }

    /// Drop the conversion suffix; history context survives.
    pub fn cancel_conversion(&self, segments: &mut Segments) {
        segments.clear_conversion_segments();
    }

    /// Drop everything, history included.
    pub fn reset_conversion(&self, segments: &mut Segments) {
        segments.clear();
    }

    /// Undo the last commit through the predictor's revert log, if any.
    pub fn revert_conversion(&mut self, segments: &mut Segments) {
        if segments.revert_entries().is_empty() {
            return;
        }
        self.predictor.revert(segments);
        segments.clear_revert_entries();
    }

    /// Rebuild a one-segment history from the text preceding the cursor,
    /// so conversions started mid-document connect to what is already
    /// there. Only trailing number and alphabet tokens qualify.
    pub fn reconstruct_history(&self, segments: &mut Segments, preceding_text: &str) -> bool {
        segments.clear();

        let Some((key, value, id)) = self.last_connective_part(preceding_text) else {
            return false;
        };

        let segment = segments.push_segment();
        segment.key = key.clone();
        segment.segment_type = SegmentType::History;
        segment.candidates.push(Candidate {
            lid: id,
            rid: id,
            content_key: key.clone(),
            key,
            content_value: value.clone(),
            value,
            attributes: Candidate::NO_LEARNING,
            ..Candidate::default()
        });
        true
    }

    /// Last token of `preceding_text` with the POS id it connects with.
    /// The key is half-width folded; the value keeps the original text.
    fn last_connective_part(&self, preceding_text: &str) -> Option<(String, String, u16)> {
        let (token, script) = extract_last_token_of_same_script(preceding_text)?;
        let id = match script {
            ScriptType::Number => self.pos_matcher.number_id(),
            ScriptType::Alphabet => self.pos_matcher.unique_noun_id(),
            _ => return None,
        };
        Some((fullwidth_ascii_to_halfwidth(&token), token, id))
    }

    /// Record length/count telemetry for the committed segment range.
    /// Timings are scaled by 1000 so integer averages stay meaningful.
    pub(super) fn commit_usage_stats(
        &self,
        segments: &Segments,
        begin_segment_index: usize,
        segment_length: usize,
    ) {
        if segment_length == 0 {
            return;
        }
        if begin_segment_index + segment_length > segments.len() {
            error!(
                segments_size = segments.len(),
                required = begin_segment_index + segment_length,
                "invalid commit range"
            );
            return;
        }

        let mut submitted_total_length: u64 = 0;
        for index in begin_segment_index..begin_segment_index + segment_length {
            let submitted_length = segments
                .segment(index)
                .candidates
                .first()
                .map_or(0, |c| char_len(&c.value)) as u64;
            self.stats
                .update_timing("SubmittedSegmentLengthx1000", submitted_length * 1000);
            submitted_total_length += submitted_length;
        }

        self.stats
            .update_timing("SubmittedLengthx1000", submitted_total_length * 1000);
        self.stats
            .update_timing("SubmittedSegmentNumberx1000", segment_length as u64 * 1000);
        self.stats
            .increment_count_by("SubmittedTotalLength", submitted_total_length);
    }
}
