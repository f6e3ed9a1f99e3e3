mod basic;
mod history;

use crate::segments::{SegmentType, Segments};

use super::testutil::candidate;

/// Segments holding one free conversion segment per key, each with an
/// echo candidate, as a conversion start would leave them.
pub(super) fn segments_with_keys(keys: &[&str]) -> Segments {
    let mut segments = Segments::new();
    for key in keys {
        let segment = segments.push_segment();
        segment.key = key.to_string();
        segment.segment_type = SegmentType::Free;
        segment.candidates.push(candidate(key, key));
    }
    segments
}

/// Append a history segment with a single committed candidate.
pub(super) fn push_history_segment(segments: &mut Segments, key: &str, value: &str) {
    let segment = segments.push_segment();
    segment.key = key.to_string();
    segment.segment_type = SegmentType::History;
    segment.candidates.push(candidate(key, value));
}
