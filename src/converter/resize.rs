//! Segment boundary adjustment driven by the user.
//!
//! Both variants rewrite the keys of the affected range, pin the new
//! boundaries as `FixedBoundary`, and re-run conversion over the adjusted
//! layout.

use crate::request::{ConversionRequest, RequestType};
use crate::segments::{SegmentType, Segments};
use crate::unicode::{char_len, utf8_substring};

use super::{get_segment_index, Converter};

const MAX_SIZE_ARRAY_LEN: usize = 256;

impl Converter {
    /// Move the right boundary of one segment by `offset_length`
    /// characters, absorbing (or feeding) the segments after it.
    pub fn resize_segment(
        &mut self,
        segments: &mut Segments,
        request: &ConversionRequest,
        segment_index: usize,
        offset_length: i32,
    ) -> bool {
        if request.request_type != RequestType::Conversion {
            return false;
        }
        if offset_length == 0 {
            return false;
        }
        let Some(segment_index) = get_segment_index(segments, segment_index) else {
            return false;
        };
        // The last segment has nothing to grow into.
        if offset_length > 0 && segment_index == segments.len() - 1 {
            return false;
        }

        let cur_segment_key = segments.segment(segment_index).key.clone();
        let cur_length = char_len(&cur_segment_key) as i64;
        let offset = i64::from(offset_length);
        // A segment cannot shrink away entirely.
        if cur_length + offset <= 0 {
            return false;
        }

        if offset > 0 {
            let mut length = offset;
            let mut last_key = String::new();
            let mut last_clen: i64 = 0;
            let mut new_key = cur_segment_key;
            while segment_index + 1 < segments.len() {
                last_key = segments.segment(segment_index + 1).key.clone();
                segments.erase_segment(segment_index + 1);
                last_clen = char_len(&last_key) as i64;
                length -= last_clen;
                if length <= 0 {
                    new_key.push_str(utf8_substring(&last_key, 0, (length + last_clen) as usize));
                    break;
                }
                new_key.push_str(&last_key);
            }

            let segment = segments.segment_mut(segment_index);
            segment.clear();
            segment.segment_type = SegmentType::FixedBoundary;
            segment.key = new_key;

            if length < 0 {
                // Overshoot: the tail of the last absorbed key becomes a
                // new free segment.
                let tail =
                    utf8_substring(&last_key, (length + last_clen) as usize, (-length) as usize)
                        .to_string();
                let new_segment = segments.insert_segment(segment_index + 1);
                new_segment.segment_type = SegmentType::Free;
                new_segment.key = tail;
            }
        } else {
            let new_length = (cur_length + offset) as usize;
            {
                let segment = segments.segment_mut(segment_index);
                segment.clear();
                segment.segment_type = SegmentType::FixedBoundary;
                segment.key = utf8_substring(&cur_segment_key, 0, new_length).to_string();
            }

            let tail =
                utf8_substring(&cur_segment_key, new_length, cur_length as usize).to_string();
            if segment_index + 1 < segments.len() {
                let next = segments.segment_mut(segment_index + 1);
                next.segment_type = SegmentType::Free;
                next.key.insert_str(0, &tail);
            } else {
                let next = segments.push_segment();
                next.segment_type = SegmentType::Free;
                next.key = tail;
            }
        }

        segments.set_resized(true);
        self.convert_current_segments(request, segments);
        true
    }

    /// Re-cut a run of segments into the character counts of `new_sizes`.
    /// Zero entries are skipped; characters left over past the array end up
    /// in one final segment.
    pub fn resize_segments(
        &mut self,
        segments: &mut Segments,
        request: &ConversionRequest,
        start_segment_index: usize,
        segments_size: usize,
        new_sizes: &[u8],
    ) -> bool {
        if request.request_type != RequestType::Conversion {
            return false;
        }
        let Some(start) = get_segment_index(segments, start_segment_index) else {
            return false;
        };
        let end = start + segments_size;
        if end <= start || end > segments.len() || new_sizes.len() > MAX_SIZE_ARRAY_LEN {
            return false;
        }

        let mut key = String::new();
        for index in start..end {
            key.push_str(&segments.segment(index).key);
        }
        if key.is_empty() {
            return false;
        }

        let key_len = char_len(&key);
        let mut consumed = 0usize;
        let mut new_keys: Vec<String> = Vec::with_capacity(new_sizes.len() + 1);
        for &new_size in new_sizes {
            let new_size = new_size as usize;
            if new_size != 0 && consumed < key_len {
                new_keys.push(utf8_substring(&key, consumed, new_size).to_string());
                consumed += new_size;
            }
        }
        if consumed < key_len {
            new_keys.push(utf8_substring(&key, consumed, key_len - consumed).to_string());
        }

        segments.erase_segments(start, segments_size);
        for (offset, new_key) in new_keys.into_iter().enumerate() {
            let segment = segments.insert_segment(start + offset);
            segment.segment_type = SegmentType::FixedBoundary;
            segment.key = new_key;
        }

        segments.set_resized(true);
        self.convert_current_segments(request, segments);
        true
    }
}
