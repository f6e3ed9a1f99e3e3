//! Segment sequence and candidate data model shared by the conversion
//! session and its collaborators.
//!
//! A [`Segments`] value is an ordered sequence split into a *history
//! prefix* (context from already-committed conversions) and a *conversion
//! suffix* (the segments currently being edited). The split is not stored:
//! it is the maximal leading run of segments whose type is [`History`] or
//! [`Submitted`], which is what lets a batch commit submit the first
//! conversion segment repeatedly while the prefix grows underneath it.
//!
//! [`History`]: SegmentType::History
//! [`Submitted`]: SegmentType::Submitted

/// Number of transliteration variants a segment may expose as meta
/// candidates: hiragana, full/half katakana, and the full/half-width ASCII
/// casings.
pub const NUM_T13N_TYPES: usize = 11;

/// Lifecycle state of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    /// The converter may re-segment freely.
    Free,
    /// Key length is fixed by the user; candidates may still change.
    FixedBoundary,
    /// Top candidate is fixed (committed non-destructively).
    FixedValue,
    /// Committed ahead of the rest, awaiting promotion to `History`.
    Submitted,
    /// Context for future conversions; never re-segmented.
    History,
}

/// Candidate index at the commit boundary. Meta candidates (deterministic
/// transliterations) live in a separate list from the ranked candidates,
/// so an index must say which list it addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRef {
    Regular(usize),
    Meta(usize),
}

/// One possible surface form for a segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub key: String,
    pub value: String,
    pub content_key: String,
    pub content_value: String,
    /// Left/right connection-class ids for the lattice cost model.
    pub lid: u16,
    pub rid: u16,
    pub cost: i32,
    pub wcost: i32,
    pub structure_cost: i32,
    pub attributes: u32,
    /// Char count of the reading prefix this candidate consumes.
    /// Meaningful only together with [`Candidate::PARTIALLY_KEY_CONSUMED`].
    pub consumed_key_size: u16,
}

impl Candidate {
    /// The candidate covers only a prefix of the segment key
    /// (partial suggestion/prediction).
    pub const PARTIALLY_KEY_CONSUMED: u32 = 1 << 0;
    /// The user promoted this candidate over the converter's first choice.
    pub const RERANKED: u32 = 1 << 1;
    /// The predictor must not learn from this candidate.
    pub const NO_LEARNING: u32 = 1 << 2;
    /// Marked best by the converter's cost model.
    pub const BEST_CANDIDATE: u32 = 1 << 3;
    /// Width/variant expansion must leave this candidate alone.
    pub const NO_VARIANTS_EXPANSION: u32 = 1 << 4;

    pub fn has_attribute(&self, attribute: u32) -> bool {
        self.attributes & attribute != 0
    }
}

/// A contiguous run of the input reading with its ranked surface forms.
#[derive(Debug, Clone)]
pub struct Segment {
    pub segment_type: SegmentType,
    pub key: String,
    pub candidates: Vec<Candidate>,
    pub meta_candidates: Vec<Candidate>,
}

impl Default for Segment {
    fn default() -> Self {
        Self {
            segment_type: SegmentType::Free,
            key: String::new(),
            candidates: Vec::new(),
            meta_candidates: Vec::new(),
        }
    }
}

impl Segment {
    /// Drop the key and all candidates. The segment type is left for the
    /// caller to reassign.
    pub fn clear(&mut self) {
        self.key.clear();
        self.candidates.clear();
        self.meta_candidates.clear();
    }

    /// Move `from` to position `to` in the ranked list. A regular candidate
    /// is reordered; a meta candidate is *copied* in, leaving the meta list
    /// untouched. Returns false without mutating if either index is out of
    /// range.
    pub fn move_candidate(&mut self, from: CandidateRef, to: usize) -> bool {
        match from {
            CandidateRef::Regular(i) => {
                if i >= self.candidates.len() || to >= self.candidates.len() {
                    return false;
                }
                if i != to {
                    let candidate = self.candidates.remove(i);
                    self.candidates.insert(to, candidate);
                }
                true
            }
            CandidateRef::Meta(i) => {
                if i >= NUM_T13N_TYPES || to > self.candidates.len() {
                    return false;
                }
                let Some(candidate) = self.meta_candidates.get(i) else {
                    return false;
                };
                self.candidates.insert(to, candidate.clone());
                true
            }
        }
    }
}

/// Opaque token recorded by the predictor so a commit can be undone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevertEntry {
    pub id: u16,
    pub key: String,
}

/// Ordered segment sequence with a history/conversion partition.
#[derive(Debug, Clone)]
pub struct Segments {
    segments: Vec<Segment>,
    max_history_segments_size: usize,
    resized: bool,
    revert_entries: Vec<RevertEntry>,
}

impl Default for Segments {
    fn default() -> Self {
        Self {
            segments: Vec::new(),
            max_history_segments_size: 4,
            resized: false,
            revert_entries: Vec::new(),
        }
    }
}

impl Segments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Panics if `index` is out of range.
    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index]
    }

    /// Panics if `index` is out of range.
    pub fn segment_mut(&mut self, index: usize) -> &mut Segment {
        &mut self.segments[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Segment> {
        self.segments.iter_mut()
    }

    /// Append a fresh `Free` segment and return it.
    pub fn push_segment(&mut self) -> &mut Segment {
        self.segments.push(Segment::default());
        self.segments.last_mut().unwrap()
    }

    /// Insert a fresh `Free` segment at `index` and return it.
    /// Panics if `index > len`.
    pub fn insert_segment(&mut self, index: usize) -> &mut Segment {
        self.segments.insert(index, Segment::default());
        &mut self.segments[index]
    }

    pub fn erase_segment(&mut self, index: usize) {
        if index < self.segments.len() {
            self.segments.remove(index);
        }
    }

    pub fn erase_segments(&mut self, index: usize, count: usize) {
        let end = (index + count).min(self.segments.len());
        if index < end {
            self.segments.drain(index..end);
        }
    }

    pub fn pop_front_segment(&mut self) {
        if !self.segments.is_empty() {
            self.segments.remove(0);
        }
    }

    /// Length of the history prefix: the maximal leading run of `History`
    /// or `Submitted` segments.
    pub fn history_segments_size(&self) -> usize {
        self.segments
            .iter()
            .take_while(|s| {
                matches!(
                    s.segment_type,
                    SegmentType::History | SegmentType::Submitted
                )
            })
            .count()
    }

    pub fn conversion_segments_size(&self) -> usize {
        self.segments.len() - self.history_segments_size()
    }

    /// Panics if `index` is out of range of the conversion suffix.
    pub fn conversion_segment(&self, index: usize) -> &Segment {
        &self.segments[self.history_segments_size() + index]
    }

    /// Panics if `index` is out of range of the conversion suffix.
    pub fn conversion_segment_mut(&mut self, index: usize) -> &mut Segment {
        let history = self.history_segments_size();
        &mut self.segments[history + index]
    }

    pub fn conversion_segments(&self) -> &[Segment] {
        &self.segments[self.history_segments_size()..]
    }

    pub fn conversion_segments_mut(&mut self) -> &mut [Segment] {
        let history = self.history_segments_size();
        &mut self.segments[history..]
    }

    /// Drop the conversion suffix, keeping the history prefix. Any pending
    /// resize applies to the dropped segments, so the flag resets too.
    pub fn clear_conversion_segments(&mut self) {
        let history = self.history_segments_size();
        self.segments.truncate(history);
        self.resized = false;
    }

    /// Drop everything: segments, revert log, resize flag.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.revert_entries.clear();
        self.resized = false;
    }

    pub fn max_history_segments_size(&self) -> usize {
        self.max_history_segments_size
    }

    pub fn set_max_history_segments_size(&mut self, size: usize) {
        self.max_history_segments_size = size;
    }

    pub fn resized(&self) -> bool {
        self.resized
    }

    pub fn set_resized(&mut self, resized: bool) {
        self.resized = resized;
    }

    pub fn revert_entries(&self) -> &[RevertEntry] {
        &self.revert_entries
    }

    pub fn push_revert_entry(&mut self, entry: RevertEntry) {
        self.revert_entries.push(entry);
    }

    pub fn clear_revert_entries(&mut self) {
        self.revert_entries.clear();
    }
}
