//! Collaborator contracts and the shared-module aggregate.
//!
//! The lattice converter, part-of-speech matcher, suppression dictionary,
//! and stats sink are long-lived and shared read-only across sessions, so
//! they travel as `Arc` handles inside [`Modules`]. The predictor and
//! rewriter hold per-session learning state and are owned exclusively by
//! one `Converter`; their trait methods take `&mut self`.

use std::sync::Arc;

use crate::request::ConversionRequest;
use crate::segments::{CandidateRef, Segments};
use crate::stats::StatsSink;

/// Lattice-search backend producing baseline candidates.
pub trait ImmutableConverter: Send + Sync {
    /// Fill candidates over the existing segment keys; segments typed
    /// `Free` may be re-segmented. A false return is recoverable: rewriters
    /// can still populate candidates afterwards.
    fn convert_for_request(&self, request: &ConversionRequest, segments: &mut Segments) -> bool;
}

/// Producer of prediction/suggestion candidates for partial input.
pub trait Predictor: Send {
    /// Append candidates to the single conversion segment. A false return
    /// is recoverable.
    fn predict_for_request(&mut self, request: &ConversionRequest, segments: &mut Segments)
        -> bool;
    /// Learning hook, called once per finished conversion.
    fn finish(&mut self, request: &ConversionRequest, segments: &mut Segments);
    /// Undo hook for the revert log recorded in `segments`.
    fn revert(&mut self, segments: &mut Segments);
}

/// Post-processing pipeline over candidate lists (numbers, variants,
/// transliterations, symbols, dates...).
pub trait Rewriter: Send {
    /// Mutate candidate lists. Returning false skips the suppression pass.
    fn rewrite(&mut self, request: &ConversionRequest, segments: &mut Segments) -> bool;
    /// Focus-driven reordering. `segment_index` is absolute (history
    /// included).
    fn focus(&mut self, segments: &mut Segments, segment_index: usize, candidate: CandidateRef)
        -> bool;
    /// Commit hook, called once per finished conversion.
    fn finish(&mut self, request: &ConversionRequest, segments: &mut Segments);
}

/// Policy filter forbidding specific key→value pairs.
pub trait SuppressionDictionary: Send + Sync {
    fn is_empty(&self) -> bool;
    fn suppress_entry(&self, key: &str, value: &str) -> bool;
}

/// Part-of-speech ids fixed at dictionary build time.
pub trait PosMatcher: Send + Sync {
    fn general_noun_id(&self) -> u16;
    fn number_id(&self) -> u16;
    fn unique_noun_id(&self) -> u16;
}

/// Shared engine modules a `Converter` borrows at construction time.
#[derive(Clone)]
pub struct Modules {
    pub pos_matcher: Arc<dyn PosMatcher>,
    pub suppression_dictionary: Arc<dyn SuppressionDictionary>,
    pub immutable_converter: Arc<dyn ImmutableConverter>,
    pub stats: Arc<dyn StatsSink>,
}
