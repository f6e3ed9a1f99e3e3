#![cfg(test)]

//! Stub collaborators shared by the converter tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::config::ConverterConfig;
use crate::modules::{
    ImmutableConverter, Modules, PosMatcher, Predictor, Rewriter, SuppressionDictionary,
};
use crate::request::{Composer, ConversionRequest, RequestType};
use crate::segments::{Candidate, CandidateRef, Segments};
use crate::stats::RecordingStats;

use super::Converter;

pub(crate) const GENERAL_NOUN_ID: u16 = 1851;
pub(crate) const NUMBER_ID: u16 = 1902;
pub(crate) const UNIQUE_NOUN_ID: u16 = 1916;

pub(crate) fn candidate(key: &str, value: &str) -> Candidate {
    Candidate {
        key: key.to_string(),
        value: value.to_string(),
        content_key: key.to_string(),
        content_value: value.to_string(),
        ..Candidate::default()
    }
}

/// Lattice-converter stand-in. Serves canned candidate lists per key and
/// otherwise echoes each conversion segment's key, so validity predicates
/// have something to check. Records every request it sees.
pub(crate) struct StubImmutableConverter {
    pub canned: HashMap<String, Vec<Candidate>>,
    pub fail: bool,
    pub calls: Mutex<Vec<(RequestType, usize)>>,
}

impl StubImmutableConverter {
    pub fn echo() -> Self {
        Self {
            canned: HashMap::new(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::echo()
        }
    }

    pub fn with_canned(mut self, key: &str, candidates: Vec<Candidate>) -> Self {
        self.canned.insert(key.to_string(), candidates);
        self
    }

    pub fn recorded_calls(&self) -> Vec<(RequestType, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImmutableConverter for StubImmutableConverter {
    fn convert_for_request(&self, request: &ConversionRequest, segments: &mut Segments) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push((request.request_type, request.max_conversion_candidates_size));
        if self.fail {
            return false;
        }
        let max = request.max_conversion_candidates_size;
        for segment in segments.conversion_segments_mut() {
            segment.candidates.clear();
            match self.canned.get(&segment.key) {
                Some(canned) => {
                    segment.candidates = canned.iter().take(max).cloned().collect();
                }
                None => {
                    let mut echoed = candidate(&segment.key, &segment.key);
                    echoed.lid = GENERAL_NOUN_ID;
                    echoed.rid = GENERAL_NOUN_ID;
                    segment.candidates.push(echoed);
                }
            }
        }
        true
    }
}

#[derive(Default)]
pub(crate) struct PredictorState {
    pub requests: Vec<RequestType>,
    pub finish_calls: usize,
    pub revert_calls: usize,
}

/// Predictor stand-in: appends one candidate `<key>+` to the first
/// conversion segment. `preset_consumed` marks that candidate as already
/// partially consumed, the way a partial predictor would.
pub(crate) struct StubPredictor {
    pub fail: bool,
    pub preset_consumed: Option<u16>,
    pub state: Arc<Mutex<PredictorState>>,
}

impl StubPredictor {
    pub fn new() -> (Self, Arc<Mutex<PredictorState>>) {
        let state = Arc::new(Mutex::new(PredictorState::default()));
        (
            Self {
                fail: false,
                preset_consumed: None,
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl Predictor for StubPredictor {
    fn predict_for_request(&mut self, request: &ConversionRequest, segments: &mut Segments) -> bool {
        self.state.lock().unwrap().requests.push(request.request_type);
        if self.fail {
            return false;
        }
        if let Some(segment) = segments.conversion_segments_mut().first_mut() {
            let mut predicted = candidate(&segment.key, &format!("{}+", segment.key));
            if let Some(consumed) = self.preset_consumed {
                predicted.attributes |= Candidate::PARTIALLY_KEY_CONSUMED;
                predicted.consumed_key_size = consumed;
            }
            segment.candidates.push(predicted);
        }
        true
    }

    fn finish(&mut self, _request: &ConversionRequest, _segments: &mut Segments) {
        self.state.lock().unwrap().finish_calls += 1;
    }

    fn revert(&mut self, _segments: &mut Segments) {
        self.state.lock().unwrap().revert_calls += 1;
    }
}

#[derive(Default)]
pub(crate) struct RewriterState {
    pub rewrite_calls: usize,
    pub finish_calls: usize,
    pub focus_calls: Vec<(usize, CandidateRef)>,
}

/// Rewriter stand-in: optionally appends a fixed candidate to every
/// conversion segment, so tests can observe rewriter output surviving a
/// failed lattice conversion (and being suppressed).
pub(crate) struct StubRewriter {
    pub fail_rewrite: bool,
    pub add_value: Option<String>,
    pub state: Arc<Mutex<RewriterState>>,
}

impl StubRewriter {
    pub fn new() -> (Self, Arc<Mutex<RewriterState>>) {
        let state = Arc::new(Mutex::new(RewriterState::default()));
        (
            Self {
                fail_rewrite: false,
                add_value: None,
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl Rewriter for StubRewriter {
    fn rewrite(&mut self, _request: &ConversionRequest, segments: &mut Segments) -> bool {
        self.state.lock().unwrap().rewrite_calls += 1;
        if self.fail_rewrite {
            return false;
        }
        if let Some(value) = &self.add_value {
            for segment in segments.conversion_segments_mut() {
                segment.candidates.push(candidate(&segment.key, value));
            }
        }
        true
    }

    fn focus(
        &mut self,
        _segments: &mut Segments,
        segment_index: usize,
        candidate: CandidateRef,
    ) -> bool {
        self.state.lock().unwrap().focus_calls.push((segment_index, candidate));
        true
    }

    fn finish(&mut self, _request: &ConversionRequest, _segments: &mut Segments) {
        self.state.lock().unwrap().finish_calls += 1;
    }
}

#[derive(Default)]
pub(crate) struct StubSuppressionDictionary {
    pub entries: HashSet<(String, String)>,
}

impl StubSuppressionDictionary {
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashSet::new();
        entries.insert((key.to_string(), value.to_string()));
        Self { entries }
    }
}

impl SuppressionDictionary for StubSuppressionDictionary {
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn suppress_entry(&self, key: &str, value: &str) -> bool {
        self.entries.contains(&(key.to_string(), value.to_string()))
    }
}

pub(crate) struct StubPosMatcher;

impl PosMatcher for StubPosMatcher {
    fn general_noun_id(&self) -> u16 {
        GENERAL_NOUN_ID
    }

    fn number_id(&self) -> u16 {
        NUMBER_ID
    }

    fn unique_noun_id(&self) -> u16 {
        UNIQUE_NOUN_ID
    }
}

/// Scripted composer with a fixed reading and cursor.
pub(crate) struct StubComposer {
    pub conversion_query: String,
    pub prediction_query: String,
    pub cursor: usize,
}

impl StubComposer {
    pub fn new(query: &str) -> Self {
        Self {
            conversion_query: query.to_string(),
            prediction_query: query.to_string(),
            cursor: query.chars().count(),
        }
    }

    pub fn with_cursor(query: &str, cursor: usize) -> Self {
        Self {
            cursor,
            ..Self::new(query)
        }
    }
}

impl Composer for StubComposer {
    fn query_for_conversion(&self) -> String {
        self.conversion_query.clone()
    }

    fn query_for_prediction(&self) -> String {
        self.prediction_query.clone()
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn length(&self) -> usize {
        self.conversion_query.chars().count()
    }
}

/// A converter wired to stub collaborators, with handles to everything a
/// test wants to observe.
pub(crate) struct TestFixture {
    pub converter: Converter,
    pub immutable: Arc<StubImmutableConverter>,
    pub stats: Arc<RecordingStats>,
    pub predictor_state: Arc<Mutex<PredictorState>>,
    pub rewriter_state: Arc<Mutex<RewriterState>>,
}

pub(crate) struct FixtureBuilder {
    immutable: StubImmutableConverter,
    suppression: StubSuppressionDictionary,
    predictor_fail: bool,
    predictor_preset_consumed: Option<u16>,
    rewriter_fail: bool,
    rewriter_add_value: Option<String>,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self {
            immutable: StubImmutableConverter::echo(),
            suppression: StubSuppressionDictionary::default(),
            predictor_fail: false,
            predictor_preset_consumed: None,
            rewriter_fail: false,
            rewriter_add_value: None,
        }
    }

    pub fn immutable(mut self, immutable: StubImmutableConverter) -> Self {
        self.immutable = immutable;
        self
    }

    pub fn suppression(mut self, suppression: StubSuppressionDictionary) -> Self {
        self.suppression = suppression;
        self
    }

    pub fn predictor_fail(mut self) -> Self {
        self.predictor_fail = true;
        self
    }

    pub fn predictor_preset_consumed(mut self, consumed: u16) -> Self {
        self.predictor_preset_consumed = Some(consumed);
        self
    }

    pub fn rewriter_fail(mut self) -> Self {
        self.rewriter_fail = true;
        self
    }

    pub fn rewriter_add_value(mut self, value: &str) -> Self {
        self.rewriter_add_value = Some(value.to_string());
        self
    }

    pub fn build(self) -> TestFixture {
        let immutable = Arc::new(self.immutable);
        let stats = Arc::new(RecordingStats::new());
        let modules = Modules {
            pos_matcher: Arc::new(StubPosMatcher),
            suppression_dictionary: Arc::new(self.suppression),
            immutable_converter: Arc::clone(&immutable) as Arc<dyn ImmutableConverter>,
            stats: Arc::clone(&stats) as Arc<dyn crate::stats::StatsSink>,
        };

        let (mut predictor, predictor_state) = StubPredictor::new();
        predictor.fail = self.predictor_fail;
        predictor.preset_consumed = self.predictor_preset_consumed;

        let (mut rewriter, rewriter_state) = StubRewriter::new();
        rewriter.fail_rewrite = self.rewriter_fail;
        rewriter.add_value = self.rewriter_add_value;

        TestFixture {
            converter: Converter::with_config(
                &modules,
                Box::new(predictor),
                Box::new(rewriter),
                ConverterConfig::default(),
            ),
            immutable,
            stats,
            predictor_state,
            rewriter_state,
        }
    }
}

pub(crate) fn fixture() -> TestFixture {
    FixtureBuilder::new().build()
}
