//! Read-only request context threaded through every conversion operation.

use std::sync::Arc;

/// Upstream keystroke→reading state. The session never mutates the
/// composer; it only asks for query strings and the cursor position.
pub trait Composer {
    /// The reading to convert (trailing incomplete romaji kept as-is).
    fn query_for_conversion(&self) -> String;
    /// The reading to predict from (trailing incomplete romaji folded).
    fn query_for_prediction(&self) -> String;
    /// Cursor position in characters.
    fn cursor(&self) -> usize;
    /// Composition length in characters.
    fn length(&self) -> usize;
}

/// What the session is asking the engine to do with the current reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestType {
    #[default]
    Conversion,
    Prediction,
    Suggestion,
    PartialPrediction,
    PartialSuggestion,
    ReverseConversion,
}

/// Which composer query feeds a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeySelection {
    #[default]
    ConversionKey,
    PredictionKey,
}

/// Client-side knobs forwarded from the frontend.
#[derive(Debug, Clone, Default)]
pub struct ClientRequest {
    pub zero_query_suggestion: bool,
    pub mixed_conversion: bool,
    /// Cap on ranked candidates per segment, if the client sets one.
    pub candidates_size_limit: Option<usize>,
}

/// Immutable context for one conversion operation.
#[derive(Clone)]
pub struct ConversionRequest {
    pub request_type: RequestType,
    pub composer: Option<Arc<dyn Composer>>,
    pub composer_key_selection: KeySelection,
    pub client: ClientRequest,
    /// Upper bound on candidates the lattice converter should produce.
    pub max_conversion_candidates_size: usize,
    /// Force a segment reset before prediction even when the key is
    /// unchanged. Mobile predictors leave this unset so expansion results
    /// append to suggestions already on screen.
    pub should_call_set_key_in_prediction: bool,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            request_type: RequestType::default(),
            composer: None,
            composer_key_selection: KeySelection::default(),
            client: ClientRequest::default(),
            max_conversion_candidates_size: 200,
            should_call_set_key_in_prediction: false,
        }
    }
}

impl ConversionRequest {
    pub fn with_type(request_type: RequestType) -> Self {
        Self {
            request_type,
            ..Self::default()
        }
    }

    /// Clone of this request with only the request type replaced.
    pub fn with_request_type(&self, request_type: RequestType) -> Self {
        Self {
            request_type,
            ..self.clone()
        }
    }
}
