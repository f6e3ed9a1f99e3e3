//! Connection-id recovery for candidates assembled outside the lattice.

use tracing::{debug, error};

use crate::request::{ConversionRequest, RequestType};
use crate::segments::{Candidate, Segments};

use super::{set_key, Converter};

const EXPAND_SIZE_START: usize = 5;
const EXPAND_SIZE_DIFF: usize = 50;
const EXPAND_SIZE_MAX: usize = 80;

impl Converter {
    /// Fill in `(lid, rid)` and costs for a candidate that a rewriter or
    /// predictor produced without lattice metadata, by converting the
    /// candidate's own key again and looking for a value match.
    ///
    /// Users almost always pick the top candidate, so the first probe asks
    /// for only a handful of candidates and the window grows step-by-step
    /// on a miss.
    pub(super) fn complete_pos_ids(&self, candidate: &mut Candidate) {
        if candidate.value.is_empty() || candidate.key.is_empty() {
            return;
        }
        if candidate.lid != 0 && candidate.rid != 0 {
            return;
        }

        // Unknown-word classes conjugate like サ変 and surface する/して
        // forms; a general noun is the safer fallback.
        candidate.lid = self.general_noun_id;
        candidate.rid = self.general_noun_id;

        let mut size = EXPAND_SIZE_START;
        while size < EXPAND_SIZE_MAX {
            let mut segments = Segments::new();
            set_key(&mut segments, &candidate.key, self.config.max_history_segments);
            // Prediction mode keeps the result to a single segment thanks
            // to realtime conversion; its candidates may be longer than the
            // query, which the value match below tolerates.
            let mut request = ConversionRequest::with_type(RequestType::Prediction);
            request.max_conversion_candidates_size = size;
            if !self.immutable_converter.convert_for_request(&request, &mut segments) {
                error!("immutable converter failed during pos id completion");
                return;
            }
            if segments.is_empty() {
                return;
            }
            for reference in &segments.segment(0).candidates {
                if reference.value == candidate.value {
                    candidate.lid = reference.lid;
                    candidate.rid = reference.rid;
                    candidate.cost = reference.cost;
                    candidate.wcost = reference.wcost;
                    candidate.structure_cost = reference.structure_cost;
                    debug!(lid = candidate.lid, rid = candidate.rid, "completed pos ids");
                    return;
                }
            }
            size += EXPAND_SIZE_DIFF;
        }
        debug!(
            key = candidate.key.as_str(),
            value = candidate.value.as_str(),
            "no matching candidate; keeping general noun ids"
        );
    }
}
