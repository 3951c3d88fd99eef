//! Next-chord recommendation engine.
//!
//! Turns a chord history plus key, phrase position and style/mood tags into
//! at most six ranked, uniquely labelled candidates. Two predictors share the
//! final ranking step: the corpus predictor (n-gram tables blended with a
//! theory prior and cadence weighting) and a corpus-free rule predictor.

pub mod cache;
pub mod cadence;
pub mod chord;
pub mod companion;
pub mod corpus;
pub mod history;
pub mod predictor;
pub mod prior;
pub mod rank;
pub mod roman;
pub mod rules;
pub mod score;
pub mod types;
pub mod voicing;

pub use cache::PredictionCache;
pub use chord::{Alteration, ChordParseError, ChordSpec, Suspension, Tension, TensionSet};
pub use companion::{Companion, CompanionEvent, CompanionLine, Expression, PlainCompanion};
pub use corpus::{TableError, Tables};
pub use predictor::{CorpusPredictor, Predictor};
pub use roman::{degree_to_chord, trace_tokens, RomanToken};
pub use rules::RulePredictor;
pub use types::{
    CadenceKind, Candidate, ChordQuality, Duration, Flavor, LogEntry, Mood, PitchClass,
    PredictInput, PredictOutput, PredictorVariant, ReasonTag, Section, Style,
};
pub use voicing::{frequencies, Octave};

use std::sync::Arc;

use tracing::debug;

/// Current algorithm version; bump to invalidate memoized predictions.
pub const CURRENT_VERSION: u32 = 1;

/// Prediction entry point.
///
/// Holds the read-only tables through its corpus predictor and dispatches
/// each call on [`PredictInput::variant`]. Calls are independent; the
/// optional cache is a pure memo.
pub struct ProgressionEngine {
    corpus: Arc<dyn Predictor>,
    rules: Arc<dyn Predictor>,
    cache: Option<PredictionCache>,
}

impl ProgressionEngine {
    /// Create with the corpus and rule predictors over `tables`.
    pub fn new(tables: Tables) -> Self {
        Self::with_predictors(
            Arc::new(CorpusPredictor::new(Arc::new(tables))),
            Arc::new(RulePredictor),
        )
    }

    /// Create with custom predictors (for testing or alternative backends).
    pub fn with_predictors(corpus: Arc<dyn Predictor>, rules: Arc<dyn Predictor>) -> Self {
        Self {
            corpus,
            rules,
            cache: None,
        }
    }

    /// Memoize predictions by full input.
    pub fn with_cache(mut self, cache: PredictionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn predict(&self, input: &PredictInput) -> PredictOutput {
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(input, CURRENT_VERSION)) {
            debug!("prediction cache hit");
            return cached;
        }

        let predictor = match input.variant {
            PredictorVariant::Corpus => &self.corpus,
            PredictorVariant::Rules(_) => &self.rules,
        };
        let output = PredictOutput {
            items: predictor.predict(input),
        };
        debug!(
            variant = ?input.variant,
            history = input.history.len(),
            items = output.items.len(),
            top = output.items.first().map(|c| c.label.as_str()).unwrap_or("-"),
            "predicted"
        );

        if let Some(cache) = &self.cache {
            cache.put(input, CURRENT_VERSION, &output);
        }
        output
    }
}
