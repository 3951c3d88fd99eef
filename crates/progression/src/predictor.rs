use std::sync::Arc;

use tracing::debug;

use crate::cadence::{apply_phrase_end, classify_cadence, is_phrase_end, phrase_position};
use crate::corpus::Tables;
use crate::prior::{add_modifiers, add_prior};
use crate::rank::{rank, SCORED_POOL};
use crate::roman::{token_chord, trace_tokens, RomanToken};
use crate::score::{normalize, Accumulator};
use crate::types::{Candidate, PitchClass, PredictInput, ReasonTag};

/// A next-chord prediction backend.
///
/// Implementations return ranked, deduplicated candidates; the engine picks
/// one per call from the input's variant.
pub trait Predictor: Send + Sync {
    fn predict(&self, input: &PredictInput) -> Vec<Candidate>;
}

/// Candidate for a scored roman token, tagged by its shape and cadence.
pub fn token_candidate(
    token: &RomanToken,
    fit: f64,
    key: PitchClass,
    trace: &[RomanToken],
) -> Candidate {
    let mut candidate = Candidate::new(token_chord(token.as_str(), key), fit)
        .with_cadence(classify_cadence(trace, token.as_str()));
    if token.is_borrowed() {
        candidate = candidate.with_reason(ReasonTag::Borrowed);
    }
    if token.is_secondary_dominant() {
        candidate = candidate.with_reason(ReasonTag::DominantMotion);
    }
    candidate
}

/// Corpus lookup blended with the theory prior, style/mood nudges and
/// phrase-end cadence weighting.
pub struct CorpusPredictor {
    tables: Arc<Tables>,
}

impl CorpusPredictor {
    pub fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }

    /// Raw per-token scores before normalization.
    pub fn score(&self, input: &PredictInput) -> Accumulator {
        let trace = trace_tokens(&input.history, input.key);
        let styles = input.effective_styles();
        let genres: Vec<&str> = styles.iter().map(|s| s.name()).collect();
        let position = phrase_position(input.bar_in_phrase);

        let mut acc = Accumulator::new();
        self.tables
            .corpus
            .accumulate(&genres, input.section, position, &trace, &mut acc);
        add_prior(&mut acc);
        add_modifiers(&mut acc, &styles, input.mood);

        if is_phrase_end(position) {
            let primary = genres[0];
            match self.tables.cadence.weights_for(primary, input.section, position) {
                Some(weights) => apply_phrase_end(&mut acc, &trace, weights),
                None => debug!(genre = primary, section = %input.section, position, "no cadence row"),
            }
        }
        acc
    }
}

impl Predictor for CorpusPredictor {
    fn predict(&self, input: &PredictInput) -> Vec<Candidate> {
        let trace = trace_tokens(&input.history, input.key);
        let scored = normalize(&self.score(input));

        let candidates = scored
            .iter()
            .take(SCORED_POOL)
            .map(|(token, fit)| token_candidate(token, *fit, input.key, &trace))
            .collect();
        rank(candidates, input.key)
    }
}
