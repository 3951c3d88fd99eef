//! Corpus-free predictor driven by tonal-function transitions.

use tracing::debug;

use crate::cadence::classify_cadence;
use crate::chord::{Alteration, ChordSpec};
use crate::predictor::Predictor;
use crate::rank::rank;
use crate::roman::{token_chord, trace_tokens};
use crate::types::{
    Candidate, Flavor, PitchClass, PredictInput, PredictorVariant, ReasonTag,
};

/// Coarse harmonic role of a chord within the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TonalFunction {
    Tonic,
    Subdominant,
    Dominant,
}

const FUNCTION_DEGREES: [(&str, TonalFunction); 5] = [
    ("I", TonalFunction::Tonic),
    ("vi", TonalFunction::Tonic),
    ("V", TonalFunction::Dominant),
    ("IV", TonalFunction::Subdominant),
    ("ii", TonalFunction::Subdominant),
];

/// Match root and quality against the key's I, vi, V, IV and ii triads.
pub fn classify_function(spec: &ChordSpec, key: PitchClass) -> Option<TonalFunction> {
    FUNCTION_DEGREES.iter().find_map(|(token, function)| {
        let degree = token_chord(token, key);
        (degree.root == spec.root && degree.quality == spec.quality).then_some(*function)
    })
}

/// Preferred continuations, most preferred first.
pub fn transitions(function: Option<TonalFunction>) -> &'static [&'static str] {
    match function {
        Some(TonalFunction::Tonic) => &["IV", "V", "ii", "vi"],
        Some(TonalFunction::Subdominant) => &["V", "I", "vi"],
        Some(TonalFunction::Dominant) => &["I", "vi", "IV"],
        None => &["I"],
    }
}

/// Base suggestions taken from the transition table.
const BASE_SUGGESTIONS: usize = 2;

const CANON: [&str; 4] = ["I", "V", "vi", "IV"];

fn flavor_candidates(flavor: Flavor, key: PitchClass) -> Vec<Candidate> {
    match flavor {
        Flavor::Plain => Vec::new(),
        Flavor::Canon => CANON
            .iter()
            .map(|token| Candidate::new(token_chord(token, key), 0.0))
            .collect(),
        Flavor::Augmented => vec![
            Candidate::new(
                token_chord("V", key).with_alteration(Alteration::Augmented),
                0.0,
            )
            .with_reason(ReasonTag::DominantMotion),
            Candidate::new(
                token_chord("I", key).with_alteration(Alteration::Augmented),
                0.0,
            ),
        ],
        Flavor::ModalInterchange => {
            // a fifth above the submediant: V/vi
            let applied = ChordSpec::major(token_chord("vi", key).root.transpose(7));
            vec![
                Candidate::new(applied, 0.0).with_reason(ReasonTag::DominantMotion),
                Candidate::new(token_chord("IV", key).toggle_mode(), 0.0)
                    .with_reason(ReasonTag::Borrowed),
            ]
        }
    }
}

/// Tonal-function rules plus an optional flavor. Ignores corpus tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RulePredictor;

impl Predictor for RulePredictor {
    fn predict(&self, input: &PredictInput) -> Vec<Candidate> {
        let key = input.key;
        let flavor = match input.variant {
            PredictorVariant::Rules(flavor) => flavor,
            PredictorVariant::Corpus => Flavor::Plain,
        };
        let trace = trace_tokens(&input.history, key);
        let function = input
            .history
            .last()
            .and_then(|entry| classify_function(&entry.spec, key));

        let mut candidates = flavor_candidates(flavor, key);
        for token in transitions(function).iter().take(BASE_SUGGESTIONS) {
            let mut candidate = Candidate::new(token_chord(token, key), 0.0)
                .with_cadence(classify_cadence(&trace, token));
            if function == Some(TonalFunction::Dominant) && *token == "I" {
                candidate = candidate.with_reason(ReasonTag::DominantMotion);
            }
            candidates.push(candidate);
        }

        // earlier candidates weigh more
        let count = candidates.len();
        let total = (count * (count + 1) / 2) as f64;
        for (i, candidate) in candidates.iter_mut().enumerate() {
            candidate.fit = (count - i) as f64 / total;
        }

        debug!(?function, ?flavor, proposed = count, "rule prediction");
        rank(candidates, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CadenceKind, ChordQuality, LogEntry};
    use pretty_assertions::assert_eq;

    fn input_after(chord: &str, flavor: Flavor) -> PredictInput {
        let history = vec![LogEntry::new(chord.parse().unwrap())];
        PredictInput::new(PitchClass::C)
            .history(history)
            .variant(PredictorVariant::Rules(flavor))
    }

    fn labels(items: &[Candidate]) -> Vec<&str> {
        items.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn classifies_by_root_and_quality() {
        let c = PitchClass::C;
        assert_eq!(classify_function(&"C".parse().unwrap(), c), Some(TonalFunction::Tonic));
        assert_eq!(classify_function(&"Am".parse().unwrap(), c), Some(TonalFunction::Tonic));
        assert_eq!(classify_function(&"G".parse().unwrap(), c), Some(TonalFunction::Dominant));
        assert_eq!(
            classify_function(&"Dm".parse().unwrap(), c),
            Some(TonalFunction::Subdominant)
        );
        // wrong quality on the right root
        assert_eq!(classify_function(&"Gm".parse().unwrap(), c), None);
        assert_eq!(
            classify_function(&ChordSpec::new(PitchClass::new(4), ChordQuality::Minor), c),
            None
        );
    }

    #[test]
    fn dominant_resolves_to_tonic_first() {
        let items = RulePredictor.predict(&input_after("G", Flavor::Plain));
        assert_eq!(items[0].label, "C");
        assert!(items[0].reasons.contains(&ReasonTag::DominantMotion));
        assert_eq!(items[1].label, "Am");
        assert_eq!(items.len(), 6);
    }

    #[test]
    fn empty_history_suggests_tonic() {
        let input = PredictInput::new(PitchClass::new(7)).variant(PredictorVariant::Rules(Flavor::Plain));
        let items = RulePredictor.predict(&input);
        assert_eq!(items[0].label, "G");
        assert!(!items[0].low_fit);
        assert!(items[1..].iter().all(|c| c.low_fit));
    }

    #[test]
    fn canon_leads_with_reference_progression() {
        let items = RulePredictor.predict(&input_after("F", Flavor::Canon));
        assert_eq!(labels(&items), vec!["C", "G", "Am", "F", "Dm", "Em"]);
    }

    #[test]
    fn canon_keeps_resolution_tags_of_base_suggestion() {
        let items = RulePredictor.predict(&input_after("G", Flavor::Canon));
        assert_eq!(items[0].label, "C");
        assert_eq!(items[0].cadence, Some(CadenceKind::Authentic));
        assert!(items[0].reasons.contains(&ReasonTag::DominantMotion));
        assert!(items[0]
            .reasons
            .contains(&ReasonTag::Cadence(CadenceKind::Authentic)));
    }

    #[test]
    fn augmented_flavor_alters_dominant_and_tonic() {
        let items = RulePredictor.predict(&input_after("C", Flavor::Augmented));
        assert_eq!(labels(&items)[..4], ["Gaug", "Caug", "F", "G"]);
        assert!(items[0].reasons.contains(&ReasonTag::DominantMotion));
    }

    #[test]
    fn modal_interchange_adds_applied_dominant_and_minor_subdominant() {
        let items = RulePredictor.predict(&input_after("C", Flavor::ModalInterchange));
        assert_eq!(labels(&items)[..2], ["E", "Fm"]);
        assert!(items[0].reasons.contains(&ReasonTag::DominantMotion));
        assert!(items[1].reasons.contains(&ReasonTag::Borrowed));
    }

    #[test]
    fn fits_descend_and_sum_to_one_before_padding() {
        let items = RulePredictor.predict(&input_after("C", Flavor::Canon));
        let scored: f64 = items.iter().filter(|c| !c.low_fit).map(|c| c.fit).sum();
        assert!(scored <= 1.0 + 1e-9);
        assert!(items.windows(2).all(|w| w[0].fit >= w[1].fit));
    }
}
