use std::collections::BTreeMap;

use tracing::debug;

use crate::roman::RomanToken;
use crate::score::Accumulator;
use crate::types::CadenceKind;

/// Bars per phrase.
pub const PHRASE_LENGTH: u8 = 8;

/// Multiplier slope for cadence weights at a phrase end: `1 + w * CADENCE_GAIN`.
pub const CADENCE_GAIN: f64 = 0.6;

/// Classify the motion from the trailing tokens of `preceding` into `candidate`.
///
/// Rules are checked in order: authentic (V to I, with or without a preceding
/// ii), plagal, deceptive, half. Without a preceding chord there is no motion
/// and nothing is classified.
pub fn classify_cadence(preceding: &[RomanToken], candidate: &str) -> Option<CadenceKind> {
    let last = preceding.last()?.as_str();

    match (last, candidate) {
        ("V", "I") => Some(CadenceKind::Authentic),
        ("IV", "I") => Some(CadenceKind::Plagal),
        ("V", "vi") => Some(CadenceKind::Deceptive),
        (_, "V") => Some(CadenceKind::Half),
        _ => None,
    }
}

/// 1-based position of `bar` inside its 8-bar phrase. Bar 0 counts as bar 1.
pub fn phrase_position(bar: u8) -> u8 {
    (bar.max(1) - 1) % PHRASE_LENGTH + 1
}

pub fn is_phrase_end(position: u8) -> bool {
    position == 4 || position == PHRASE_LENGTH
}

/// Rescale every accumulated token whose cadence kind has a weight in `weights`.
pub fn apply_phrase_end(
    acc: &mut Accumulator,
    trace: &[RomanToken],
    weights: &BTreeMap<CadenceKind, f64>,
) {
    for (token, score) in acc.iter_mut() {
        let Some(kind) = classify_cadence(trace, token.as_str()) else {
            continue;
        };
        if let Some(weight) = weights.get(&kind) {
            let factor = 1.0 + weight * CADENCE_GAIN;
            debug!(%token, %kind, factor, "cadence weighting");
            *score *= factor;
        }
    }
}
