use std::collections::HashMap;

use crate::roman::token_chord;
use crate::types::{Candidate, PitchClass};

/// Most candidates returned by one prediction.
pub const MAX_CANDIDATES: usize = 6;

/// Scored tokens mapped to chords before ranking.
pub const SCORED_POOL: usize = 12;

/// Fill-in degrees, in order, when fewer than six unique candidates remain.
pub const PAD_POOL: [&str; 6] = ["I", "ii", "iii", "IV", "V", "vi"];

/// Final ranking shared by every predictor.
///
/// Stable sort by fit, fold later candidates whose label repeats into the
/// first one (keeping its fit, taking their tags), pad from [`PAD_POOL`] with
/// zero-fit entries and cut to [`MAX_CANDIDATES`].
pub fn rank(mut sorted: Vec<Candidate>, key: PitchClass) -> Vec<Candidate> {
    sorted.sort_by(|a, b| b.fit.total_cmp(&a.fit));

    let mut candidates: Vec<Candidate> = Vec::with_capacity(sorted.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for candidate in sorted {
        match index.get(&candidate.label) {
            Some(&i) => absorb_tags(&mut candidates[i], candidate),
            None => {
                index.insert(candidate.label.clone(), candidates.len());
                candidates.push(candidate);
            }
        }
    }

    for token in PAD_POOL {
        if candidates.len() >= MAX_CANDIDATES {
            break;
        }
        let mut padded = Candidate::new(token_chord(token, key), 0.0);
        if !index.contains_key(&padded.label) {
            index.insert(padded.label.clone(), candidates.len());
            padded.low_fit = true;
            candidates.push(padded);
        }
    }

    candidates.truncate(MAX_CANDIDATES);
    candidates
}

fn absorb_tags(kept: &mut Candidate, dropped: Candidate) {
    if kept.cadence.is_none() {
        kept.cadence = dropped.cadence;
    }
    kept.reasons.extend(dropped.reasons);
}
