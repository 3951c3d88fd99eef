//! Chord voicing for the audio collaborator.
//!
//! Produces frequencies only: bass first when the chord has one, then the
//! upper voices from low to high. Playback lives elsewhere.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::chord::{Alteration, ChordSpec, Suspension};
use crate::types::ChordQuality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Octave {
    /// Root voiced from C3
    #[default]
    Normal,
    /// Root voiced from C4
    High,
}

impl Octave {
    fn root_base(&self) -> u8 {
        match self {
            Octave::Normal => 48,
            Octave::High => 60,
        }
    }

    fn bass_base(&self) -> u8 {
        match self {
            Octave::Normal => 36,
            Octave::High => 48,
        }
    }
}

pub fn midi_to_hz(note: u8) -> f64 {
    440.0 * 2f64.powf((f64::from(note) - 69.0) / 12.0)
}

/// Semitone offsets above the root, ascending.
pub fn intervals(spec: &ChordSpec) -> Vec<u8> {
    let spec = spec.normalized();
    let mut iv: BTreeSet<u8> = match (spec.suspension, spec.alteration, spec.quality) {
        (Some(Suspension::Sus2), _, _) => [0, 2, 7].into(),
        (Some(Suspension::Sus4), _, _) => [0, 5, 7].into(),
        // diminished seventh
        (None, Some(Alteration::Diminished), _) | (None, None, ChordQuality::Diminished) => {
            [0, 3, 6, 9].into()
        }
        (None, alteration, quality) => {
            let third = match quality {
                ChordQuality::Minor | ChordQuality::Diminished => 3,
                _ => 4,
            };
            let fifth = match (alteration, quality) {
                (Some(Alteration::Augmented), _) | (_, ChordQuality::Augmented) => 8,
                (Some(Alteration::FlatFive), _) => 6,
                _ => 7,
            };
            [0, third, fifth].into()
        }
    };

    for tension in spec.tensions.iter() {
        if tension.implies_seventh() && !iv.contains(&10) && !iv.contains(&11) {
            iv.insert(10);
        }
        iv.insert(tension.interval());
    }
    iv.into_iter().collect()
}

/// Frequencies in Hz for `spec`, bass first.
pub fn frequencies(spec: &ChordSpec, octave: Octave) -> Vec<f64> {
    let root = octave.root_base() + spec.root.value();
    let bass = spec
        .on_bass
        .map(|pc| midi_to_hz(octave.bass_base() + pc.value()));

    bass.into_iter()
        .chain(intervals(spec).into_iter().map(|i| midi_to_hz(root + i)))
        .collect()
}
