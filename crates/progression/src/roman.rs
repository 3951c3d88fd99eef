use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chord::ChordSpec;
use crate::types::{ChordQuality, LogEntry, PitchClass};

/// Major-scale degree offsets in semitones: I ii iii IV V vi vii°.
pub const MAJOR_DEGREE_OFFSETS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// A key-relative chord label such as `I`, `ii`, `V/V`, `bVII`, `vii°`.
///
/// Upper case means major-rooted, lower case minor-rooted, `°` diminished
/// and a `b` prefix a chromatically lowered (borrowed) degree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RomanToken(String);

impl RomanToken {
    pub fn new(token: impl Into<String>) -> Self {
        RomanToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Flat-prefixed tokens name borrowed chords.
    pub fn is_borrowed(&self) -> bool {
        self.0.starts_with('b')
    }

    /// Applied dominants such as `V/V`.
    pub fn is_secondary_dominant(&self) -> bool {
        self.0.starts_with("V/")
    }
}

impl fmt::Display for RomanToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RomanToken {
    fn from(token: &str) -> Self {
        RomanToken(token.to_string())
    }
}

impl PartialEq<str> for RomanToken {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RomanToken {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Degree index 0..7 for a numeral that is entirely upper or lower case.
fn numeral_index(numeral: &str) -> Option<usize> {
    let upper = numeral.to_ascii_uppercase();
    let uniform_case = numeral == upper || numeral == numeral.to_ascii_lowercase();
    if !uniform_case {
        return None;
    }
    NUMERALS.iter().position(|n| *n == upper)
}

/// Resolve a roman token in `key` to a root pitch class and triad quality.
///
/// Never fails: anything unrecognized resolves to the tonic major triad.
pub fn degree_to_chord(token: &str, key: PitchClass) -> (PitchClass, ChordQuality) {
    if token == "V/V" {
        return (key.transpose(14), ChordQuality::Major);
    }

    let (flat, rest) = match token.strip_prefix('b') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let (numeral, diminished_suffix) = match rest.strip_suffix('°') {
        Some(numeral) => (numeral, true),
        None => (rest, false),
    };

    let Some(degree) = numeral_index(numeral) else {
        return (key, ChordQuality::Major);
    };

    let mut root = key.transpose(MAJOR_DEGREE_OFFSETS[degree]);
    let mut quality = if numeral.chars().all(|c| c.is_ascii_uppercase()) {
        ChordQuality::Major
    } else {
        ChordQuality::Minor
    };
    if degree == 6 || diminished_suffix {
        quality = ChordQuality::Diminished;
    }
    if flat {
        root = root.transpose(-1);
        quality = ChordQuality::Major;
    }
    (root, quality)
}

/// Concrete triad for a roman token in `key`.
pub fn token_chord(token: &str, key: PitchClass) -> ChordSpec {
    let (root, quality) = degree_to_chord(token, key);
    ChordSpec::new(root, quality)
}

/// Index (0..7) of the diatonic degree closest to `root`, ties to the lower degree.
pub fn nearest_degree(root: PitchClass, key: PitchClass) -> usize {
    let mut best = 0;
    let mut best_distance = u8::MAX;
    for (degree, offset) in MAJOR_DEGREE_OFFSETS.iter().enumerate() {
        let distance = root.cyclic_distance(key.transpose(*offset));
        if distance < best_distance {
            best_distance = distance;
            best = degree;
        }
    }
    best
}

/// Best-effort roman reconstruction of an absolute chord history in `key`.
///
/// Lossy: chromatic roots snap to the nearest diatonic degree.
pub fn trace_tokens(history: &[LogEntry], key: PitchClass) -> Vec<RomanToken> {
    history
        .iter()
        .map(|entry| {
            let spec = &entry.spec;
            let degree = nearest_degree(spec.root, key);
            let numeral = NUMERALS[degree];
            match spec.quality {
                ChordQuality::Diminished if degree == 6 => RomanToken::new("vii°"),
                ChordQuality::Minor => RomanToken::new(numeral.to_ascii_lowercase()),
                _ => RomanToken::new(numeral),
            }
        })
        .collect()
}
