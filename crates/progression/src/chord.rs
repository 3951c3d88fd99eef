use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ChordQuality, PitchClass};

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

pub fn note_name(pitch_class: PitchClass, use_flats: bool) -> &'static str {
    let idx = pitch_class.value() as usize;
    if use_flats {
        NOTE_NAMES_FLAT[idx]
    } else {
        NOTE_NAMES_SHARP[idx]
    }
}

/// Parse a note name (`C`, `F#`, `Bb`, `E#`, `Cb`, unicode accidentals too).
pub fn parse_note(name: &str) -> Option<PitchClass> {
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let shift: i32 = match chars.as_str() {
        "" => 0,
        "#" | "♯" => 1,
        "b" | "♭" => -1,
        _ => return None,
    };
    Some(PitchClass::new(base + shift))
}

/// Chord extensions, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tension {
    #[serde(rename = "maj7")]
    Major7,
    #[serde(rename = "7")]
    Seventh,
    #[serde(rename = "6")]
    Sixth,
    #[serde(rename = "add9")]
    Add9,
    #[serde(rename = "9")]
    Ninth,
    #[serde(rename = "b9")]
    FlatNinth,
    #[serde(rename = "#9")]
    SharpNinth,
    #[serde(rename = "11")]
    Eleventh,
    #[serde(rename = "b11")]
    FlatEleventh,
    #[serde(rename = "#11")]
    SharpEleventh,
    #[serde(rename = "13")]
    Thirteenth,
    #[serde(rename = "b13")]
    FlatThirteenth,
    #[serde(rename = "#13")]
    SharpThirteenth,
}

impl Tension {
    pub const ALL: [Tension; 13] = [
        Tension::Major7,
        Tension::Seventh,
        Tension::Sixth,
        Tension::Add9,
        Tension::Ninth,
        Tension::FlatNinth,
        Tension::SharpNinth,
        Tension::Eleventh,
        Tension::FlatEleventh,
        Tension::SharpEleventh,
        Tension::Thirteenth,
        Tension::FlatThirteenth,
        Tension::SharpThirteenth,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Tension::Major7 => "maj7",
            Tension::Seventh => "7",
            Tension::Sixth => "6",
            Tension::Add9 => "add9",
            Tension::Ninth => "9",
            Tension::FlatNinth => "b9",
            Tension::SharpNinth => "#9",
            Tension::Eleventh => "11",
            Tension::FlatEleventh => "b11",
            Tension::SharpEleventh => "#11",
            Tension::Thirteenth => "13",
            Tension::FlatThirteenth => "b13",
            Tension::SharpThirteenth => "#13",
        }
    }

    /// Semitones above the root when voiced.
    pub fn interval(&self) -> u8 {
        match self {
            Tension::Major7 => 11,
            Tension::Seventh => 10,
            Tension::Sixth => 9,
            Tension::Add9 | Tension::Ninth => 14,
            Tension::FlatNinth => 13,
            Tension::SharpNinth => 15,
            Tension::Eleventh => 17,
            Tension::FlatEleventh => 16,
            Tension::SharpEleventh => 18,
            Tension::Thirteenth => 21,
            Tension::FlatThirteenth => 20,
            Tension::SharpThirteenth => 22,
        }
    }

    /// Upper extensions that imply a seventh underneath.
    pub fn implies_seventh(&self) -> bool {
        !matches!(
            self,
            Tension::Major7 | Tension::Seventh | Tension::Sixth | Tension::Add9
        )
    }

    fn bit(&self) -> u16 {
        1 << (*self as u16)
    }
}

/// Set of tensions as a bitmask: bit i set means `Tension::ALL[i]` is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Tension>", into = "Vec<Tension>")]
pub struct TensionSet(u16);

impl TensionSet {
    pub const EMPTY: TensionSet = TensionSet(0);

    pub fn single(tension: Tension) -> Self {
        TensionSet(tension.bit())
    }

    pub fn contains(&self, tension: Tension) -> bool {
        self.0 & tension.bit() != 0
    }

    pub fn insert(&mut self, tension: Tension) {
        self.0 |= tension.bit();
    }

    pub fn remove(&mut self, tension: Tension) {
        self.0 &= !tension.bit();
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Tensions in display order.
    pub fn iter(&self) -> impl Iterator<Item = Tension> + '_ {
        Tension::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

impl FromIterator<Tension> for TensionSet {
    fn from_iter<I: IntoIterator<Item = Tension>>(iter: I) -> Self {
        let mut set = TensionSet::EMPTY;
        for tension in iter {
            set.insert(tension);
        }
        set
    }
}

impl From<Vec<Tension>> for TensionSet {
    fn from(tensions: Vec<Tension>) -> Self {
        tensions.into_iter().collect()
    }
}

impl From<TensionSet> for Vec<Tension> {
    fn from(set: TensionSet) -> Self {
        set.iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suspension {
    Sus2,
    Sus4,
}

impl Suspension {
    pub fn symbol(&self) -> &'static str {
        match self {
            Suspension::Sus2 => "sus2",
            Suspension::Sus4 => "sus4",
        }
    }
}

/// Triad modification applied on top of the quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alteration {
    #[serde(rename = "b5")]
    FlatFive,
    #[serde(rename = "aug")]
    Augmented,
    #[serde(rename = "dim")]
    Diminished,
}

impl Alteration {
    pub fn symbol(&self) -> &'static str {
        match self {
            Alteration::FlatFive => "b5",
            Alteration::Augmented => "aug",
            Alteration::Diminished => "dim",
        }
    }
}

/// An absolute chord: root, quality and modifiers.
///
/// Copyable and comparable; the modifier collections are fixed-size.
/// Deserialized values are normalized, so a stored suspended chord is never
/// minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StoredChordSpec")]
pub struct ChordSpec {
    pub root: PitchClass,
    pub quality: ChordQuality,
    pub tensions: TensionSet,
    pub suspension: Option<Suspension>,
    pub alteration: Option<Alteration>,
    pub on_bass: Option<PitchClass>,
}

/// Wire shape of [`ChordSpec`] before normalization.
#[derive(Deserialize)]
struct StoredChordSpec {
    root: PitchClass,
    quality: ChordQuality,
    #[serde(default)]
    tensions: TensionSet,
    #[serde(default)]
    suspension: Option<Suspension>,
    #[serde(default)]
    alteration: Option<Alteration>,
    #[serde(default)]
    on_bass: Option<PitchClass>,
}

impl From<StoredChordSpec> for ChordSpec {
    fn from(stored: StoredChordSpec) -> Self {
        ChordSpec {
            root: stored.root,
            quality: stored.quality,
            tensions: stored.tensions,
            suspension: stored.suspension,
            alteration: stored.alteration,
            on_bass: stored.on_bass,
        }
        .normalized()
    }
}

impl ChordSpec {
    pub fn new(root: PitchClass, quality: ChordQuality) -> Self {
        Self {
            root,
            quality,
            tensions: TensionSet::EMPTY,
            suspension: None,
            alteration: None,
            on_bass: None,
        }
    }

    pub fn major(root: PitchClass) -> Self {
        Self::new(root, ChordQuality::Major)
    }

    pub fn minor(root: PitchClass) -> Self {
        Self::new(root, ChordQuality::Minor)
    }

    /// A suspended chord has no third, so it cannot be minor.
    pub fn normalized(mut self) -> Self {
        if self.suspension.is_some() && self.quality == ChordQuality::Minor {
            self.quality = ChordQuality::Major;
        }
        self
    }

    /// Display label: root + quality + tensions + shape + `/bass`.
    pub fn label(&self) -> String {
        let spec = self.normalized();
        let mut label = String::from(note_name(spec.root, false));
        label.push_str(spec.quality.suffix());
        for tension in spec.tensions.iter() {
            label.push_str(tension.symbol());
        }
        if let Some(sus) = spec.suspension {
            label.push_str(sus.symbol());
        }
        if let Some(alt) = spec.alteration {
            if alt.symbol() != spec.quality.suffix() {
                label.push_str(alt.symbol());
            }
        }
        if let Some(bass) = spec.on_bass {
            label.push('/');
            label.push_str(note_name(bass, false));
        }
        label
    }

    fn is_shaped(&self) -> bool {
        self.suspension.is_some()
            || matches!(
                self.alteration,
                Some(Alteration::Augmented | Alteration::Diminished)
            )
    }

    /// Flip major/minor. Suspended and dim/aug chords are left alone.
    pub fn toggle_mode(self) -> Self {
        if self.is_shaped() {
            return self;
        }
        let quality = match self.quality {
            ChordQuality::Major => ChordQuality::Minor,
            ChordQuality::Minor => ChordQuality::Major,
            other => other,
        };
        Self { quality, ..self }
    }

    /// Replace the tension set with a single tension. Ignored on dim/aug shapes.
    pub fn with_tension(self, tension: Tension) -> Self {
        if matches!(
            self.alteration,
            Some(Alteration::Augmented | Alteration::Diminished)
        ) {
            return self;
        }
        Self {
            tensions: TensionSet::single(tension),
            ..self
        }
    }

    pub fn with_suspension(self, suspension: Suspension) -> Self {
        Self {
            suspension: Some(suspension),
            alteration: None,
            ..self
        }
        .normalized()
    }

    /// Set the triad alteration; dim/aug drop tensions and the minor third.
    pub fn with_alteration(self, alteration: Alteration) -> Self {
        let mut spec = Self {
            suspension: None,
            alteration: Some(alteration),
            ..self
        };
        if matches!(alteration, Alteration::Augmented | Alteration::Diminished) {
            spec.tensions.clear();
            if spec.quality == ChordQuality::Minor {
                spec.quality = ChordQuality::Major;
            }
        }
        spec
    }

    pub fn with_bass(self, bass: PitchClass) -> Self {
        Self {
            on_bass: Some(bass),
            ..self
        }
    }

    /// Back to a plain triad. Altered chords fall back to major.
    pub fn reset_triad(self) -> Self {
        let quality = if self.alteration.is_some() {
            ChordQuality::Major
        } else {
            self.quality
        };
        Self::new(self.root, quality)
    }
}

impl fmt::Display for ChordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChordParseError {
    #[error("empty chord name")]
    Empty,
    #[error("invalid root note in {0:?}")]
    Root(String),
    #[error("invalid bass note in {0:?}")]
    Bass(String),
    #[error("unrecognized chord suffix {suffix:?} in {name:?}")]
    Suffix { name: String, suffix: String },
}

/// Modifier spellings accepted after the quality, longest first.
const MODIFIER_SPELLINGS: &[&str] = &[
    "maj7", "add9", "sus2", "sus4", "#11", "b11", "#13", "b13", "#9", "b9", "b5", "11", "13",
    "9", "7", "6",
];

impl FromStr for ChordSpec {
    type Err = ChordParseError;

    /// Parse simple chord names: `C`, `F#m`, `Bbmaj7`, `Bdim`, `Am7b5`, `Csus4/G`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(ChordParseError::Empty);
        }

        let (body, bass) = match name.split_once('/') {
            Some((body, bass)) => {
                let bass_pc =
                    parse_note(bass.trim()).ok_or_else(|| ChordParseError::Bass(name.into()))?;
                (body, Some(bass_pc))
            }
            None => (name, None),
        };

        let root_len = body
            .char_indices()
            .nth(1)
            .filter(|(_, c)| matches!(c, '#' | 'b' | '♯' | '♭'))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or_else(|| body.chars().next().map(char::len_utf8).unwrap_or(0));
        let root =
            parse_note(&body[..root_len]).ok_or_else(|| ChordParseError::Root(name.into()))?;
        let mut rest = &body[root_len..];

        let mut spec = ChordSpec::major(root);
        if let Some(r) = rest.strip_prefix("dim") {
            spec.quality = ChordQuality::Diminished;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("aug").or_else(|| rest.strip_prefix('+')) {
            spec.quality = ChordQuality::Augmented;
            rest = r;
        } else if rest.starts_with('m') && !rest.starts_with("maj") {
            spec.quality = ChordQuality::Minor;
            rest = &rest[1..];
        }

        while !rest.is_empty() {
            let spelling = MODIFIER_SPELLINGS
                .iter()
                .find(|sp| rest.starts_with(**sp))
                .ok_or_else(|| ChordParseError::Suffix {
                    name: name.into(),
                    suffix: rest.into(),
                })?;
            match *spelling {
                "sus2" => spec.suspension = Some(Suspension::Sus2),
                "sus4" => spec.suspension = Some(Suspension::Sus4),
                "b5" => spec.alteration = Some(Alteration::FlatFive),
                other => {
                    if let Some(t) = Tension::ALL.iter().find(|t| t.symbol() == other) {
                        spec.tensions.insert(*t);
                    }
                }
            }
            rest = &rest[spelling.len()..];
        }

        spec.on_bass = bass;
        Ok(spec.normalized())
    }
}
