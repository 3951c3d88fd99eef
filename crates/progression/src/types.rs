use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chord::ChordSpec;

/// Pitch class 0–11 (C=0, C#=1, ...). Always reduced modulo 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "u8")]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    pub fn new(value: i32) -> Self {
        PitchClass(value.rem_euclid(12) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn transpose(self, semitones: i32) -> Self {
        PitchClass::new(self.0 as i32 + semitones)
    }

    /// Shortest distance around the 12-point circle (0..=6).
    pub fn cyclic_distance(self, other: PitchClass) -> u8 {
        let up = (other.0 + 12 - self.0) % 12;
        up.min(12 - up)
    }
}

impl From<i32> for PitchClass {
    fn from(value: i32) -> Self {
        PitchClass::new(value)
    }
}

impl From<PitchClass> for u8 {
    fn from(pc: PitchClass) -> Self {
        pc.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
}

impl ChordQuality {
    /// Suffix for chord symbol display
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
        }
    }
}

/// How long a logged chord lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Duration {
    #[serde(rename = "1/2bar")]
    Half,
    #[default]
    #[serde(rename = "1bar")]
    Full,
}

impl Duration {
    pub fn bars(&self) -> f64 {
        match self {
            Duration::Half => 0.5,
            Duration::Full => 1.0,
        }
    }
}

/// One chord in the running progression. Insertion order is temporal order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntry {
    pub spec: ChordSpec,
    #[serde(default, rename = "length")]
    pub duration: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
}

impl LogEntry {
    pub fn new(spec: ChordSpec) -> Self {
        Self {
            spec,
            duration: Duration::Full,
            section: None,
        }
    }

    pub fn half(spec: ChordSpec) -> Self {
        Self {
            spec,
            duration: Duration::Half,
            section: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseTagError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseTagError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Section {
    #[default]
    Verse,
    Pre,
    #[serde(rename = "Cho")]
    Chorus,
    #[serde(rename = "D")]
    Bridge,
}

impl Section {
    /// Tag used by the corpus and cadence tables.
    pub fn tag(&self) -> &'static str {
        match self {
            Section::Verse => "Verse",
            Section::Pre => "Pre",
            Section::Chorus => "Cho",
            Section::Bridge => "D",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Section {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verse" | "a" => Ok(Section::Verse),
            "pre" | "b" => Ok(Section::Pre),
            "cho" | "chorus" => Ok(Section::Chorus),
            "d" | "bridge" => Ok(Section::Bridge),
            _ => Err(ParseTagError::new("section", s)),
        }
    }
}

/// Selectable style tags. The display name doubles as the corpus genre key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    #[serde(rename = "J-Pop")]
    JPop,
    #[serde(rename = "Anison(cute)")]
    AnisonCute,
    #[serde(rename = "Anison(cool)")]
    AnisonCool,
    #[serde(rename = "City Pop")]
    CityPop,
    #[serde(rename = "EDM")]
    Edm,
    Rock,
    Metal,
    Idol,
    Denpa,
    #[serde(rename = "Lo-fi")]
    LoFi,
    Jazz,
    Halloween,
}

impl Style {
    /// Assumed when the caller selects no style.
    pub const DEFAULT: Style = Style::JPop;

    pub const ALL: [Style; 12] = [
        Style::JPop,
        Style::AnisonCute,
        Style::AnisonCool,
        Style::CityPop,
        Style::Edm,
        Style::Rock,
        Style::Metal,
        Style::Idol,
        Style::Denpa,
        Style::LoFi,
        Style::Jazz,
        Style::Halloween,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Style::JPop => "J-Pop",
            Style::AnisonCute => "Anison(cute)",
            Style::AnisonCool => "Anison(cool)",
            Style::CityPop => "City Pop",
            Style::Edm => "EDM",
            Style::Rock => "Rock",
            Style::Metal => "Metal",
            Style::Idol => "Idol",
            Style::Denpa => "Denpa",
            Style::LoFi => "Lo-fi",
            Style::Jazz => "Jazz",
            Style::Halloween => "Halloween",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Style {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Style::ALL
            .iter()
            .copied()
            .find(|style| style.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseTagError::new("style", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    #[default]
    #[serde(rename = "-")]
    None,
    Stylish,
    Emotional,
    Plain,
    Tragic,
    Fun,
    Eerie,
}

impl Mood {
    pub fn name(&self) -> &'static str {
        match self {
            Mood::None => "-",
            Mood::Stylish => "stylish",
            Mood::Emotional => "emotional",
            Mood::Plain => "plain",
            Mood::Tragic => "tragic",
            Mood::Fun => "fun",
            Mood::Eerie => "eerie",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mood {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "-" | "" | "none" => Ok(Mood::None),
            "stylish" => Ok(Mood::Stylish),
            "emotional" => Ok(Mood::Emotional),
            "plain" => Ok(Mood::Plain),
            "tragic" => Ok(Mood::Tragic),
            "fun" => Ok(Mood::Fun),
            "eerie" => Ok(Mood::Eerie),
            _ => Err(ParseTagError::new("mood", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceKind {
    Authentic,
    Plagal,
    Deceptive,
    Half,
}

impl fmt::Display for CadenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CadenceKind::Authentic => write!(f, "authentic"),
            CadenceKind::Plagal => write!(f, "plagal"),
            CadenceKind::Deceptive => write!(f, "deceptive"),
            CadenceKind::Half => write!(f, "half"),
        }
    }
}

/// Why a candidate was proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonTag {
    DominantMotion,
    Borrowed,
    Cadence(CadenceKind),
}

impl fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonTag::DominantMotion => write!(f, "DM"),
            ReasonTag::Borrowed => write!(f, "borrowed"),
            ReasonTag::Cadence(kind) => write!(f, "cadence:{}", kind),
        }
    }
}

/// A proposed next chord.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub spec: ChordSpec,
    pub label: String,
    /// Normalized score in [0, 1]
    pub fit: f64,
    pub cadence: Option<CadenceKind>,
    pub reasons: BTreeSet<ReasonTag>,
    /// Filled in from the fixed diatonic pool rather than scored
    #[serde(default)]
    pub low_fit: bool,
}

impl Candidate {
    pub fn new(spec: ChordSpec, fit: f64) -> Self {
        Self {
            label: spec.label(),
            spec,
            fit: fit.clamp(0.0, 1.0),
            cadence: None,
            reasons: BTreeSet::new(),
            low_fit: false,
        }
    }

    pub fn with_cadence(mut self, cadence: Option<CadenceKind>) -> Self {
        if let Some(kind) = cadence {
            self.reasons.insert(ReasonTag::Cadence(kind));
        }
        self.cadence = cadence;
        self
    }

    pub fn with_reason(mut self, reason: ReasonTag) -> Self {
        self.reasons.insert(reason);
        self
    }
}

/// Mode layered on top of the rule-based predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    #[default]
    Plain,
    /// Always leads with the canon progression degrees
    Canon,
    /// Augmented dominant/tonic variants
    Augmented,
    /// Secondary dominant and borrowed subdominant
    ModalInterchange,
}

impl FromStr for Flavor {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "none" | "-" => Ok(Flavor::Plain),
            "canon" => Ok(Flavor::Canon),
            "aug" | "augmented" => Ok(Flavor::Augmented),
            "mod" | "modal" | "modal-interchange" | "modal_interchange" => {
                Ok(Flavor::ModalInterchange)
            }
            _ => Err(ParseTagError::new("flavor", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorVariant {
    #[default]
    Corpus,
    Rules(Flavor),
}

/// Everything a single prediction needs. Nothing is retained between calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictInput {
    /// Tonic of the current key
    pub key: PitchClass,
    pub section: Section,
    /// 1-based bar index; reduced to a position within an 8-bar phrase
    pub bar_in_phrase: u8,
    pub history: Vec<LogEntry>,
    pub styles: Vec<Style>,
    pub mood: Mood,
    pub variant: PredictorVariant,
}

impl PredictInput {
    pub fn new(key: PitchClass) -> Self {
        Self {
            key,
            section: Section::Verse,
            bar_in_phrase: 1,
            history: Vec::new(),
            styles: Vec::new(),
            mood: Mood::None,
            variant: PredictorVariant::Corpus,
        }
    }

    pub fn section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    pub fn bar(mut self, bar: u8) -> Self {
        self.bar_in_phrase = bar;
        self
    }

    pub fn history(mut self, history: Vec<LogEntry>) -> Self {
        self.history = history;
        self
    }

    pub fn styles(mut self, styles: Vec<Style>) -> Self {
        self.styles = styles;
        self
    }

    pub fn mood(mut self, mood: Mood) -> Self {
        self.mood = mood;
        self
    }

    pub fn variant(mut self, variant: PredictorVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Selected styles, or the default style when none are selected.
    pub fn effective_styles(&self) -> Vec<Style> {
        if self.styles.is_empty() {
            vec![Style::DEFAULT]
        } else {
            self.styles.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictOutput {
    pub items: Vec<Candidate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_class_wraps_negative_and_large() {
        assert_eq!(PitchClass::new(-1).value(), 11);
        assert_eq!(PitchClass::new(25).value(), 1);
        assert_eq!(PitchClass::new(7).transpose(7).value(), 2);
    }

    #[test]
    fn cyclic_distance_is_symmetric() {
        let c = PitchClass::new(0);
        let b = PitchClass::new(11);
        assert_eq!(c.cyclic_distance(b), 1);
        assert_eq!(b.cyclic_distance(c), 1);
        assert_eq!(c.cyclic_distance(PitchClass::new(6)), 6);
        assert_eq!(c.cyclic_distance(c), 0);
    }

    #[test]
    fn pitch_class_deserializes_modulo_twelve() {
        let pc: PitchClass = serde_json::from_str("14").unwrap();
        assert_eq!(pc.value(), 2);
        assert_eq!(serde_json::to_string(&pc).unwrap(), "2");
    }

    #[test]
    fn style_names_parse_case_insensitively() {
        assert_eq!("j-pop".parse::<Style>().unwrap(), Style::JPop);
        assert_eq!("City Pop".parse::<Style>().unwrap(), Style::CityPop);
        assert!("polka".parse::<Style>().is_err());
    }

    #[test]
    fn section_tags_match_table_keys() {
        assert_eq!(serde_json::to_string(&Section::Chorus).unwrap(), "\"Cho\"");
        assert_eq!("bridge".parse::<Section>().unwrap(), Section::Bridge);
        assert_eq!(Section::Bridge.tag(), "D");
    }

    #[test]
    fn duration_uses_bar_strings() {
        assert_eq!(serde_json::to_string(&Duration::Half).unwrap(), "\"1/2bar\"");
        assert_eq!(Duration::Full.bars(), 1.0);
    }

    #[test]
    fn reason_tags_display() {
        assert_eq!(ReasonTag::DominantMotion.to_string(), "DM");
        assert_eq!(
            ReasonTag::Cadence(CadenceKind::Plagal).to_string(),
            "cadence:plagal"
        );
    }

    #[test]
    fn empty_style_selection_uses_default() {
        let input = PredictInput::new(PitchClass::C);
        assert_eq!(input.effective_styles(), vec![Style::JPop]);
    }

    #[test]
    fn flavor_aliases() {
        assert_eq!("aug".parse::<Flavor>().unwrap(), Flavor::Augmented);
        assert_eq!("mod".parse::<Flavor>().unwrap(), Flavor::ModalInterchange);
    }
}
