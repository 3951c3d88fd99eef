//! Theory prior and the additive style/mood nudges.

use crate::roman::RomanToken;
use crate::score::Accumulator;
use crate::types::{Mood, Style};

/// Baseline degree weights. Sums to 1.
pub const THEORY_PRIOR: &[(&str, f64)] = &[
    ("I", 0.20),
    ("V", 0.15),
    ("vi", 0.13),
    ("IV", 0.13),
    ("ii", 0.10),
    ("iii", 0.07),
    ("vii°", 0.05),
    ("bVII", 0.05),
    ("bVI", 0.04),
    ("bIII", 0.04),
    ("V/V", 0.04),
];

/// Fraction of each prior weight blended into every prediction.
pub const PRIOR_BLEND: f64 = 0.5;

pub fn style_nudges(style: Style) -> &'static [(&'static str, f64)] {
    match style {
        Style::JPop => &[("I", 0.02), ("vi", 0.02), ("IV", 0.01), ("V", 0.01)],
        Style::AnisonCute => &[("I", 0.02), ("IV", 0.02), ("V", 0.01)],
        Style::AnisonCool => &[("V", 0.02), ("vi", 0.02)],
        Style::CityPop => &[("ii", 0.02), ("V", 0.02), ("iii", 0.01)],
        Style::Edm => &[("V", 0.03), ("vi", 0.02)],
        Style::Rock => &[("I", 0.02), ("bVII", 0.02)],
        Style::Metal => &[("V", 0.03), ("bVI", 0.02)],
        Style::Idol => &[("I", 0.02), ("IV", 0.02)],
        Style::Denpa => &[("I", 0.02), ("V", 0.02), ("bVII", 0.01)],
        Style::LoFi => &[("vi", 0.02), ("IV", 0.02), ("ii", 0.01)],
        Style::Jazz => &[("ii", 0.03), ("V", 0.03), ("iii", 0.02)],
        Style::Halloween => &[("bVI", 0.03), ("bII", 0.02)],
    }
}

pub fn mood_nudges(mood: Mood) -> &'static [(&'static str, f64)] {
    match mood {
        Mood::None => &[],
        Mood::Stylish => &[("ii", 0.02), ("V", 0.02)],
        Mood::Emotional => &[("IV", 0.02), ("vi", 0.02)],
        Mood::Plain => &[("I", 0.01), ("iii", 0.01)],
        Mood::Tragic => &[("bVI", 0.02)],
        Mood::Fun => &[("I", 0.02), ("IV", 0.02)],
        Mood::Eerie => &[("bII", 0.02), ("bVI", 0.02)],
    }
}

fn add_all(acc: &mut Accumulator, weights: &[(&str, f64)], scale: f64) {
    for (token, weight) in weights {
        acc.add(&RomanToken::from(*token), weight * scale);
    }
}

/// Add half of the theory prior, giving every prior token a nonzero floor.
pub fn add_prior(acc: &mut Accumulator) {
    add_all(acc, THEORY_PRIOR, PRIOR_BLEND);
}

/// Add the nudge map of every style, then the mood's.
pub fn add_modifiers(acc: &mut Accumulator, styles: &[Style], mood: Mood) {
    for style in styles {
        add_all(acc, style_nudges(*style), 1.0);
    }
    add_all(acc, mood_nudges(mood), 1.0);
}
