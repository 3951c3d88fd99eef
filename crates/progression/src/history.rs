//! Persisted chord history.
//!
//! The strict format is the serde encoding of `Vec<LogEntry>`. Stored
//! histories may also come from the older editor layout
//! (`{"spec": {"root", "minor", "mods", "bass"}, "length"}`), which
//! [`revive_log`] accepts without ever failing.

use serde_json::Value;
use tracing::warn;

use crate::chord::{Alteration, ChordSpec, Suspension, Tension};
use crate::types::{ChordQuality, Duration, LogEntry, PitchClass};

pub fn to_json(history: &[LogEntry]) -> serde_json::Result<String> {
    serde_json::to_string(history)
}

pub fn from_json(json: &str) -> serde_json::Result<Vec<LogEntry>> {
    serde_json::from_str(json)
}

/// Best-effort decode of a stored history.
///
/// Anything that is not an array yields an empty history. Entries that are
/// not objects default to a full bar of C major.
pub fn revive_log(value: &Value) -> Vec<LogEntry> {
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            warn!("stored history is not an array, starting empty");
        }
        return Vec::new();
    };
    items.iter().map(revive_entry).collect()
}

fn revive_entry(item: &Value) -> LogEntry {
    if let Ok(entry) = serde_json::from_value::<LogEntry>(item.clone()) {
        return entry;
    }

    let spec = item.get("spec").map(revive_spec).unwrap_or(ChordSpec::major(PitchClass::C));
    let duration = match item.get("length").and_then(Value::as_str) {
        Some("1/2bar") => Duration::Half,
        _ => Duration::Full,
    };
    let section = item
        .get("section")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok());
    LogEntry {
        spec,
        duration,
        section,
    }
}

fn pitch_class(value: Option<&Value>) -> Option<PitchClass> {
    value
        .and_then(Value::as_f64)
        .map(|n| PitchClass::new(n.trunc() as i32))
}

fn revive_spec(spec: &Value) -> ChordSpec {
    let root = pitch_class(spec.get("root")).unwrap_or(PitchClass::C);
    let quality = if spec.get("minor").and_then(Value::as_bool).unwrap_or(false) {
        ChordQuality::Minor
    } else {
        ChordQuality::Major
    };
    let mut chord = ChordSpec::new(root, quality);

    let mods = spec.get("mods").and_then(Value::as_array);
    for symbol in mods.into_iter().flatten().filter_map(Value::as_str) {
        if let Some(tension) = Tension::ALL.into_iter().find(|t| t.symbol() == symbol) {
            chord.tensions.insert(tension);
            continue;
        }
        match symbol {
            "sus2" => chord.suspension = Some(Suspension::Sus2),
            "sus4" => chord.suspension = Some(Suspension::Sus4),
            "b5" => chord.alteration = Some(Alteration::FlatFive),
            "aug" => chord = chord.with_alteration(Alteration::Augmented),
            "dim" => chord = chord.with_alteration(Alteration::Diminished),
            other => warn!(modifier = other, "dropping unknown chord modifier"),
        }
    }

    chord.on_bass = pitch_class(spec.get("bass"));
    chord.normalized()
}
