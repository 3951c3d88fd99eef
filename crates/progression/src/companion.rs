//! Companion reactions to editor and engine events.
//!
//! Purely cosmetic. Nothing here feeds back into scoring; the engine only
//! supplies the labels and reason tags that [`CompanionEvent::predicted`]
//! carries.

use serde::{Deserialize, Serialize};

use crate::types::Candidate;

/// Named events the companion reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum CompanionEvent {
    Idle,
    PickedKey { key: String },
    AddedChord { label: String },
    ModifiedChord { from: String, to: String },
    Predicted {
        from: Option<String>,
        to: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
    },
    PredictFail,
    Play,
    Stop,
    Export,
    Share,
    Error,
    StyleChanged { styles: Vec<String> },
    MoodChanged { mood: String },
    OnChordStart,
    OnChordApply { bass: String },
    BatchInsert,
}

impl CompanionEvent {
    /// A prediction applied after `from`, tagged with the candidate's reasons.
    pub fn predicted(from: Option<&str>, candidate: &Candidate) -> Self {
        CompanionEvent::Predicted {
            from: from.map(str::to_string),
            to: Some(candidate.label.clone()),
            tags: candidate.reasons.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn tags(&self) -> &[String] {
        match self {
            CompanionEvent::Predicted { tags, .. } => tags,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Normal,
    Smile,
    Idea,
    Sweat,
    Sad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionLine {
    pub expression: Expression,
    pub text: String,
}

pub trait Companion: Send + Sync {
    fn react(&self, event: &CompanionEvent) -> CompanionLine;
}

/// Deterministic companion: fixed lines, expression chosen from tags first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCompanion;

impl PlainCompanion {
    pub fn expression(event: &CompanionEvent) -> Expression {
        let has = |needle: &str| event.tags().iter().any(|t| t.contains(needle));

        match event {
            CompanionEvent::Error | CompanionEvent::PredictFail => return Expression::Sweat,
            _ if has("cadence") => return Expression::Smile,
            _ if has("borrowed") || has("DM") => return Expression::Idea,
            _ => {}
        }

        match event {
            CompanionEvent::PickedKey { .. }
            | CompanionEvent::ModifiedChord { .. }
            | CompanionEvent::Predicted { .. }
            | CompanionEvent::StyleChanged { .. }
            | CompanionEvent::MoodChanged { .. }
            | CompanionEvent::OnChordStart => Expression::Idea,
            CompanionEvent::AddedChord { .. }
            | CompanionEvent::OnChordApply { .. }
            | CompanionEvent::Play
            | CompanionEvent::Export
            | CompanionEvent::Share
            | CompanionEvent::BatchInsert => Expression::Smile,
            _ => Expression::Normal,
        }
    }

    pub fn text(event: &CompanionEvent) -> String {
        match event {
            CompanionEvent::Idle => "Let's build a progression that feels good.".into(),
            CompanionEvent::PickedKey { key } => {
                format!("Key {key} it is. Here are the diatonic chords.")
            }
            CompanionEvent::AddedChord { label } => format!("Added {label}. What comes next?"),
            CompanionEvent::ModifiedChord { from, to } => format!("Changed {from} to {to}."),
            CompanionEvent::Predicted { from, to, tags } => {
                let from = from.as_deref().unwrap_or("?");
                let to = to.as_deref().unwrap_or("?");
                if tags.is_empty() {
                    format!("{from} -> {to} sounds nice.")
                } else {
                    format!("{from} -> {to} sounds nice ({}).", tags.join(", "))
                }
            }
            CompanionEvent::PredictFail => "Hard to say yet. Add one more chord?".into(),
            CompanionEvent::Play => "Here we go!".into(),
            CompanionEvent::Stop => "Stopped. What should we change?".into(),
            CompanionEvent::Export => "Exported as text, ready to paste.".into(),
            CompanionEvent::Share => "Share link is ready.".into(),
            CompanionEvent::Error => "Oops, something went wrong. Let's try again.".into(),
            CompanionEvent::StyleChanged { styles } => {
                if styles.is_empty() {
                    "No style selected, using the default flavour.".into()
                } else {
                    format!("Switching to {}.", styles.join(" / "))
                }
            }
            CompanionEvent::MoodChanged { mood } => format!("Leaning toward a {mood} mood."),
            CompanionEvent::OnChordStart => "Pick a bass note for a slash chord.".into(),
            CompanionEvent::OnChordApply { bass } => format!("Bass moved to {bass}."),
            CompanionEvent::BatchInsert => "Batch inserted. Now add some seasoning.".into(),
        }
    }
}

impl Companion for PlainCompanion {
    fn react(&self, event: &CompanionEvent) -> CompanionLine {
        CompanionLine {
            expression: Self::expression(event),
            text: Self::text(event),
        }
    }
}
