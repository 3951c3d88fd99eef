//! End-to-end prediction scenarios through `ProgressionEngine`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use progression::corpus::{CadenceRow, CadenceTable, CorpusStore};
use progression::score::normalize;
use progression::{
    CadenceKind, ChordSpec, CorpusPredictor, Flavor, LogEntry, PitchClass, PredictInput,
    PredictorVariant, ProgressionEngine, ReasonTag, Section, Style, Tables,
};
use tempfile::TempDir;

fn history(chords: &[&str]) -> Vec<LogEntry> {
    chords
        .iter()
        .map(|c| LogEntry::new(c.parse::<ChordSpec>().unwrap()))
        .collect()
}

fn fit_of(engine: &ProgressionEngine, input: &PredictInput, label: &str) -> f64 {
    engine
        .predict(input)
        .items
        .iter()
        .find(|c| c.label == label)
        .map(|c| c.fit)
        .unwrap_or_else(|| panic!("{label} missing for bar {}", input.bar_in_phrase))
}

fn authentic_at_verse_end() -> Tables {
    let row = CadenceRow {
        genre: Style::DEFAULT.name().to_string(),
        section: Section::Verse,
        bar: 8,
        weights: BTreeMap::from([(CadenceKind::Authentic, 1.0)]),
    };
    Tables::new(CorpusStore::default(), CadenceTable::new(vec![row]))
}

#[test]
fn phrase_end_boosts_authentic_resolution() {
    let engine = ProgressionEngine::new(authentic_at_verse_end());
    let base = PredictInput::new(PitchClass::C)
        .section(Section::Verse)
        .history(history(&["C", "F", "G"]));

    let at_end = fit_of(&engine, &base.clone().bar(8), "C");
    let mid_phrase = fit_of(&engine, &base.clone().bar(7), "C");
    assert!(
        at_end > mid_phrase,
        "tonic fit {at_end} at bar 8 should exceed {mid_phrase} at bar 7"
    );

    let top = &engine.predict(&base.bar(8)).items[0];
    assert_eq!(top.label, "C");
    assert_eq!(top.cadence, Some(CadenceKind::Authentic));
}

#[test]
fn sixteenth_bar_is_a_phrase_end_too() {
    let engine = ProgressionEngine::new(authentic_at_verse_end());
    let base = PredictInput::new(PitchClass::C).history(history(&["G"]));
    assert_eq!(
        engine.predict(&base.clone().bar(16)),
        engine.predict(&base.bar(8))
    );
}

#[test]
fn empty_history_starts_on_the_tonic() {
    let engine = ProgressionEngine::new(Tables::empty());
    for key in 0..12 {
        let key = PitchClass::new(key);
        let items = engine.predict(&PredictInput::new(key)).items;
        assert_eq!(items[0].spec, ChordSpec::major(key), "key {}", key.value());
    }
}

#[test]
fn empty_history_starts_on_the_tonic_at_phrase_ends() {
    let engine = ProgressionEngine::new(Tables::bundled().unwrap());
    for key in 0..12 {
        let key = PitchClass::new(key);
        for section in [Section::Verse, Section::Pre, Section::Chorus, Section::Bridge] {
            for bar in [1, 4, 8, 12, 16] {
                let input = PredictInput::new(key).section(section).bar(bar);
                let items = engine.predict(&input).items;
                assert_eq!(
                    items[0].spec,
                    ChordSpec::major(key),
                    "key {} {section} bar {bar}",
                    key.value()
                );
                assert_eq!(items[0].cadence, None);
            }
        }
    }
}

#[test]
fn unknown_context_still_yields_six_diatonic_chords() {
    let engine = ProgressionEngine::new(Tables::empty());
    let input = PredictInput::new(PitchClass::C)
        .section(Section::Bridge)
        .bar(3)
        .history(history(&["Am"]));

    let items = engine.predict(&input).items;
    let labels: BTreeSet<&str> = items.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(items.len(), 6);
    assert_eq!(labels, BTreeSet::from(["C", "Dm", "Em", "F", "G", "Am"]));
}

#[test]
fn rules_resolve_dominant_to_tonic() {
    let engine = ProgressionEngine::new(Tables::empty());
    let input = PredictInput::new(PitchClass::C)
        .history(history(&["C", "G"]))
        .variant(PredictorVariant::Rules(Flavor::Plain));

    let items = engine.predict(&input).items;
    assert_eq!(items[0].label, "C");
    assert!(items[0].reasons.contains(&ReasonTag::DominantMotion));
}

#[test]
fn rule_padding_keeps_scored_candidates() {
    let engine = ProgressionEngine::new(Tables::empty());
    let input = PredictInput::new(PitchClass::new(9))
        .variant(PredictorVariant::Rules(Flavor::Plain));

    let items = engine.predict(&input).items;
    assert_eq!(items[0].label, "A");
    assert!(!items[0].low_fit);
    let padded: Vec<&str> = items[1..].iter().map(|c| c.label.as_str()).collect();
    assert_eq!(padded, vec!["Bm", "C#m", "D", "E", "F#m"]);
}

#[test]
fn identical_input_gives_identical_output() {
    let engine = ProgressionEngine::new(Tables::bundled().unwrap());
    let input = PredictInput::new(PitchClass::new(5))
        .section(Section::Chorus)
        .bar(4)
        .history(history(&["F", "C", "Dm", "Bb"]))
        .styles(vec![Style::JPop, Style::Rock]);

    let first = engine.predict(&input);
    for _ in 0..3 {
        assert_eq!(engine.predict(&input), first);
    }
}

#[test]
fn every_context_is_capped_and_unique() {
    let engine = ProgressionEngine::new(Tables::bundled().unwrap());
    let histories = [
        history(&[]),
        history(&["C", "G", "Am", "F"]),
        history(&["Dm", "G", "C"]),
        history(&["C#dim", "F#m7", "Bb/D"]),
    ];
    let variants = [
        PredictorVariant::Corpus,
        PredictorVariant::Rules(Flavor::Plain),
        PredictorVariant::Rules(Flavor::Canon),
        PredictorVariant::Rules(Flavor::Augmented),
        PredictorVariant::Rules(Flavor::ModalInterchange),
    ];

    for style in Style::ALL {
        for section in [Section::Verse, Section::Pre, Section::Chorus, Section::Bridge] {
            for bar in 1..=8 {
                for h in &histories {
                    for variant in variants {
                        let input = PredictInput::new(PitchClass::new(bar as i32))
                            .section(section)
                            .bar(bar)
                            .history(h.clone())
                            .styles(vec![style])
                            .variant(variant);
                        let items = engine.predict(&input).items;
                        assert!(items.len() <= 6);
                        let labels: BTreeSet<_> = items.iter().map(|c| &c.label).collect();
                        assert_eq!(labels.len(), items.len(), "{input:?}");
                        assert!(items.windows(2).all(|w| w[0].fit >= w[1].fit));
                    }
                }
            }
        }
    }
}

#[test]
fn scored_fits_sum_to_one_before_trimming() {
    let predictor = CorpusPredictor::new(Arc::new(Tables::bundled().unwrap()));
    let input = PredictInput::new(PitchClass::C)
        .section(Section::Chorus)
        .bar(8)
        .history(history(&["F", "G", "Em", "Am"]))
        .styles(vec![Style::JPop, Style::Jazz]);

    let total: f64 = normalize(&predictor.score(&input)).iter().map(|(_, f)| f).sum();
    assert!((total - 1.0).abs() < 1e-9, "fits sum to {total}");
}

#[test]
fn tables_load_from_disk() {
    let dir = TempDir::new().unwrap();
    let corpus_path = dir.path().join("corpus.json");
    let cadence_path = dir.path().join("cadence.json");
    fs::write(
        &corpus_path,
        r#"{"data":[{"genre":"Rock","section":"Verse","barIn8":2,
            "n2":[{"prev":["I"],"next":{"bVII":5.0}}]}]}"#,
    )
    .unwrap();
    fs::write(&cadence_path, r#"{"weights":[]}"#).unwrap();

    let tables = Tables::load(Some(&corpus_path), Some(&cadence_path)).unwrap();
    let engine = ProgressionEngine::new(tables);
    let input = PredictInput::new(PitchClass::C)
        .bar(2)
        .history(history(&["C"]))
        .styles(vec![Style::Rock]);

    let top = &engine.predict(&input).items[0];
    assert_eq!(top.label, "A#");
    assert!(top.reasons.contains(&ReasonTag::Borrowed));
}
