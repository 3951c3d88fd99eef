use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use noirconf::{ConfigSources, NoirConfig};
use owo_colors::OwoColorize;
use progression::chord::parse_note;
use progression::history::revive_log;
use progression::{
    frequencies, trace_tokens, Candidate, ChordSpec, Companion, CompanionEvent, Flavor, LogEntry,
    Mood, Octave, PitchClass, PlainCompanion, PredictInput, PredictionCache, PredictorVariant,
    ProgressionEngine, Section, Style, Tables,
};
use tracing::info;

/// Command-line prediction request; unset fields fall back to config defaults.
#[derive(Debug, Default)]
pub struct PredictRequest {
    pub key: Option<String>,
    pub chords: Vec<String>,
    pub history: Option<PathBuf>,
    pub section: Option<String>,
    pub bar: u8,
    pub styles: Vec<String>,
    pub mood: Option<String>,
    pub rules: bool,
    pub flavor: Option<String>,
}

fn parse_key(name: &str) -> Result<PitchClass> {
    parse_note(name.trim()).ok_or_else(|| anyhow!("invalid key {name:?}"))
}

fn parse_chords(chords: &[String]) -> Result<Vec<LogEntry>> {
    chords
        .iter()
        .map(|c| {
            c.parse::<ChordSpec>()
                .map(LogEntry::new)
                .with_context(|| format!("parsing chord {c:?}"))
        })
        .collect()
}

fn load_history(request: &PredictRequest) -> Result<Vec<LogEntry>> {
    match &request.history {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading history: {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("parsing history JSON: {}", path.display()))?;
            Ok(revive_log(&value))
        }
        None => parse_chords(&request.chords),
    }
}

/// Merge the request with configured defaults into an engine input.
pub fn build_input(config: &NoirConfig, request: &PredictRequest) -> Result<PredictInput> {
    let defaults = &config.defaults;

    let key = parse_key(request.key.as_deref().unwrap_or(&defaults.key))?;
    let section: Section = request
        .section
        .as_deref()
        .unwrap_or(&defaults.section)
        .parse()?;
    let style_names = if request.styles.is_empty() {
        &defaults.styles
    } else {
        &request.styles
    };
    let styles = style_names
        .iter()
        .map(|s| s.parse::<Style>())
        .collect::<Result<Vec<_>, _>>()?;
    let mood: Mood = request.mood.as_deref().unwrap_or(&defaults.mood).parse()?;
    let variant = if request.rules {
        let flavor = match &request.flavor {
            Some(name) => name.parse::<Flavor>()?,
            None => Flavor::Plain,
        };
        PredictorVariant::Rules(flavor)
    } else {
        PredictorVariant::Corpus
    };

    Ok(PredictInput::new(key)
        .section(section)
        .bar(request.bar)
        .history(load_history(request)?)
        .styles(styles)
        .mood(mood)
        .variant(variant))
}

pub fn build_engine(config: &NoirConfig) -> Result<ProgressionEngine> {
    let tables = Tables::load(
        config.tables.corpus.as_deref(),
        config.tables.cadence.as_deref(),
    )
    .context("loading progression tables")?;

    let engine = ProgressionEngine::new(tables);
    Ok(if config.engine.memoize {
        engine.with_cache(PredictionCache::new())
    } else {
        engine
    })
}

fn format_candidate(rank: usize, candidate: &Candidate, color: bool) -> String {
    let reasons: Vec<String> = candidate.reasons.iter().map(|r| r.to_string()).collect();
    let fit = format!("{:5.1}%", candidate.fit * 100.0);
    let label = format!("{:<10}", candidate.label);
    let mut line = if color && !candidate.low_fit {
        format!("{rank}. {} {}", label.bold(), fit.green())
    } else if color {
        format!("{rank}. {} {}", label.dimmed(), fit.dimmed())
    } else {
        format!("{rank}. {label} {fit}")
    };
    if candidate.low_fit {
        line.push_str("  (low fit)");
    }
    if !reasons.is_empty() {
        let tags = format!("[{}]", reasons.join(", "));
        line.push_str("  ");
        line.push_str(&if color { tags.cyan().to_string() } else { tags });
    }
    line
}

pub fn render_candidates(items: &[Candidate], color: bool) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, c)| format_candidate(i + 1, c, color))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn predict(config: &NoirConfig, request: &PredictRequest, json: bool, color: bool) -> Result<()> {
    let input = build_input(config, request)?;
    let engine = build_engine(config)?;
    info!(history = input.history.len(), bar = input.bar_in_phrase, "predicting");

    let output = engine.predict(&input);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to format JSON")?
        );
        return Ok(());
    }

    println!("{}", render_candidates(&output.items, color));

    let companion = PlainCompanion;
    let event = match output.items.iter().find(|c| !c.low_fit) {
        Some(top) => {
            let last = input.history.last().map(|e| e.spec.label());
            CompanionEvent::predicted(last.as_deref(), top)
        }
        None => CompanionEvent::PredictFail,
    };
    let line = companion.react(&event);
    if color {
        println!("\n{}", line.text.italic());
    } else {
        println!("\n{}", line.text);
    }
    Ok(())
}

pub fn trace(key: &str, chords: &[String], color: bool) -> Result<()> {
    let key = parse_key(key)?;
    let history = parse_chords(chords)?;
    let tokens = trace_tokens(&history, key);

    for (entry, token) in history.iter().zip(&tokens) {
        let label = format!("{:<10}", entry.spec.label());
        if color {
            println!("{} {}", label, token.as_str().yellow());
        } else {
            println!("{label} {token}");
        }
    }
    Ok(())
}

pub fn voice(chord: &str, high: bool) -> Result<()> {
    let spec: ChordSpec = chord
        .parse()
        .with_context(|| format!("parsing chord {chord:?}"))?;
    let octave = if high { Octave::High } else { Octave::Normal };

    let hz: Vec<String> = frequencies(&spec, octave)
        .iter()
        .map(|f| format!("{f:.2}"))
        .collect();
    println!("{}: {}", spec.label(), hz.join(" "));
    Ok(())
}

pub fn show_config(config: &NoirConfig, sources: Option<&ConfigSources>) {
    if let Some(sources) = sources {
        if sources.files.is_empty() {
            println!("# files: none (compiled defaults)");
        }
        for file in &sources.files {
            println!("# file: {}", file.display());
        }
        for var in &sources.env_overrides {
            println!("# env: {var}");
        }
        println!();
    }
    print!("{}", config.to_toml());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn request(chords: &[&str]) -> PredictRequest {
        PredictRequest {
            chords: chords.iter().map(|c| c.to_string()).collect(),
            bar: 1,
            ..Default::default()
        }
    }

    #[test]
    fn request_overrides_config_defaults() {
        let mut config = NoirConfig::default();
        config.defaults.key = "D".into();
        config.defaults.styles = vec!["Jazz".into()];

        let mut req = request(&["G", "A"]);
        req.key = Some("Bb".into());
        req.section = Some("Cho".into());
        let input = build_input(&config, &req).unwrap();

        assert_eq!(input.key, PitchClass::new(10));
        assert_eq!(input.section, Section::Chorus);
        assert_eq!(input.styles, vec![Style::Jazz]);
        assert_eq!(input.history.len(), 2);
        assert_eq!(input.variant, PredictorVariant::Corpus);
    }

    #[test]
    fn rules_flag_selects_flavor() {
        let mut req = request(&[]);
        req.rules = true;
        req.flavor = Some("mod".into());
        let input = build_input(&NoirConfig::default(), &req).unwrap();
        assert_eq!(input.variant, PredictorVariant::Rules(Flavor::ModalInterchange));
    }

    #[test]
    fn bad_values_are_errors() {
        let mut req = request(&["Hm"]);
        assert!(build_input(&NoirConfig::default(), &req).is_err());

        req = request(&[]);
        req.key = Some("Q".into());
        assert!(build_input(&NoirConfig::default(), &req).is_err());

        req = request(&[]);
        req.styles = vec!["Polka".into()];
        assert!(build_input(&NoirConfig::default(), &req).is_err());
    }

    #[test]
    fn history_file_is_revived() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        fs::write(
            &path,
            r#"[{"length":"1/2bar","spec":{"root":7,"minor":false,"mods":["7"]}}]"#,
        )
        .unwrap();

        let mut req = request(&[]);
        req.history = Some(path);
        let input = build_input(&NoirConfig::default(), &req).unwrap();
        assert_eq!(input.history.len(), 1);
        assert_eq!(input.history[0].spec.label(), "G7");
    }

    #[test]
    fn plain_rendering_lists_every_candidate() {
        let engine = ProgressionEngine::new(Tables::empty());
        let input = build_input(&NoirConfig::default(), &request(&["C", "G"])).unwrap();
        let rendered = render_candidates(&engine.predict(&input).items, false);

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("1. "));
        assert!(lines[5].starts_with("6. "));
    }

    #[test]
    fn low_fit_rows_are_marked() {
        let mut candidate = Candidate::new(ChordSpec::minor(PitchClass::new(2)), 0.0);
        candidate.low_fit = true;
        assert_eq!(format_candidate(6, &candidate, false), "6. Dm           0.0%  (low fit)");
    }
}
