//! noirchord - next-chord suggestions from the command line
//!
//! Subcommands:
//! - `noirchord predict` - Rank the next chord for a progression
//! - `noirchord trace` - Show the roman-numeral reading of a progression
//! - `noirchord voice` - Print the frequencies a chord is voiced with
//! - `noirchord config` - Show the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use noirconf::NoirConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "noirchord")]
#[command(about = "Next-chord suggestions for songwriting")]
#[command(version)]
struct Cli {
    /// Config file replacing ./noirchord.toml
    #[arg(long, global = true, env = "NOIRCHORD_CONFIG")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank candidates for the next chord
    Predict {
        /// Key tonic (e.g. C, F#, Bb); defaults to the configured key
        key: Option<String>,

        /// Chords so far, comma separated (e.g. "C,G,Am,F")
        #[arg(short, long, value_delimiter = ',', conflicts_with = "history")]
        chords: Vec<String>,

        /// JSON history file as saved by the editor
        #[arg(long)]
        history: Option<PathBuf>,

        /// Section tag: Verse, Pre, Cho, D
        #[arg(short, long)]
        section: Option<String>,

        /// 1-based bar of the chord being predicted
        #[arg(short, long, default_value = "1")]
        bar: u8,

        /// Style names, comma separated
        #[arg(long, value_delimiter = ',')]
        style: Vec<String>,

        /// Mood name
        #[arg(short, long)]
        mood: Option<String>,

        /// Use the tonal-function rules instead of the corpus
        #[arg(long)]
        rules: bool,

        /// Rule flavor: plain, canon, aug, mod
        #[arg(long, requires = "rules")]
        flavor: Option<String>,

        /// Print the raw prediction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the roman numerals a progression is read as
    Trace {
        /// Key tonic
        key: String,

        /// Chords, in order
        #[arg(required = true)]
        chords: Vec<String>,
    },

    /// Print the voiced frequencies of a chord
    Voice {
        /// Chord name (e.g. Am7/G)
        chord: String,

        /// Voice an octave higher
        #[arg(long)]
        high: bool,
    },

    /// Show the effective configuration
    Config {
        /// List the files and env vars that contributed
        #[arg(long)]
        sources: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = NoirConfig::load_with_sources_from(cli.config.as_deref())
        .context("loading noirchord config")?;

    // stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.telemetry.log_level)
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let color = !cli.no_color;

    match cli.command {
        Commands::Predict {
            key,
            chords,
            history,
            section,
            bar,
            style,
            mood,
            rules,
            flavor,
            json,
        } => {
            let request = commands::PredictRequest {
                key,
                chords,
                history,
                section,
                bar,
                styles: style,
                mood,
                rules,
                flavor,
            };
            commands::predict(&config, &request, json, color)?;
        }
        Commands::Trace { key, chords } => {
            commands::trace(&key, &chords, color)?;
        }
        Commands::Voice { chord, high } => {
            commands::voice(&chord, high)?;
        }
        Commands::Config { sources: show } => {
            commands::show_config(&config, show.then_some(&sources));
        }
    }

    Ok(())
}
