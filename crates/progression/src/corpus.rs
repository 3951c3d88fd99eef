//! Static n-gram and cadence tables.
//!
//! Loaded once (bundled JSON, files on disk, or synthetic tables in tests)
//! and shared read-only through `Arc<Tables>`. The JSON layout follows the
//! exported corpus: `{"data": [ContextRow]}` and `{"weights": [CadenceRow]}`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::roman::RomanToken;
use crate::score::Accumulator;
use crate::types::{CadenceKind, Section};

/// Damping applied to order-2 continuations, a lower-confidence signal.
pub const ORDER2_DAMPING: f64 = 0.7;

const BUNDLED_CORPUS: &str = include_str!("../data/corpus.json");
const BUNDLED_CADENCE: &str = include_str!("../data/cadence.json");

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read table file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {table} table: {source}")]
    Parse {
        table: &'static str,
        source: serde_json::Error,
    },
}

/// A preceding-token context and the weighted tokens observed to follow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NGram {
    #[serde(rename = "prev")]
    pub context: Vec<RomanToken>,
    pub next: BTreeMap<RomanToken, f64>,
}

impl NGram {
    /// True when the context is a suffix of `trace`.
    pub fn matches(&self, trace: &[RomanToken]) -> bool {
        trace.ends_with(&self.context)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRow {
    pub genre: String,
    pub section: Section,
    #[serde(rename = "barIn8")]
    pub bar_in_phrase: u8,
    #[serde(rename = "n3", default)]
    pub order3: Vec<NGram>,
    #[serde(rename = "n2", default)]
    pub order2: Vec<NGram>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceRow {
    pub genre: String,
    pub section: Section,
    pub bar: u8,
    #[serde(rename = "cadence")]
    pub weights: BTreeMap<CadenceKind, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStore {
    #[serde(rename = "data")]
    rows: Vec<ContextRow>,
}

impl CorpusStore {
    pub fn new(rows: Vec<ContextRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows_for<'a>(
        &'a self,
        genre: &'a str,
        section: Section,
        bar: u8,
    ) -> impl Iterator<Item = &'a ContextRow> + 'a {
        self.rows
            .iter()
            .filter(move |r| r.genre == genre && r.section == section && r.bar_in_phrase == bar)
    }

    /// Add corpus continuations for `trace` into `acc`.
    ///
    /// Order-3 contexts are matched against the whole trace. A row falls back
    /// to damped order-2 matching on the last token only while nothing has
    /// been accumulated yet. Genres are summed, not averaged.
    pub fn accumulate(
        &self,
        genres: &[&str],
        section: Section,
        bar: u8,
        trace: &[RomanToken],
        acc: &mut Accumulator,
    ) {
        let last = &trace[trace.len().saturating_sub(1)..];
        let mut rows_seen = 0usize;
        let mut order2_rows = 0usize;

        for genre in genres {
            for row in self.rows_for(genre, section, bar) {
                rows_seen += 1;
                for ngram in row.order3.iter().filter(|n| n.matches(trace)) {
                    for (token, weight) in &ngram.next {
                        acc.add(token, *weight);
                    }
                }

                if acc.is_empty() {
                    order2_rows += 1;
                    for ngram in row.order2.iter().filter(|n| n.matches(last)) {
                        for (token, weight) in &ngram.next {
                            acc.add(token, weight * ORDER2_DAMPING);
                        }
                    }
                }
            }
        }

        debug!(
            rows = rows_seen,
            order2_rows,
            tokens = acc.len(),
            "corpus lookup"
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadenceTable {
    #[serde(rename = "weights")]
    rows: Vec<CadenceRow>,
}

impl CadenceTable {
    pub fn new(rows: Vec<CadenceRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Weights of the first row for this genre/section/bar.
    pub fn weights_for(
        &self,
        genre: &str,
        section: Section,
        bar: u8,
    ) -> Option<&BTreeMap<CadenceKind, f64>> {
        self.rows
            .iter()
            .find(|r| r.genre == genre && r.section == section && r.bar == bar)
            .map(|r| &r.weights)
    }
}

/// Both read-only tables the corpus predictor consults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub corpus: CorpusStore,
    pub cadence: CadenceTable,
}

impl Tables {
    pub fn new(corpus: CorpusStore, cadence: CadenceTable) -> Self {
        Self { corpus, cadence }
    }

    /// No corpus data at all; the theory prior carries every prediction.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tables compiled into the crate.
    pub fn bundled() -> Result<Self, TableError> {
        Self::from_json(BUNDLED_CORPUS, BUNDLED_CADENCE)
    }

    pub fn from_json(corpus: &str, cadence: &str) -> Result<Self, TableError> {
        let corpus: CorpusStore = serde_json::from_str(corpus).map_err(|e| TableError::Parse {
            table: "corpus",
            source: e,
        })?;
        let cadence: CadenceTable =
            serde_json::from_str(cadence).map_err(|e| TableError::Parse {
                table: "cadence",
                source: e,
            })?;
        Ok(Self { corpus, cadence })
    }

    /// Load tables from disk. A missing path falls back to the bundled table.
    pub fn load(corpus: Option<&Path>, cadence: Option<&Path>) -> Result<Self, TableError> {
        let corpus_json = match corpus {
            Some(path) => read_table(path)?,
            None => BUNDLED_CORPUS.to_string(),
        };
        let cadence_json = match cadence {
            Some(path) => read_table(path)?,
            None => BUNDLED_CADENCE.to_string(),
        };
        let tables = Self::from_json(&corpus_json, &cadence_json)?;
        info!(
            corpus_rows = tables.corpus.len(),
            cadence_rows = tables.cadence.len(),
            corpus_source = %corpus.map(|p| p.display().to_string()).unwrap_or_else(|| "bundled".into()),
            "loaded progression tables"
        );
        Ok(tables)
    }
}

fn read_table(path: &Path) -> Result<String, TableError> {
    std::fs::read_to_string(path).map_err(|e| TableError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}
