use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::types::{PredictInput, PredictOutput};

/// Default number of memoized predictions before the cache is cleared.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-memory memo of prediction results.
///
/// Cache key is the JSON encoding of the whole input plus the algorithm
/// version, so a version bump never serves stale rankings. The cache must
/// never change what a caller sees: lock poisoning and encoding failures
/// degrade to a miss.
pub struct PredictionCache {
    entries: Mutex<HashMap<String, PredictOutput>>,
    capacity: usize,
}

impl Default for PredictionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl PredictionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn key(input: &PredictInput, version: u32) -> Option<String> {
        match serde_json::to_string(input) {
            Ok(json) => Some(format!("v{version}:{json}")),
            Err(e) => {
                warn!(error = %e, "cannot encode prediction cache key");
                None
            }
        }
    }

    pub fn get(&self, input: &PredictInput, version: u32) -> Option<PredictOutput> {
        let key = Self::key(input, version)?;
        match self.entries.lock() {
            Ok(entries) => entries.get(&key).cloned(),
            Err(_) => {
                warn!("prediction cache mutex poisoned, treating as miss");
                None
            }
        }
    }

    pub fn put(&self, input: &PredictInput, version: u32, output: &PredictOutput) {
        let Some(key) = Self::key(input, version) else {
            return;
        };
        let Ok(mut entries) = self.entries.lock() else {
            warn!("prediction cache mutex poisoned, skipping store");
            return;
        };
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            debug!(capacity = self.capacity, "prediction cache full, clearing");
            entries.clear();
        }
        entries.insert(key, output.clone());
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::ChordSpec;
    use crate::types::{Candidate, PitchClass, Section};

    fn sample_output() -> PredictOutput {
        PredictOutput {
            items: vec![Candidate::new(ChordSpec::major(PitchClass::C), 0.5)],
        }
    }

    #[test]
    fn cache_miss_returns_none() {
        let cache = PredictionCache::new();
        assert!(cache.get(&PredictInput::new(PitchClass::C), 1).is_none());
    }

    #[test]
    fn cache_roundtrip() {
        let cache = PredictionCache::new();
        let input = PredictInput::new(PitchClass::C).section(Section::Chorus);
        cache.put(&input, 1, &sample_output());

        let retrieved = cache.get(&input, 1).unwrap();
        assert_eq!(retrieved, sample_output());
        assert!(cache.get(&input.clone().bar(2), 1).is_none());
    }

    #[test]
    fn version_mismatch_is_cache_miss() {
        let cache = PredictionCache::new();
        let input = PredictInput::new(PitchClass::C);
        cache.put(&input, 1, &sample_output());

        // Same input, different version = miss
        assert!(cache.get(&input, 2).is_none());
    }

    #[test]
    fn full_cache_starts_over() {
        let cache = PredictionCache::with_capacity(2);
        for bar in 1..=3 {
            cache.put(&PredictInput::new(PitchClass::C).bar(bar), 1, &sample_output());
        }
        assert_eq!(cache.len(), 1);
    }
}
