use crate::roman::RomanToken;

/// Token scores in first-insertion order.
///
/// Order matters: ties after normalization keep the order tokens were first
/// scored in, so two identical inputs always rank identically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    entries: Vec<(RomanToken, f64)>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, token: &RomanToken, weight: f64) {
        match self.entries.iter_mut().find(|(t, _)| t == token) {
            Some((_, score)) => *score += weight,
            None => self.entries.push((token.clone(), weight)),
        }
    }

    pub fn get(&self, token: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(t, _)| t.as_str() == token)
            .map(|(_, score)| *score)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(RomanToken, f64)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (RomanToken, f64)> {
        self.entries.iter_mut()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, score)| score).sum()
    }
}

/// Scores divided by their total, highest first. Ties keep insertion order.
///
/// A non-positive total is treated as 1 so degenerate input stays finite.
pub fn normalize(acc: &Accumulator) -> Vec<(RomanToken, f64)> {
    let total = acc.sum();
    let total = if total > 0.0 { total } else { 1.0 };

    let mut scored: Vec<(RomanToken, f64)> = acc
        .iter()
        .map(|(token, score)| (token.clone(), score / total))
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}
