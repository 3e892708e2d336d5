//! Weather condition scoring
//!
//! Turns free-text daily condition descriptions ("Partially cloudy, rain")
//! into an ordinal 0-5 score per day, then averages the days of a forecast
//! window into one comparable destination score.
//!
//! Per day, every keyword of [`SCORE_MAP`] is checked by substring against the
//! lowercased text. No match gives the neutral score 3, several matches give
//! the lowest of them, so the worst predicted condition dominates.
//!
//! The aggregate is the mean of the daily scores rounded to two decimals,
//! half up. Rounding works on the exact fraction `sum / days`, so a mean like
//! 2.625 becomes 2.63 regardless of its binary representation.

use thiserror::Error;
use tracing::debug;

/// Score of a day whose text matches no keyword
pub const NEUTRAL_SCORE: u8 = 3;

/// Keyword to score table, checked exhaustively for every day
pub const SCORE_MAP: &[(&str, u8)] = &[
    ("thunder", 0),
    ("storm", 0),
    ("snow", 2),
    ("rain", 2),
    ("showers", 2),
    ("fog", 1),
    ("clear", 5),
    ("sunny", 5),
    ("cloud", 4),
    ("overcast", 4),
];

/// Raised when a score is requested before any day was recorded
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no daily conditions recorded since last reset")]
pub struct InsufficientDataError;

/// Lifecycle of a [`ConditionScorer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerState {
    Empty,
    Accumulating,
}

/// Score one day's condition text
pub fn score_condition(condition: &str) -> u8 {
    let lowered = condition.to_lowercase();
    SCORE_MAP
        .iter()
        .filter(|(keyword, _)| lowered.contains(keyword))
        .map(|&(_, score)| score)
        .min()
        .unwrap_or(NEUTRAL_SCORE)
}

/// Accumulates the daily conditions of one destination window.
///
/// A scorer is a single-threaded session: reset it (or build a new one)
/// before recording the conditions of another location.
#[derive(Debug, Clone, Default)]
pub struct ConditionScorer {
    conditions: Vec<String>,
}

impl ConditionScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every recorded condition
    pub fn reset(&mut self) {
        self.conditions.clear();
    }

    /// Record one day's raw condition text
    pub fn record(&mut self, condition: impl Into<String>) {
        self.conditions.push(condition.into());
    }

    /// Record several days in chronological order
    pub fn record_all<I, S>(&mut self, conditions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.extend(conditions.into_iter().map(Into::into));
    }

    pub fn state(&self) -> ScorerState {
        if self.conditions.is_empty() {
            ScorerState::Empty
        } else {
            ScorerState::Accumulating
        }
    }

    /// Number of recorded days
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Recorded conditions, oldest first
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// Score of each recorded day, in recording order
    pub fn daily_scores(&self) -> Vec<u8> {
        self.conditions.iter().map(|c| score_condition(c)).collect()
    }

    /// Mean daily score rounded half up to two decimals
    pub fn score(&self) -> Result<f64, InsufficientDataError> {
        let days = self.conditions.len() as u64;
        if days == 0 {
            return Err(InsufficientDataError);
        }

        let total: u64 = self
            .conditions
            .iter()
            .map(|c| u64::from(score_condition(c)))
            .sum();

        // floor(total / days * 100 + 0.5) without leaving integers
        let hundredths = (200 * total + days) / (2 * days);
        let score = hundredths as f64 / 100.0;

        debug!(days, total, score, "Scored forecast window");
        Ok(score)
    }
}
