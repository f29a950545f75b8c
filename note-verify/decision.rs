use crate::config::DEFAULT_MIN_MATCH_PERCENT;
use crate::selector::Selection;
use note_core::Score;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authenticity {
    Genuine,
    NotGenuine,
}

impl Authenticity {
    pub fn is_genuine(self) -> bool {
        self == Authenticity::Genuine
    }
}

impl fmt::Display for Authenticity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authenticity::Genuine => f.write_str("Real"),
            Authenticity::NotGenuine => f.write_str("Fake"),
        }
    }
}

/// Genuine iff the ratio reaches `threshold` (inclusive)
pub fn decide(score: &Score, threshold: f64) -> Authenticity {
    if score.match_ratio >= threshold {
        Authenticity::Genuine
    } else {
        Authenticity::NotGenuine
    }
}

/// Outcome for a candidate that had at least one reference to compare with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub authenticity: Authenticity,
    pub best_label: String,
    pub best_score: Score,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionEngine {
    threshold: f64,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_MATCH_PERCENT)
    }
}

impl DecisionEngine {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, selection: Selection) -> Verdict {
        Verdict {
            authenticity: decide(&selection.score, self.threshold),
            best_label: selection.best_label,
            best_score: selection.score,
        }
    }
}
