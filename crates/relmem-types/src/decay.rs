//! Decay categories and their per-day rates.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::relationship::kinds;

/// Category selecting how fast a record's confidence decays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayCategory {
    Preference,
    Search,
    Visit,
    Interest,
    Fact,
    Default,
}

impl DecayCategory {
    /// Exponential decay rate per day.
    pub fn rate_per_day(&self) -> f64 {
        match self {
            DecayCategory::Preference => 0.01,
            DecayCategory::Search => 0.1,
            DecayCategory::Visit => 0.2,
            DecayCategory::Interest => 0.02,
            DecayCategory::Fact => 0.005,
            DecayCategory::Default => 0.01,
        }
    }

    /// Category of a relationship, chosen by its type.
    pub fn for_relationship_type(rel_type: &str) -> Self {
        match rel_type {
            kinds::PREFERS => DecayCategory::Preference,
            kinds::RECENTLY_SEARCHED => DecayCategory::Search,
            kinds::RECENTLY_VISITED => DecayCategory::Visit,
            kinds::INTERESTED_IN => DecayCategory::Interest,
            _ => DecayCategory::Default,
        }
    }
}

impl fmt::Display for DecayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecayCategory::Preference => write!(f, "preference"),
            DecayCategory::Search => write!(f, "search"),
            DecayCategory::Visit => write!(f, "visit"),
            DecayCategory::Interest => write!(f, "interest"),
            DecayCategory::Fact => write!(f, "fact"),
            DecayCategory::Default => write!(f, "default"),
        }
    }
}
