//! Recency scoring for claim groups
//!
//! A dated claim loses recency linearly over the configured window and
//! bottoms out at the floor. Undated groups get a fixed neutral score.

use chrono::NaiveDate;

use crate::claim::Claim;
use crate::config::RecencyConfig;

/// Recency scorer anchored at a fixed "today"
#[derive(Debug, Clone, Copy)]
pub struct RecencyScorer {
    config: RecencyConfig,
    today: NaiveDate,
}

impl RecencyScorer {
    pub fn new(config: RecencyConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Recency of a single date (0.0-1.0)
    pub fn recency_score(&self, date: Option<NaiveDate>) -> f64 {
        let Some(date) = date else {
            return self.config.undated;
        };

        let days = (self.today - date).num_days();
        if days <= 0 {
            return 1.0; // today or future
        }

        let decayed = 1.0 - days as f64 / self.config.window_days;
        decayed.clamp(self.config.floor, 1.0)
    }

    /// Most recent temporal context in a set of claims
    pub fn most_recent<'a>(&self, claims: impl IntoIterator<Item = &'a Claim>) -> Option<NaiveDate> {
        claims.into_iter().filter_map(|c| c.temporal_context).max()
    }

    /// Whether a date falls inside the recency window
    pub fn is_recent(&self, date: NaiveDate) -> bool {
        let days = (self.today - date).num_days();
        (days as f64) <= self.config.window_days
    }
}
