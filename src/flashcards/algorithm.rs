//! SM-2 Spaced Repetition Algorithm
//!
//! Variant of the SuperMemo 2 algorithm used to schedule card reviews.
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but upon seeing answer, remembered
//! - 2: Incorrect, but answer seemed easy to recall
//! - 3: Correct response with serious difficulty
//! - 4: Correct response after hesitation
//! - 5: Perfect response with no hesitation
//!
//! A failed recall (quality below 3) is a hard reset: interval back to one
//! day and easiness straight to the floor.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum easiness factor allowed
pub const MIN_EASINESS: f64 = 1.3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Quality must be between 0 and 5, got {0}")]
    InvalidQuality(u8),
}

/// Recall quality, 0 (blackout) to 5 (perfect)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, SchedulerError> {
        if value > Self::MAX {
            return Err(SchedulerError::InvalidQuality(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_pass(self) -> bool {
        self.0 >= 3
    }
}

impl TryFrom<u8> for Quality {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> u8 {
        q.0
    }
}

/// Result of calculating the next review
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub interval: u32,
    pub easiness: f64,
    pub next_review: NaiveDate,
}

/// Calculate the next interval and easiness factor
///
/// # Arguments
/// * `easiness` - Current easiness factor
/// * `interval` - Current interval in days
/// * `quality` - Recall quality
/// * `today` - Day of the review
pub fn calculate_next_review(
    easiness: f64,
    interval: u32,
    quality: Quality,
    today: NaiveDate,
) -> ReviewResult {
    let (interval, easiness) = if quality.is_pass() {
        let next_interval = match interval {
            0 => 1,
            1 => 6,
            // Uses the easiness from before this update; exact halves round to even
            i => (f64::from(i) * easiness).round_ties_even() as u32,
        };

        // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
        let miss = f64::from(Quality::MAX - quality.value());
        (next_interval, easiness + (0.1 - miss * (0.08 + miss * 0.02)))
    } else {
        (1, MIN_EASINESS)
    };

    ReviewResult {
        interval,
        easiness: easiness.max(MIN_EASINESS),
        next_review: today + Duration::days(i64::from(interval)),
    }
}

/// Intervals each rating would give, for display: [Again (1), Hard (3), Good (4), Easy (5)]
pub fn preview_intervals(easiness: f64, interval: u32, today: NaiveDate) -> [u32; 4] {
    [1u8, 3, 4, 5].map(|q| calculate_next_review(easiness, interval, Quality(q), today).interval)
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u32) -> String {
    if days == 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
