//! Data models for the flashcard system

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::algorithm::ReviewResult;

/// Ease factor every new card starts with
pub const INITIAL_EASINESS: f64 = 2.5;

/// XP needed to gain one level
pub const XP_PER_LEVEL: u32 = 100;

/// A flashcard persisted for spaced review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryNode {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    /// SM-2 easiness factor (default 2.5, never below 1.3)
    #[serde(default = "default_easiness")]
    pub easiness: f64,
    /// Current interval in days
    #[serde(default)]
    pub interval: u32,
    /// First day the card is due again
    pub next_review: NaiveDate,
    pub created_at: DateTime<Utc>,
}

fn default_easiness() -> f64 {
    INITIAL_EASINESS
}

impl MemoryNode {
    /// New card, due on `today`
    pub fn new(question: String, answer: String, today: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            question,
            answer,
            easiness: INITIAL_EASINESS,
            interval: 0,
            next_review: today,
            created_at: Utc::now(),
        }
    }

    /// Check if the card is due for review on `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review <= today
    }

    pub fn apply(&mut self, result: &ReviewResult) {
        self.easiness = result.easiness;
        self.interval = result.interval;
        self.next_review = result.next_review;
    }
}

/// Experience and level of the single local user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub xp: u32,
    pub level: u32,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self { xp: 0, level: 1 }
    }
}

impl UserProfile {
    /// Add XP, rolling every full 100 over into a level.
    /// Returns the number of levels gained.
    pub fn award(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= XP_PER_LEVEL {
            self.xp -= XP_PER_LEVEL;
            self.level += 1;
            gained += 1;
        }
        gained
    }

    /// Fraction of the way to the next level (0.0 - 1.0)
    pub fn progress(&self) -> f64 {
        f64::from(self.xp.min(XP_PER_LEVEL)) / f64::from(XP_PER_LEVEL)
    }
}

/// Snapshot shown on the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub due_cards: usize,
    pub profile: UserProfile,
}
