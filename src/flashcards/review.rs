//! Review operations: picking a due card and applying a rating

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;

use super::algorithm::{calculate_next_review, Quality, ReviewResult};
use super::models::MemoryNode;

/// Pick one due card uniformly at random.
///
/// No weighting by how overdue a card is; every due card is equally likely.
pub fn pick_due<'a, R>(due: &'a [MemoryNode], rng: &mut R) -> Option<&'a MemoryNode>
where
    R: Rng + ?Sized,
{
    due.choose(rng)
}

/// Apply a review to a node in place and return the schedule change
pub fn review_node(node: &mut MemoryNode, quality: Quality, today: NaiveDate) -> ReviewResult {
    let result = calculate_next_review(node.easiness, node.interval, quality, today);
    node.apply(&result);
    result
}
