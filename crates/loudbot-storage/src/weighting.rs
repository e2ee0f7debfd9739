// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighted random thinning of retrieval candidates.
//!
//! Candidates are shuffled, then repeatedly taken from the front. Each one is
//! either dropped or pushed to the back with a probability derived from its
//! score and views, until only `min` remain. Well-scored and little-seen
//! messages are more likely to survive.

use std::collections::VecDeque;

use loudbot_core::MessageRecord;
use rand::Rng;
use rand::seq::SliceRandom;

/// Upper bound on the chance of keeping a candidate.
///
/// The scaled weight of an unseen message exceeds 1 once fewer than twice
/// `min` candidates remain; capping it guarantees the loop shrinks.
pub const MAX_KEEP_PROBABILITY: f64 = 0.95;

/// Unscaled keep weight of a message.
///
/// Starts at 1.0, adjusted by score (roughly -0.43 at score 0 up to +0.5 for
/// large scores) and views (a bonus for few views, -0.75 asymptotically).
/// A never-viewed message is pinned at 2.0. Negative scores count as 0.
pub fn base_weight(score: i64, views: u64) -> f64 {
    if views == 0 {
        return 2.0;
    }

    let score = score.max(0) as f64;
    let views = views as f64;

    let mut weight = 1.0;
    weight += 0.5 - 2.0 / (score + 2.0).powf(1.1);
    weight += 100.0 / (9.0 + views).powi(2) - 0.75;
    weight
}

/// Keep probability for a candidate when `remaining` others are still queued.
pub fn keep_probability(score: i64, views: u64, min: usize, remaining: usize) -> f64 {
    let ratio = if remaining == 0 {
        1.0
    } else {
        min as f64 / remaining as f64
    };
    let p = base_weight(score, views) * ratio;
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, MAX_KEEP_PROBABILITY)
    }
}

/// Thins `candidates` down to `min` records.
///
/// Returns everything (shuffled) when there are `min` or fewer candidates.
pub fn weighted_selection<R>(
    mut candidates: Vec<MessageRecord>,
    min: usize,
    rng: &mut R,
) -> Vec<MessageRecord>
where
    R: Rng + ?Sized,
{
    candidates.shuffle(rng);
    let mut queue = VecDeque::from(candidates);

    while queue.len() > min {
        let Some(candidate) = queue.pop_front() else {
            break;
        };
        let p = keep_probability(candidate.score, candidate.views, min, queue.len());
        if rng.gen_bool(p) {
            queue.push_back(candidate);
        }
    }

    queue.into()
}
