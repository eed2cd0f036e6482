//! Base point calculation with per-item abuse caps.
//!
//! Each [`AwardPolicy`] is a pure function `(prior counter, amount) -> (points,
//! next counter)`. [`PointCalculator`] only looks the counter up in
//! [`ItemCounters`] and writes the next value back.

use std::collections::HashMap;

use crate::catalog::{ActivityKind, AwardPolicy};

type CounterKey = (String, String);

fn key(item_id: &str, user_id: &str) -> CounterKey {
    (item_id.to_string(), user_id.to_string())
}

/// Per (item, user) counters backing the capped policies.
#[derive(Debug, Clone, Default)]
pub struct ItemCounters {
    comments: HashMap<CounterKey, i64>,
    tags: HashMap<CounterKey, i64>,
    watch_points: HashMap<CounterKey, i64>,
}

impl ItemCounters {
    pub fn comment_count(&self, item_id: &str, user_id: &str) -> i64 {
        self.comments.get(&key(item_id, user_id)).copied().unwrap_or(0)
    }

    pub fn tag_count(&self, item_id: &str, user_id: &str) -> i64 {
        self.tags.get(&key(item_id, user_id)).copied().unwrap_or(0)
    }

    /// Points already credited for watching `item_id`.
    pub fn credited_watch_points(&self, item_id: &str, user_id: &str) -> i64 {
        self.watch_points
            .get(&key(item_id, user_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty() && self.tags.is_empty() && self.watch_points.is_empty()
    }

    pub fn clear(&mut self) {
        self.comments.clear();
        self.tags.clear();
        self.watch_points.clear();
    }

    fn slot(&mut self, kind: ActivityKind) -> Option<&mut HashMap<CounterKey, i64>> {
        match kind {
            ActivityKind::Comment => Some(&mut self.comments),
            ActivityKind::TagUser => Some(&mut self.tags),
            ActivityKind::VideoWatch => Some(&mut self.watch_points),
            _ => None,
        }
    }
}

/// One rewarded instance per call until `cap` rewarded instances exist.
pub fn capped_award(prior_count: i64, cap: i64, base_points: i64) -> (i64, i64) {
    if prior_count < cap {
        (base_points, prior_count + 1)
    } else {
        (0, prior_count)
    }
}

/// Marginal watch points for `minutes` of cumulative viewing.
///
/// The credited total only ever grows, so a shorter report after a longer one
/// pays nothing and does not reopen the cap.
pub fn watch_award(credited: i64, minutes: f64, rate_per_minute: i64, cap: i64) -> (i64, i64) {
    let earned = ((minutes.max(0.0) * rate_per_minute as f64) as i64).min(cap);
    if earned > credited {
        (earned - credited, earned)
    } else {
        (0, credited)
    }
}

/// `amount` currency units at `rate` points each, truncated toward zero.
pub fn monetary_award(amount: f64, rate: i64) -> i64 {
    ((amount * rate as f64) as i64).max(0)
}

/// Converts one engagement event into capped base points.
#[derive(Debug, Default)]
pub struct PointCalculator {
    counters: ItemCounters,
}

impl PointCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> &ItemCounters {
        &self.counters
    }

    /// Base points for `user_id` performing `kind` on `item_id`.
    ///
    /// `amount` is minutes for video watching, currency units for monetary
    /// kinds, and ignored otherwise.
    pub fn award(&mut self, user_id: &str, item_id: &str, kind: ActivityKind, amount: f64) -> i64 {
        let spec = kind.spec();
        match kind.policy() {
            AwardPolicy::Fixed => spec.base_points,
            AwardPolicy::Zero => 0,
            AwardPolicy::Monetary => monetary_award(amount, spec.base_points),
            AwardPolicy::CappedPerItem => self.step(kind, item_id, user_id, |prior| {
                capped_award(prior, spec.per_item_cap, spec.base_points)
            }),
            AwardPolicy::WatchTime => self.step(kind, item_id, user_id, |prior| {
                watch_award(prior, amount, spec.base_points, spec.per_item_cap)
            }),
        }
    }

    /// Clears every counter. Runs once a day, not per entry.
    pub fn reset_daily(&mut self) {
        self.counters.clear();
    }

    fn step<F>(&mut self, kind: ActivityKind, item_id: &str, user_id: &str, policy: F) -> i64
    where
        F: FnOnce(i64) -> (i64, i64),
    {
        let Some(slot) = self.counters.slot(kind) else {
            return 0;
        };
        let entry = slot.entry(key(item_id, user_id)).or_insert(0);
        let (points, next) = policy(*entry);
        *entry = next;
        points
    }
}
