use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

/// Leaderboard order: points descending, ties by user id ascending.
///
/// Maintained incrementally in O(log n) per point change.
#[derive(Debug, Clone, Default)]
pub struct RankIndex {
    order: BTreeSet<(Reverse<i64>, String)>,
    points: HashMap<String, i64>,
}

impl RankIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `user_id` or moves it to its new position.
    pub fn upsert(&mut self, user_id: &str, points: i64) {
        if let Some(previous) = self.points.insert(user_id.to_string(), points) {
            if previous == points {
                return;
            }
            self.order.remove(&(Reverse(previous), user_id.to_string()));
        }
        self.order.insert((Reverse(points), user_id.to_string()));
    }

    /// Replaces the whole order with `entries`.
    pub fn rebuild<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        self.order.clear();
        self.points.clear();
        for (user_id, points) in entries {
            self.points.insert(user_id.to_string(), points);
            self.order.insert((Reverse(points), user_id.to_string()));
        }
    }

    /// The first `min(n, len)` user ids.
    pub fn top_n(&self, n: usize) -> Vec<&str> {
        self.order.iter().take(n).map(|(_, id)| id.as_str()).collect()
    }

    /// 1-based leaderboard position.
    pub fn rank_of(&self, user_id: &str) -> Option<usize> {
        let points = *self.points.get(user_id)?;
        let key = (Reverse(points), user_id.to_string());
        Some(self.order.range(..&key).count() + 1)
    }

    pub fn points_of(&self, user_id: &str) -> Option<i64> {
        self.points.get(user_id).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
