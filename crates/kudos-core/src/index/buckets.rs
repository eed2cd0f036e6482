use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::catalog::MembershipTier;

/// Where a user currently sits in the secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub tier: MembershipTier,
    pub bucket: i64,
}

/// Tier → users and point bucket → users.
///
/// Every user appears in exactly one tier set and one bucket set; `place`
/// removes the previous placement before inserting the new one.
#[derive(Debug, Clone)]
pub struct SecondaryIndex {
    bucket_size: i64,
    by_tier: HashMap<MembershipTier, BTreeSet<String>>,
    by_bucket: BTreeMap<i64, BTreeSet<String>>,
    placements: HashMap<String, Placement>,
}

impl SecondaryIndex {
    pub fn new(bucket_size: i64) -> Self {
        Self {
            bucket_size: bucket_size.max(1),
            by_tier: HashMap::new(),
            by_bucket: BTreeMap::new(),
            placements: HashMap::new(),
        }
    }

    pub fn bucket_size(&self) -> i64 {
        self.bucket_size
    }

    /// Start of the bucket containing `points`.
    pub fn bucket_of(&self, points: i64) -> i64 {
        points.div_euclid(self.bucket_size) * self.bucket_size
    }

    pub fn place(&mut self, user_id: &str, tier: MembershipTier, points: i64) {
        let placement = Placement {
            tier,
            bucket: self.bucket_of(points),
        };
        if self.placements.get(user_id) == Some(&placement) {
            return;
        }
        self.unplace(user_id);
        self.by_tier
            .entry(placement.tier)
            .or_default()
            .insert(user_id.to_string());
        self.by_bucket
            .entry(placement.bucket)
            .or_default()
            .insert(user_id.to_string());
        self.placements.insert(user_id.to_string(), placement);
    }

    fn unplace(&mut self, user_id: &str) {
        let Some(previous) = self.placements.remove(user_id) else {
            return;
        };
        if let Some(users) = self.by_tier.get_mut(&previous.tier) {
            users.remove(user_id);
        }
        if let Some(users) = self.by_bucket.get_mut(&previous.bucket) {
            users.remove(user_id);
            if users.is_empty() {
                self.by_bucket.remove(&previous.bucket);
            }
        }
    }

    pub fn placement(&self, user_id: &str) -> Option<Placement> {
        self.placements.get(user_id).copied()
    }

    pub fn users_in_tier(&self, tier: MembershipTier) -> impl Iterator<Item = &str> {
        self.by_tier
            .get(&tier)
            .into_iter()
            .flat_map(|users| users.iter().map(String::as_str))
    }

    /// Users in every bucket from the one holding `min_points` through the one
    /// holding `max_points`, optionally intersected with a tier.
    ///
    /// Precision is bucket-wide: users just outside `[min, max]` but inside an
    /// edge bucket are included.
    pub fn eligible_users(
        &self,
        min_points: i64,
        max_points: i64,
        tier: Option<MembershipTier>,
    ) -> BTreeSet<String> {
        // totals are never negative
        let min_points = min_points.max(0);
        if min_points > max_points {
            return BTreeSet::new();
        }
        let first = self.bucket_of(min_points);
        let last = self.bucket_of(max_points);
        let tier_users = tier.map(|tier| self.by_tier.get(&tier));
        self.by_bucket
            .range(first..=last)
            .flat_map(|(_, users)| users.iter())
            .filter(|user_id| match tier_users {
                None => true,
                Some(Some(members)) => members.contains(*user_id),
                Some(None) => false,
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}
