//! Score ledger: user profiles plus the views derived from them.
//!
//! [`Ledger`] is the only place profiles are mutated. Every mutation runs
//! through [`Ledger::update`] (or [`Ledger::sweep`] for whole-population
//! passes), which clamps points, re-derives the tier and refreshes the rank
//! index and both secondary indices before returning.

mod model;

use std::collections::{BTreeSet, HashMap};

use crate::catalog::MembershipTier;
use crate::index::{RankIndex, SecondaryIndex};

pub use model::{ActivityRecord, PointEntry, RewardRecord, UserProfile};

/// Outcome of one committed profile change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub user_id: String,
    pub points_before: i64,
    pub points_after: i64,
    pub tier_before: MembershipTier,
    pub tier_after: MembershipTier,
}

impl Commit {
    pub fn points_delta(&self) -> i64 {
        self.points_after - self.points_before
    }

    pub fn points_changed(&self) -> bool {
        self.points_before != self.points_after
    }

    pub fn tier_changed(&self) -> bool {
        self.tier_before != self.tier_after
    }

    pub fn promoted(&self) -> bool {
        self.tier_after > self.tier_before
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    profiles: HashMap<String, UserProfile>,
    rank: RankIndex,
    secondary: SecondaryIndex,
}

impl Ledger {
    pub fn new(bucket_size: i64) -> Self {
        Self {
            profiles: HashMap::new(),
            rank: RankIndex::new(),
            secondary: SecondaryIndex::new(bucket_size),
        }
    }

    /// Adds a profile and indexes it. Returns `false` if the id is taken.
    pub fn insert(&mut self, mut profile: UserProfile) -> bool {
        if self.profiles.contains_key(&profile.id) {
            return false;
        }
        normalize(&mut profile);
        self.index(&profile);
        self.profiles.insert(profile.id.clone(), profile);
        true
    }

    pub fn get(&self, user_id: &str) -> Option<&UserProfile> {
        self.profiles.get(user_id)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.profiles.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &UserProfile> {
        self.profiles.values()
    }

    /// User ids in ascending order.
    pub fn user_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.profiles.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Applies `change` to one profile and commits it to every index.
    ///
    /// Returns `None` for an unknown id.
    pub fn update<F>(&mut self, user_id: &str, change: F) -> Option<Commit>
    where
        F: FnOnce(&mut UserProfile),
    {
        let profile = self.profiles.get_mut(user_id)?;
        let points_before = profile.total_points;
        let tier_before = profile.tier;

        change(profile);
        normalize(profile);

        let commit = Commit {
            user_id: user_id.to_string(),
            points_before,
            points_after: profile.total_points,
            tier_before,
            tier_after: profile.tier,
        };
        self.rank.upsert(user_id, profile.total_points);
        self.secondary.place(user_id, profile.tier, profile.total_points);
        Some(commit)
    }

    /// Applies `change` to every profile in id order.
    ///
    /// Secondary indices are refreshed per profile; the rank index is rebuilt
    /// once at the end. Only commits that changed points or tier are returned.
    pub fn sweep<F>(&mut self, mut change: F) -> Vec<Commit>
    where
        F: FnMut(&mut UserProfile),
    {
        let mut commits = Vec::new();
        for user_id in self.user_ids() {
            let Some(profile) = self.profiles.get_mut(&user_id) else {
                continue;
            };
            let points_before = profile.total_points;
            let tier_before = profile.tier;

            change(profile);
            normalize(profile);

            self.secondary.place(&user_id, profile.tier, profile.total_points);
            if points_before != profile.total_points || tier_before != profile.tier {
                commits.push(Commit {
                    user_id: user_id.clone(),
                    points_before,
                    points_after: profile.total_points,
                    tier_before,
                    tier_after: profile.tier,
                });
            }
        }
        self.rebuild_rank();
        commits
    }

    pub fn rebuild_rank(&mut self) {
        self.rank.rebuild(
            self.profiles
                .values()
                .map(|profile| (profile.id.as_str(), profile.total_points)),
        );
    }

    /// Top `n` profiles by points, ties by id.
    pub fn top_n(&self, n: usize) -> Vec<&UserProfile> {
        self.rank
            .top_n(n)
            .into_iter()
            .filter_map(|user_id| self.profiles.get(user_id))
            .collect()
    }

    pub fn rank_of(&self, user_id: &str) -> Option<usize> {
        self.rank.rank_of(user_id)
    }

    pub fn users_by_tier(&self, tier: MembershipTier) -> Vec<&UserProfile> {
        self.secondary
            .users_in_tier(tier)
            .filter_map(|user_id| self.profiles.get(user_id))
            .collect()
    }

    /// Bucket-granular candidates for `[min_points, max_points]`.
    pub fn eligible_users(
        &self,
        min_points: i64,
        max_points: i64,
        tier: Option<MembershipTier>,
    ) -> BTreeSet<String> {
        self.secondary.eligible_users(min_points, max_points, tier)
    }

    /// Checks that the rank index and secondary indices agree with every
    /// profile. Returns a description of the first mismatch.
    pub fn verify_indices(&self) -> Result<(), String> {
        if self.rank.len() != self.profiles.len() {
            return Err(format!(
                "rank index holds {} users, ledger holds {}",
                self.rank.len(),
                self.profiles.len()
            ));
        }
        if self.secondary.len() != self.profiles.len() {
            return Err(format!(
                "secondary index holds {} users, ledger holds {}",
                self.secondary.len(),
                self.profiles.len()
            ));
        }
        for profile in self.profiles.values() {
            if profile.total_points < 0 {
                return Err(format!("{} has negative points", profile.id));
            }
            if self.rank.points_of(&profile.id) != Some(profile.total_points) {
                return Err(format!("{} is ranked with stale points", profile.id));
            }
            let Some(placement) = self.secondary.placement(&profile.id) else {
                return Err(format!("{} is missing from the secondary index", profile.id));
            };
            if placement.tier != profile.tier {
                return Err(format!("{} is indexed under the wrong tier", profile.id));
            }
            if placement.bucket != self.secondary.bucket_of(profile.total_points) {
                return Err(format!("{} is indexed under the wrong bucket", profile.id));
            }
        }
        Ok(())
    }

    fn index(&mut self, profile: &UserProfile) {
        self.rank.upsert(&profile.id, profile.total_points);
        self.secondary
            .place(&profile.id, profile.tier, profile.total_points);
    }
}

fn normalize(profile: &mut UserProfile) {
    profile.total_points = profile.total_points.max(0);
    profile.tier = profile.derived_tier();
}
