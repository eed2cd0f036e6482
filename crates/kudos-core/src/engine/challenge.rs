//! Collaborative challenges.
//!
//! Lifecycle: `Created` → `Active` → `Completed` | `Expired`. Both end states
//! are terminal. Expiry is applied lazily whenever a challenge is touched.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use super::PointEngine;
use crate::catalog::ActivityKind;
use crate::event::LedgerEvent;
use crate::ledger::RewardRecord;

const RANDOM_NAMES: [&str; 5] = ["Video Marathon", "Comment Spree", "Like Party", "Share Fest", "Tag Team"];
const RANDOM_REWARDS: [&str; 5] = [
    "Exclusive Badge",
    "Special Filter",
    "Profile Frame",
    "Custom Emoji",
    "Priority Support",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Created,
    Active,
    Completed,
    Expired,
}

impl ChallengeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ChallengeStatus::Completed | ChallengeStatus::Expired)
    }
}

/// Parameters for [`PointEngine::create_challenge`]. The challenge starts now.
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub name: String,
    pub description: String,
    pub target_points: i64,
    pub duration: Duration,
    pub reward: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborativeChallenge {
    id: String,
    name: String,
    description: String,
    target_points: i64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    reward: String,
    current_points: i64,
    participants: BTreeSet<String>,
    status: ChallengeStatus,
}

impl CollaborativeChallenge {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn target_points(&self) -> i64 {
        self.target_points
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn reward(&self) -> &str {
        &self.reward
    }

    pub fn current_points(&self) -> i64 {
        self.current_points
    }

    pub fn participants(&self) -> &BTreeSet<String> {
        &self.participants
    }

    pub fn status(&self) -> ChallengeStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ChallengeStatus::Active
    }

    /// Progress toward the target, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.target_points <= 0 {
            return 100.0;
        }
        (self.current_points as f64 / self.target_points as f64 * 100.0).min(100.0)
    }

    /// Moves a non-terminal challenge to the state `now` implies.
    ///
    /// Returns `Expired` only on the call that performed the transition.
    fn refresh(&mut self, now: DateTime<Utc>) -> Option<ChallengeStatus> {
        if self.status.is_terminal() {
            return None;
        }
        if now >= self.end_time {
            self.status = ChallengeStatus::Expired;
            return Some(ChallengeStatus::Expired);
        }
        if now >= self.start_time {
            self.status = ChallengeStatus::Active;
        }
        None
    }
}

impl PointEngine {
    /// Creates a challenge running from now for `new.duration`.
    pub fn create_challenge(&mut self, new: NewChallenge) -> &CollaborativeChallenge {
        let now = self.clock.now();
        let id = loop {
            let candidate = format!("challenge-{}", &Uuid::new_v4().simple().to_string()[..8]);
            if !self.challenges.contains_key(&candidate) {
                break candidate;
            }
        };
        tracing::info!(
            target: "challenge",
            "Created {} '{}' (target {}, reward {})",
            id,
            new.name,
            new.target_points,
            new.reward
        );
        let challenge = CollaborativeChallenge {
            id: id.clone(),
            name: new.name,
            description: new.description,
            target_points: new.target_points,
            start_time: now,
            end_time: now + new.duration,
            reward: new.reward,
            current_points: 0,
            participants: BTreeSet::new(),
            status: ChallengeStatus::Created,
        };
        self.challenges.entry(id).or_insert(challenge)
    }

    /// Creates a challenge with a random theme, target of 500-1499 points,
    /// duration of 24-47 hours and a random reward.
    pub fn create_random_challenge(&mut self) -> &CollaborativeChallenge {
        let name = RANDOM_NAMES[self.rng.gen_range(0..RANDOM_NAMES.len())];
        let target_points = self.rng.gen_range(500..1500);
        let hours = self.rng.gen_range(24..48);
        let reward = RANDOM_REWARDS[self.rng.gen_range(0..RANDOM_REWARDS.len())];
        self.create_challenge(NewChallenge {
            name: name.to_string(),
            description: format!("Complete this {} challenge to earn rewards!", name.to_lowercase()),
            target_points,
            duration: Duration::hours(hours),
            reward: reward.to_string(),
        })
    }

    pub fn challenge(&self, challenge_id: &str) -> Option<&CollaborativeChallenge> {
        self.challenges.get(challenge_id)
    }

    /// Challenges still accepting members and contributions.
    pub fn active_challenges(&mut self) -> Vec<&CollaborativeChallenge> {
        let ids: Vec<String> = self.challenges.keys().cloned().collect();
        for id in &ids {
            self.touch_challenge(id);
        }
        self.challenges.values().filter(|challenge| challenge.is_active()).collect()
    }

    /// Adds `user_id` to an active challenge. Joining twice is a no-op that
    /// still returns `true`.
    pub fn join_challenge(&mut self, user_id: &str, challenge_id: &str) -> bool {
        if !self.ledger.contains(user_id) {
            return false;
        }
        if self.touch_challenge(challenge_id) != Some(ChallengeStatus::Active) {
            tracing::warn!(target: "challenge", "{} cannot join inactive challenge {}", user_id, challenge_id);
            return false;
        }
        let Some(challenge) = self.challenges.get_mut(challenge_id) else {
            return false;
        };
        if !challenge.participants.insert(user_id.to_string()) {
            return true;
        }

        self.ledger.update(user_id, |profile| {
            profile.participating_challenges.insert(challenge_id.to_string());
        });
        self.events.push(LedgerEvent::ChallengeJoined {
            user_id: user_id.to_string(),
            challenge_id: challenge_id.to_string(),
        });
        tracing::debug!(target: "challenge", "{} joined {}", user_id, challenge_id);
        true
    }

    /// Adds `points` to a challenge the user has joined.
    ///
    /// Reaching the target completes the challenge and grants its reward to
    /// every participant. Returns `false` for unknown ids, non-members,
    /// non-positive points and inactive challenges.
    pub fn contribute(&mut self, user_id: &str, challenge_id: &str, points: i64) -> bool {
        if points <= 0 {
            return false;
        }
        let now = self.clock.now();
        if self.touch_challenge(challenge_id) != Some(ChallengeStatus::Active) {
            tracing::warn!(target: "challenge", "Contribution to inactive challenge {} rejected", challenge_id);
            return false;
        }
        let Some(challenge) = self.challenges.get_mut(challenge_id) else {
            return false;
        };
        if !challenge.participants.contains(user_id) {
            return false;
        }

        challenge.current_points = challenge.current_points.saturating_add(points);
        if challenge.current_points < challenge.target_points {
            return true;
        }

        challenge.status = ChallengeStatus::Completed;
        let participants: Vec<String> = challenge.participants.iter().cloned().collect();
        let reward = challenge.reward.clone();
        tracing::info!(
            target: "challenge",
            "Challenge {} completed with {} points, rewarding {} participants",
            challenge_id,
            challenge.current_points,
            participants.len()
        );

        for participant in &participants {
            let record = RewardRecord {
                description: reward.clone(),
                challenge_id: Some(challenge_id.to_string()),
                granted_at: now,
            };
            let granted = self
                .ledger
                .update(participant, |profile| {
                    profile.rewards.push(record.clone());
                    profile.log(
                        ActivityKind::RewardEarned,
                        now,
                        0,
                        format!("Challenge reward: {reward}"),
                    );
                })
                .is_some();
            if granted {
                self.events.push(LedgerEvent::RewardGranted {
                    user_id: participant.clone(),
                    reward: record,
                });
            }
        }
        self.events.push(LedgerEvent::ChallengeClosed {
            challenge_id: challenge_id.to_string(),
            status: ChallengeStatus::Completed,
        });
        true
    }

    /// Picks up to `count` distinct participants at random.
    pub fn select_random_winners(&mut self, challenge_id: &str, count: usize) -> Vec<String> {
        let Some(challenge) = self.challenges.get(challenge_id) else {
            return Vec::new();
        };
        let participants: Vec<&String> = challenge.participants.iter().collect();
        participants
            .choose_multiple(&mut self.rng, count)
            .map(|id| (*id).clone())
            .collect()
    }

    /// Applies lazy expiry and returns the current status.
    fn touch_challenge(&mut self, challenge_id: &str) -> Option<ChallengeStatus> {
        let now = self.clock.now();
        let challenge = self.challenges.get_mut(challenge_id)?;
        if let Some(closed) = challenge.refresh(now) {
            tracing::info!(target: "challenge", "Challenge {} expired at {}", challenge_id, challenge.end_time);
            self.events.push(LedgerEvent::ChallengeClosed {
                challenge_id: challenge_id.to_string(),
                status: closed,
            });
        }
        Some(challenge.status)
    }
}
