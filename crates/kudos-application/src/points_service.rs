//! Points use case.
//!
//! `PointsService` shares one [`PointEngine`] between tasks and keeps the
//! profile store in step with it. Every mutating call runs under the engine's
//! write lock and queues the resulting writes before releasing it. The queue
//! is flushed afterwards, so readers never wait on storage and batches reach
//! the store in commit order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use kudos_core::catalog::{ActivityKind, MembershipTier};
use kudos_core::{CollaborativeChallenge, NewChallenge, PointEngine, ProfileRepository, UserRecord};
use tokio::sync::RwLock;

use crate::persistence::{PendingWrites, PersistReport};

/// Application entry point for every engine operation.
///
/// Cloning is cheap; clones share the engine, repository and persistence
/// counters.
#[derive(Clone)]
pub struct PointsService {
    /// The in-memory engine; the single source of truth while running
    engine: Arc<RwLock<PointEngine>>,
    /// Durable store receiving write-behind updates
    repository: Arc<dyn ProfileRepository>,
    /// Totals over every flush since construction
    persisted: Arc<Mutex<PersistReport>>,
    /// Write batches in commit order, filled under the engine write lock
    queued: Arc<Mutex<VecDeque<PendingWrites>>>,
    /// Held by the one task draining `queued`
    flush_gate: Arc<tokio::sync::Mutex<()>>,
}

impl PointsService {
    pub fn new(engine: PointEngine, repository: Arc<dyn ProfileRepository>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            repository,
            persisted: Arc::new(Mutex::new(PersistReport::default())),
            queued: Arc::new(Mutex::new(VecDeque::new())),
            flush_gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Loads every stored profile into the engine.
    ///
    /// Returns how many were added; records whose id is already registered
    /// are skipped.
    pub async fn bootstrap(&self) -> Result<usize> {
        let records = self
            .repository
            .load_all()
            .await
            .context("Failed to load stored profiles")?;
        let total = records.len();

        let mut engine = self.engine.write().await;
        let loaded = records
            .into_iter()
            .map(|record| engine.load_user(record))
            .filter(|added| *added)
            .count();
        // loading restores state, it is not a change to persist
        engine.drain_events();

        tracing::info!(target: "points", "Bootstrapped {} of {} stored profiles", loaded, total);
        Ok(loaded)
    }

    /// Shared handle to the engine, for read-heavy callers.
    pub fn engine(&self) -> Arc<RwLock<PointEngine>> {
        self.engine.clone()
    }

    /// Persistence totals so far.
    pub fn persist_report(&self) -> PersistReport {
        *self.persisted.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn mutate<R, F>(&self, operation: F) -> R
    where
        F: FnOnce(&mut PointEngine) -> R,
    {
        let value = {
            let mut engine = self.engine.write().await;
            let value = operation(&mut engine);
            let pending = PendingWrites::collect(&mut engine);
            if !pending.is_empty() {
                self.queued
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push_back(pending);
            }
            value
        };

        self.flush_queued().await;
        value
    }

    /// Writes every queued batch, oldest first.
    ///
    /// A batch queued by this call is either flushed here or by the task
    /// holding the gate before it lets go, so it is stored on return.
    async fn flush_queued(&self) {
        let _gate = self.flush_gate.lock().await;
        while let Some(pending) = self.next_queued() {
            let report = pending.flush(self.repository.as_ref()).await;
            self.persisted
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .merge(report);
        }
    }

    fn next_queued(&self) -> Option<PendingWrites> {
        self.queued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    // ---- users ----

    pub async fn register_user(&self, user_id: &str, display_name: &str) -> Option<UserRecord> {
        self.mutate(|engine| engine.register_user(user_id, display_name).map(UserRecord::from))
            .await
    }

    pub async fn user(&self, user_id: &str) -> Option<UserRecord> {
        self.engine.read().await.user_record(user_id)
    }

    pub async fn record_activity(&self, user_id: &str, item_id: &str, kind: ActivityKind, amount: f64) -> i64 {
        self.mutate(|engine| engine.record_activity(user_id, item_id, kind, amount))
            .await
    }

    pub async fn record_login(&self, user_id: &str) -> bool {
        self.mutate(|engine| engine.record_login(user_id)).await
    }

    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> bool {
        self.mutate(|engine| engine.follow(follower_id, followee_id)).await
    }

    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> bool {
        self.mutate(|engine| engine.unfollow(follower_id, followee_id)).await
    }

    // ---- leaderboard ----

    pub async fn top_users(&self, n: usize) -> Vec<UserRecord> {
        let engine = self.engine.read().await;
        engine.top_users(n).into_iter().map(UserRecord::from).collect()
    }

    pub async fn rank_of(&self, user_id: &str) -> Option<usize> {
        self.engine.read().await.rank_of(user_id)
    }

    pub async fn users_by_tier(&self, tier: MembershipTier) -> Vec<UserRecord> {
        let engine = self.engine.read().await;
        engine.users_by_tier(tier).into_iter().map(UserRecord::from).collect()
    }

    /// Users with points in `[min_points, max_points]`, optionally in one tier.
    pub async fn eligible_users(&self, min_points: i64, max_points: i64, tier: Option<MembershipTier>) -> Vec<String> {
        let engine = self.engine.read().await;
        engine
            .eligible_users(min_points, max_points, tier)
            .into_iter()
            .filter(|user_id| {
                engine
                    .user(user_id)
                    .is_some_and(|profile| (min_points..=max_points).contains(&profile.total_points()))
            })
            .collect()
    }

    // ---- trending ----

    pub async fn mark_trending(&self, item_id: &str) {
        self.mutate(|engine| engine.mark_trending(item_id)).await
    }

    pub async fn mark_post_trending(&self, author_id: &str, item_id: &str) -> bool {
        self.mutate(|engine| engine.mark_post_trending(author_id, item_id))
            .await
    }

    pub async fn is_trending(&self, item_id: &str) -> bool {
        self.mutate(|engine| engine.is_trending(item_id)).await
    }

    pub async fn calculate_post_interaction_points(&self, item_id: &str, kind: ActivityKind, tier: MembershipTier) -> i64 {
        self.mutate(|engine| engine.calculate_post_interaction_points(item_id, kind, tier))
            .await
    }

    pub async fn reset_daily_counters(&self) {
        self.mutate(|engine| engine.reset_daily_counters()).await
    }

    // ---- maintenance ----

    pub async fn apply_weekly_decay(&self) -> usize {
        self.mutate(|engine| engine.apply_weekly_decay()).await
    }

    pub async fn expire_points(&self) -> usize {
        self.mutate(|engine| engine.expire_points()).await
    }

    // ---- challenges ----

    pub async fn create_challenge(&self, new: NewChallenge) -> CollaborativeChallenge {
        self.mutate(|engine| engine.create_challenge(new).clone()).await
    }

    pub async fn create_random_challenge(&self) -> CollaborativeChallenge {
        self.mutate(|engine| engine.create_random_challenge().clone())
            .await
    }

    /// Creates a challenge and enrolls `user_id` in it.
    ///
    /// Returns `None` without creating anything when the user is unknown.
    pub async fn create_and_join_challenge(&self, user_id: &str, new: NewChallenge) -> Option<CollaborativeChallenge> {
        self.mutate(|engine| {
            engine.user(user_id)?;
            let challenge_id = engine.create_challenge(new).id().to_string();
            engine.join_challenge(user_id, &challenge_id);
            engine.challenge(&challenge_id).cloned()
        })
        .await
    }

    pub async fn challenge(&self, challenge_id: &str) -> Option<CollaborativeChallenge> {
        self.engine.read().await.challenge(challenge_id).cloned()
    }

    /// Active challenges; expired ones are closed on the way.
    pub async fn active_challenges(&self) -> Vec<CollaborativeChallenge> {
        self.mutate(|engine| engine.active_challenges().into_iter().cloned().collect())
            .await
    }

    pub async fn join_challenge(&self, user_id: &str, challenge_id: &str) -> bool {
        self.mutate(|engine| engine.join_challenge(user_id, challenge_id))
            .await
    }

    pub async fn contribute(&self, user_id: &str, challenge_id: &str, points: i64) -> bool {
        self.mutate(|engine| engine.contribute(user_id, challenge_id, points))
            .await
    }

    pub async fn select_random_winners(&self, challenge_id: &str, count: usize) -> Vec<String> {
        self.mutate(|engine| engine.select_random_winners(challenge_id, count))
            .await
    }

    // ---- draws and bonuses ----

    pub async fn conduct_lucky_draw(&self, min_points: i64, max_points: i64, tier: Option<MembershipTier>) -> usize {
        self.mutate(|engine| engine.conduct_lucky_draw(min_points, max_points, tier))
            .await
    }

    pub async fn conduct_random_lucky_draw(&self) -> usize {
        self.mutate(|engine| engine.conduct_random_lucky_draw()).await
    }

    pub async fn conduct_product_promotion(&self, product_id: &str) -> Option<String> {
        self.mutate(|engine| engine.conduct_product_promotion(product_id))
            .await
    }

    pub async fn generate_surprise_rewards(&self) -> usize {
        self.mutate(|engine| engine.generate_surprise_rewards()).await
    }

    pub async fn generate_random_bonus_points(&self) -> usize {
        self.mutate(|engine| engine.generate_random_bonus_points())
            .await
    }
}
