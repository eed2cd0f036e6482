//! Process-local [`ProfileRepository`] for tests and ephemeral runs.

use std::sync::Arc;

use async_trait::async_trait;
use kudos_core::catalog::{AchievementBadge, MembershipTier};
use kudos_core::error::Result;
use kudos_core::ledger::RewardRecord;
use kudos_core::{ProfileRepository, UserRecord};
use tokio::sync::Mutex;

use crate::dto::ProfileStoreDocument;

#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileRepository {
    document: Arc<Mutex<ProfileStoreDocument>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with `records`.
    pub fn with_records(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let mut document = ProfileStoreDocument::default();
        for record in records {
            document.upsert(record);
        }
        Self {
            document: Arc::new(Mutex::new(document)),
        }
    }

    /// Copy of the current document.
    pub async fn snapshot(&self) -> ProfileStoreDocument {
        self.document.lock().await.clone()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn load_all(&self) -> Result<Vec<UserRecord>> {
        Ok(self.document.lock().await.users.values().cloned().collect())
    }

    async fn save_profile(&self, record: &UserRecord) -> Result<()> {
        self.document.lock().await.upsert(record.clone());
        Ok(())
    }

    async fn save_tier(&self, user_id: &str, tier: MembershipTier) -> Result<()> {
        self.document.lock().await.set_tier(user_id, tier)
    }

    async fn append_reward(&self, user_id: &str, reward: &RewardRecord) -> Result<()> {
        self.document.lock().await.append_reward(user_id, reward)
    }

    async fn append_badge(&self, user_id: &str, badge: AchievementBadge) -> Result<()> {
        self.document.lock().await.append_badge(user_id, badge)
    }

    async fn add_challenge_membership(&self, user_id: &str, challenge_id: &str) -> Result<()> {
        self.document.lock().await.add_membership(user_id, challenge_id)
    }
}
