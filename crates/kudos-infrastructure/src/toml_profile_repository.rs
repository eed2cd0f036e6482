//! TOML file implementation of [`ProfileRepository`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use kudos_core::catalog::{AchievementBadge, MembershipTier};
use kudos_core::error::{KudosError, Result};
use kudos_core::ledger::RewardRecord;
use kudos_core::{ProfileRepository, UserRecord};

use crate::dto::ProfileStoreDocument;
use crate::paths::KudosPaths;
use crate::storage::{AtomicTomlError, AtomicTomlFile};

/// Stores every profile in a single `profiles.toml`.
///
/// Each write is a locked read-modify-write of the whole document, run on
/// the blocking pool.
///
/// # Example
///
/// ```ignore
/// use kudos_infrastructure::TomlProfileRepository;
///
/// let repository = TomlProfileRepository::default_location()?;
/// let users = repository.load_all().await?;
/// ```
#[derive(Debug, Clone)]
pub struct TomlProfileRepository {
    file: Arc<AtomicTomlFile<ProfileStoreDocument>>,
}

impl TomlProfileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path)),
        }
    }

    /// Repository at `~/.config/kudos/profiles.toml` (or under `KUDOS_HOME`).
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(KudosPaths::profiles_file()?))
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    async fn mutate<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut ProfileStoreDocument) -> Result<()> + Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || {
            let mut rejection = None;
            let written = file.update(ProfileStoreDocument::default(), |document| {
                change(document).map_err(|e| {
                    let message = e.to_string();
                    rejection = Some(e);
                    AtomicTomlError::Rejected(message)
                })
            });
            match rejection {
                Some(e) => Err(e),
                None => written.map_err(KudosError::from),
            }
        })
        .await
        .map_err(|e| KudosError::internal(format!("Failed to join storage task: {}", e)))?
    }
}

#[async_trait]
impl ProfileRepository for TomlProfileRepository {
    async fn load_all(&self) -> Result<Vec<UserRecord>> {
        let file = self.file.clone();
        let document = tokio::task::spawn_blocking(move || file.load())
            .await
            .map_err(|e| KudosError::internal(format!("Failed to join storage task: {}", e)))??
            .unwrap_or_default();
        tracing::debug!(
            target: "storage",
            "Loaded {} stored users from {}",
            document.users.len(),
            self.file.path().display()
        );
        Ok(document.users.into_values().collect())
    }

    async fn save_profile(&self, record: &UserRecord) -> Result<()> {
        let record = record.clone();
        self.mutate(move |document| {
            document.upsert(record);
            Ok(())
        })
        .await
    }

    async fn save_tier(&self, user_id: &str, tier: MembershipTier) -> Result<()> {
        let user_id = user_id.to_string();
        self.mutate(move |document| document.set_tier(&user_id, tier))
            .await
    }

    async fn append_reward(&self, user_id: &str, reward: &RewardRecord) -> Result<()> {
        let user_id = user_id.to_string();
        let reward = reward.clone();
        self.mutate(move |document| document.append_reward(&user_id, &reward))
            .await
    }

    async fn append_badge(&self, user_id: &str, badge: AchievementBadge) -> Result<()> {
        let user_id = user_id.to_string();
        self.mutate(move |document| document.append_badge(&user_id, badge))
            .await
    }

    async fn add_challenge_membership(&self, user_id: &str, challenge_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        let challenge_id = challenge_id.to_string();
        self.mutate(move |document| document.add_membership(&user_id, &challenge_id))
            .await
    }
}
