//! Engagement scoring and ranking engine.
//!
//! `kudos-core` turns social engagement events into tiered loyalty points and
//! keeps a leaderboard plus tier and point-range indices consistent with every
//! change. It is synchronous and storage-agnostic: durable changes are
//! reported as [`LedgerEvent`]s and stored through a [`ProfileRepository`]
//! implemented elsewhere.
//!
//! # Examples
//!
//! ```
//! use kudos_core::{ActivityKind, EngineConfig, PointEngine};
//!
//! let mut engine = PointEngine::new(EngineConfig::default()).unwrap();
//! engine.register_user("alice", "Alice");
//! let earned = engine.record_activity("alice", "post-1", ActivityKind::Comment, 0.0);
//! assert!(earned >= 10);
//! assert_eq!(engine.top_users(1)[0].id(), "alice");
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod index;
pub mod ledger;
pub mod repository;
pub mod scoring;

pub use catalog::{AchievementBadge, ActivityKind, MembershipTier, PointType};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{ChallengeStatus, CollaborativeChallenge, NewChallenge, PointEngine};
pub use error::{KudosError, Result};
pub use event::LedgerEvent;
pub use ledger::UserProfile;
pub use repository::{ProfileRepository, UserRecord};
