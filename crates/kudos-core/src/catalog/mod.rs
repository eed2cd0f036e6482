//! Static rule tables consumed by the engine.
//!
//! # Module Structure
//!
//! - `activity`: activity kinds, base awards, point types and per-item caps
//! - `tier`: membership tiers with thresholds, multipliers and decay rates
//! - `badge`: achievement badges and their milestones

mod activity;
mod badge;
mod tier;

pub use activity::{ActivityKind, ActivitySpec, AwardPolicy, PointType};
pub use badge::{AchievementBadge, BadgeSpec, Milestone};
pub use tier::{MembershipTier, TierSpec};
pub(crate) use tier::scale_ratio;
