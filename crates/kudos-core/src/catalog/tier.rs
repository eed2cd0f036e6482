//! Membership tier table.
//!
//! Multipliers and decay rates are stored as integer percent / basis points so
//! truncating arithmetic on point totals is exact.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Catalog row for a [`MembershipTier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSpec {
    pub id: u32,
    pub min_points: i64,
    /// Inclusive upper bound, `None` for the open-ended top tier.
    pub max_points: Option<i64>,
    /// Point multiplier in percent (150 = x1.5).
    pub multiplier_percent: i64,
    /// Fraction of points removed per decay cycle, in basis points (500 = 5%).
    pub decay_basis_points: i64,
    pub perks: &'static str,
}

impl TierSpec {
    pub fn contains(&self, points: i64) -> bool {
        points >= self.min_points && self.max_points.is_none_or(|max| points <= max)
    }
}

/// Loyalty bracket derived from total points. Ordered from lowest to highest.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    Display,
)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl MembershipTier {
    pub const fn spec(self) -> TierSpec {
        match self {
            MembershipTier::Bronze => TierSpec {
                id: 1,
                min_points: 0,
                max_points: Some(499),
                multiplier_percent: 100,
                decay_basis_points: 500,
                perks: "Basic badges, 1 free story highlight/month",
            },
            MembershipTier::Silver => TierSpec {
                id: 2,
                min_points: 500,
                max_points: Some(4999),
                multiplier_percent: 120,
                decay_basis_points: 500,
                perks: "Exclusive filters, 2x points on weekends",
            },
            MembershipTier::Gold => TierSpec {
                id: 3,
                min_points: 5000,
                max_points: Some(9999),
                multiplier_percent: 150,
                decay_basis_points: 400,
                perks: "Analytics dashboard, priority customer support",
            },
            MembershipTier::Platinum => TierSpec {
                id: 4,
                min_points: 10000,
                max_points: None,
                multiplier_percent: 200,
                decay_basis_points: 200,
                perks: "Monetization (ads revenue share), custom emojis, verified checkmark",
            },
        }
    }

    pub const fn id(self) -> u32 {
        self.spec().id
    }

    pub const fn multiplier_percent(self) -> i64 {
        self.spec().multiplier_percent
    }

    pub fn multiplier(self) -> f64 {
        self.multiplier_percent() as f64 / 100.0
    }

    pub fn weekly_decay_rate(self) -> f64 {
        self.spec().decay_basis_points as f64 / 10_000.0
    }

    /// Tier whose range contains `points`; Bronze when nothing matches.
    pub fn for_points(points: i64) -> Self {
        Self::iter()
            .find(|tier| tier.spec().contains(points))
            .unwrap_or_default()
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::iter().find(|tier| tier.id() == id)
    }

    /// The tier a promotion upgrades to, `None` at the top.
    pub fn next(self) -> Option<Self> {
        match self {
            MembershipTier::Bronze => Some(MembershipTier::Silver),
            MembershipTier::Silver => Some(MembershipTier::Gold),
            MembershipTier::Gold => Some(MembershipTier::Platinum),
            MembershipTier::Platinum => None,
        }
    }

    pub fn is_top(self) -> bool {
        self.next().is_none()
    }

    /// `floor(points * multiplier)` without going through floating point.
    pub fn apply_multiplier(self, points: i64) -> i64 {
        scale_ratio(points, self.multiplier_percent(), 100)
    }

    /// `floor(points * (1 - decay rate))`.
    pub fn decayed(self, points: i64) -> i64 {
        let bp = i128::from(self.spec().decay_basis_points);
        // ceil(points * bp / 10000) removed; points are never negative here
        let lost = (i128::from(points) * bp + 9_999) / 10_000;
        (points - i64::try_from(lost).unwrap_or(points)).max(0)
    }
}

/// `value * numerator / denominator` computed in 128 bits and saturated back
/// to `i64`.
pub(crate) fn scale_ratio(value: i64, numerator: i64, denominator: i64) -> i64 {
    let scaled = i128::from(value) * i128::from(numerator) / i128::from(denominator);
    i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_partition_non_negative_integers() {
        let tiers: Vec<_> = MembershipTier::iter().collect();
        assert_eq!(tiers[0].spec().min_points, 0);
        for pair in tiers.windows(2) {
            let upper = pair[0].spec().max_points.unwrap();
            assert_eq!(pair[1].spec().min_points, upper + 1);
        }
        assert!(tiers.last().unwrap().spec().max_points.is_none());
    }

    #[test]
    fn test_for_points_boundaries() {
        assert_eq!(MembershipTier::for_points(0), MembershipTier::Bronze);
        assert_eq!(MembershipTier::for_points(499), MembershipTier::Bronze);
        assert_eq!(MembershipTier::for_points(500), MembershipTier::Silver);
        assert_eq!(MembershipTier::for_points(5000), MembershipTier::Gold);
        assert_eq!(MembershipTier::for_points(10_000), MembershipTier::Platinum);
        assert_eq!(MembershipTier::for_points(-5), MembershipTier::Bronze);
    }

    #[test]
    fn test_decay_truncates() {
        assert_eq!(MembershipTier::Bronze.decayed(1000), 950);
        assert_eq!(MembershipTier::Bronze.decayed(999), 949);
        assert_eq!(MembershipTier::Platinum.decayed(20_000), 19_600);
        assert_eq!(MembershipTier::Gold.decayed(0), 0);
    }

    #[test]
    fn test_multiplier_truncates() {
        assert_eq!(MembershipTier::Silver.apply_multiplier(7), 8);
        assert_eq!(MembershipTier::Gold.apply_multiplier(1000), 1500);
        assert_eq!(MembershipTier::Gold.multiplier(), 1.5);
    }

    #[test]
    fn test_ordering_and_next() {
        assert!(MembershipTier::Bronze < MembershipTier::Platinum);
        assert_eq!(MembershipTier::Gold.next(), Some(MembershipTier::Platinum));
        assert!(MembershipTier::Platinum.is_top());
        assert_eq!(MembershipTier::from_id(3), Some(MembershipTier::Gold));
    }
}
