//! Lucky draws, product promotions and random bonuses.

use rand::Rng;
use rand::seq::SliceRandom;
use strum::IntoEnumIterator;

use super::PointEngine;
use crate::catalog::{ActivityKind, MembershipTier, PointType};
use crate::event::LedgerEvent;
use crate::ledger::RewardRecord;

impl PointEngine {
    /// Multiplies the points of every user in `[min_points, max_points]`
    /// (optionally only `tier`) by their tier multiplier, crediting the
    /// difference as expiring points.
    ///
    /// Returns how many users took part.
    pub fn conduct_lucky_draw(&mut self, min_points: i64, max_points: i64, tier: Option<MembershipTier>) -> usize {
        let now = self.clock.now();
        let candidates = self.ledger.eligible_users(min_points, max_points, tier);
        let mut affected = 0;

        for user_id in candidates {
            let Some(profile) = self.ledger.get(&user_id) else {
                continue;
            };
            // bucket lookup is a superset near the edges
            let points = profile.total_points();
            if points < min_points || points > max_points {
                continue;
            }
            let user_tier = profile.tier();
            let bonus = user_tier.apply_multiplier(points) - points;
            let details = format!(
                "Lucky Draw: points multiplied by {:.2}x (+{} points)",
                user_tier.multiplier(),
                bonus
            );
            if self
                .credit(&user_id, bonus, PointType::Expiring, ActivityKind::SurpriseDrop, details, now)
                .is_some()
            {
                affected += 1;
            }
        }

        tracing::info!(
            target: "draw",
            "Lucky draw [{}, {}] tier {:?}: {} users affected",
            min_points,
            max_points,
            tier,
            affected
        );
        affected
    }

    /// Lucky draw over a random range: minimum 500-1499, width 500-1499, and
    /// a 30% chance of restricting it to one random tier.
    pub fn conduct_random_lucky_draw(&mut self) -> usize {
        let min_points = self.rng.gen_range(500..1500);
        let max_points = min_points + self.rng.gen_range(500..1500);
        let tier = if self.rng.gen_bool(0.3) {
            let tiers: Vec<MembershipTier> = MembershipTier::iter().collect();
            tiers.choose(&mut self.rng).copied()
        } else {
            None
        };
        self.conduct_lucky_draw(min_points, max_points, tier)
    }

    /// Raises one random buyer of `product_id` by one tier.
    ///
    /// Buyers already at the top tier are not eligible. The new tier is pinned
    /// as the user's floor. Returns the winner.
    pub fn conduct_product_promotion(&mut self, product_id: &str) -> Option<String> {
        let now = self.clock.now();
        let eligible: Vec<String> = self
            .product_buyers
            .get(product_id)?
            .iter()
            .filter(|user_id| {
                self.ledger
                    .get(user_id)
                    .is_some_and(|profile| !profile.tier().is_top())
            })
            .cloned()
            .collect();
        let Some(winner) = eligible.choose(&mut self.rng).cloned() else {
            tracing::debug!(target: "draw", "No eligible buyers for promotion of {}", product_id);
            return None;
        };

        let commit = self.ledger.update(&winner, |profile| {
            let Some(next) = profile.tier.next() else {
                return;
            };
            profile.tier_floor = Some(next);
            profile.log(
                ActivityKind::RewardEarned,
                now,
                0,
                format!("Product promotion for {product_id}: upgraded to {next}"),
            );
        })?;

        // indices are already updated; the tier event is what gets persisted
        if commit.tier_changed() {
            self.events.push(LedgerEvent::TierChanged {
                user_id: winner.clone(),
                from: commit.tier_before,
                to: commit.tier_after,
                promoted: true,
            });
        }
        tracing::info!(
            target: "draw",
            "Promotion for {}: {} upgraded from {} to {}",
            product_id,
            winner,
            commit.tier_before,
            commit.tier_after
        );
        Some(winner)
    }

    /// Gives each user a small chance of 50-99 expiring points plus a reward
    /// entry. Returns how many users were rewarded.
    pub fn generate_surprise_rewards(&mut self) -> usize {
        let now = self.clock.now();
        let chance = self.config.surprise_reward_chance;
        let mut rewarded = 0;

        for user_id in self.ledger.user_ids() {
            if !self.rng.gen_bool(chance) {
                continue;
            }
            let points = self.rng.gen_range(50..100);
            let description = format!("Surprise Reward: {points} points!");
            let record = RewardRecord {
                description: description.clone(),
                challenge_id: None,
                granted_at: now,
            };
            let Some(commit) = self.ledger.update(&user_id, |profile| {
                profile.rewards.push(record.clone());
                profile.add_points(points, PointType::Expiring, now);
                profile.log(ActivityKind::SurpriseDrop, now, points, description.clone());
            }) else {
                continue;
            };
            self.emit_commit(&commit, ActivityKind::SurpriseDrop);
            self.events.push(LedgerEvent::RewardGranted {
                user_id,
                reward: record,
            });
            rewarded += 1;
        }

        tracing::info!(target: "draw", "Surprise rewards: {} users rewarded", rewarded);
        rewarded
    }

    /// Gives each user a chance of 10-29 expiring points; the chance is higher
    /// during the off-peak window. Returns how many users received a bonus.
    pub fn generate_random_bonus_points(&mut self) -> usize {
        let now = self.clock.now();
        let hour = self.multipliers.local_hour(now);
        let off_peak = hour >= self.config.off_peak_start || hour < self.config.off_peak_end;
        let chance = if off_peak {
            self.config.bonus_chance_off_peak
        } else {
            self.config.bonus_chance_peak
        };
        let mut granted = 0;

        for user_id in self.ledger.user_ids() {
            if !self.rng.gen_bool(chance) {
                continue;
            }
            let points = self.rng.gen_range(10..30);
            let details = format!("Random Bonus: {points} points for being active!");
            if self
                .credit(&user_id, points, PointType::Expiring, ActivityKind::SurpriseDrop, details, now)
                .is_some()
            {
                granted += 1;
            }
        }

        tracing::info!(
            target: "draw",
            "Random bonus (off-peak: {}): {} users credited",
            off_peak,
            granted
        );
        granted
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::EngineConfig;

    fn engine_with(config: EngineConfig) -> PointEngine {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));
        PointEngine::with_clock(
            EngineConfig {
                rng_seed: Some(11),
                ..config
            },
            clock,
        )
        .unwrap()
    }

    fn seed_points(engine: &mut PointEngine, user_id: &str, amount: f64) {
        engine.register_user(user_id, user_id);
        // CreatorEarnings pays 10 points per unit, permanent
        engine.record_activity(user_id, "earnings", ActivityKind::CreatorEarnings, amount);
    }

    #[test]
    fn test_lucky_draw_filters_exact_range() {
        let mut engine = engine_with(EngineConfig::default());
        seed_points(&mut engine, "inside", 150.0); // 1500 Silver
        seed_points(&mut engine, "edge", 110.0); // 1100, same bucket as 1200
        seed_points(&mut engine, "outside", 300.0); // 3000

        let affected = engine.conduct_lucky_draw(1200, 2000, None);
        assert_eq!(affected, 1);
        assert_eq!(engine.user("inside").unwrap().total_points(), 1800);
        assert_eq!(engine.user("edge").unwrap().total_points(), 1100);
        assert_eq!(engine.user("outside").unwrap().total_points(), 3000);
        assert_eq!(engine.top_users(1)[0].id(), "outside");
        assert!(engine.verify_indices().is_ok());
    }

    #[test]
    fn test_lucky_draw_tier_filter() {
        let mut engine = engine_with(EngineConfig::default());
        seed_points(&mut engine, "silver", 100.0); // 1000
        seed_points(&mut engine, "gold", 600.0); // 6000

        assert_eq!(engine.conduct_lucky_draw(0, 10_000, Some(MembershipTier::Gold)), 1);
        assert_eq!(engine.user("gold").unwrap().total_points(), 9000);
        assert_eq!(engine.user("silver").unwrap().total_points(), 1000);
    }

    #[test]
    fn test_promotion_skips_top_tier_and_pins_floor() {
        let mut engine = engine_with(EngineConfig::default());
        engine.register_user("top", "Top");
        engine.record_activity("top", "sku-1", ActivityKind::Purchase, 12_000.0);
        engine.register_user("buyer", "Buyer");
        engine.record_activity("buyer", "sku-1", ActivityKind::Purchase, 10.0);
        engine.drain_events();

        assert_eq!(engine.conduct_product_promotion("sku-1"), Some("buyer".to_string()));
        let buyer = engine.user("buyer").unwrap();
        assert_eq!(buyer.tier(), MembershipTier::Silver);
        assert_eq!(buyer.tier_floor(), Some(MembershipTier::Silver));
        assert!(engine.users_by_tier(MembershipTier::Silver).iter().any(|p| p.id() == "buyer"));
        assert!(engine.verify_indices().is_ok());

        let events = engine.drain_events();
        assert!(events.contains(&LedgerEvent::TierChanged {
            user_id: "buyer".to_string(),
            from: MembershipTier::Bronze,
            to: MembershipTier::Silver,
            promoted: true,
        }));

        assert_eq!(engine.conduct_product_promotion("unknown-sku"), None);
    }

    #[test]
    fn test_surprise_rewards_with_certain_chance() {
        let mut engine = engine_with(EngineConfig {
            surprise_reward_chance: 1.0,
            ..EngineConfig::default()
        });
        engine.register_user("a", "A");
        engine.register_user("b", "B");

        assert_eq!(engine.generate_surprise_rewards(), 2);
        for user in ["a", "b"] {
            let profile = engine.user(user).unwrap();
            assert!((50..100).contains(&profile.total_points()));
            assert_eq!(profile.rewards().len(), 1);
        }
    }

    #[test]
    fn test_random_bonus_uses_peak_chance() {
        let mut engine = engine_with(EngineConfig {
            bonus_chance_peak: 0.0,
            bonus_chance_off_peak: 1.0,
            ..EngineConfig::default()
        });
        engine.register_user("a", "A");
        // 09:00 is peak
        assert_eq!(engine.generate_random_bonus_points(), 0);
        assert_eq!(engine.user("a").unwrap().total_points(), 0);
    }

    #[test]
    fn test_random_lucky_draw_is_deterministic_with_seed() {
        let run = || {
            let mut engine = engine_with(EngineConfig::default());
            for (user, amount) in [("a", 60.0), ("b", 120.0), ("c", 180.0), ("d", 240.0)] {
                seed_points(&mut engine, user, amount);
            }
            let affected = engine.conduct_random_lucky_draw();
            let totals: Vec<i64> = ["a", "b", "c", "d"]
                .iter()
                .map(|user| engine.user(user).unwrap().total_points())
                .collect();
            (affected, totals)
        };
        assert_eq!(run(), run());
    }
}
