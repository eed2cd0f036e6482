//! End-to-end behaviour of the engine through its public API.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use kudos_core::catalog::AchievementBadge;
use kudos_core::{
    ActivityKind, ChallengeStatus, EngineConfig, LedgerEvent, ManualClock, MembershipTier,
    NewChallenge, PointEngine,
};

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
}

fn engine() -> (PointEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(morning()));
    let config = EngineConfig {
        rng_seed: Some(2024),
        ..EngineConfig::default()
    };
    let engine = PointEngine::with_clock(config, clock.clone()).unwrap();
    (engine, clock)
}

/// Registers `user_id` with `points` permanent points (multiple of 10).
fn user_with_points(engine: &mut PointEngine, user_id: &str, points: i64) {
    engine.register_user(user_id, user_id);
    if points > 0 {
        let earned = engine.record_activity(
            user_id,
            "earnings",
            ActivityKind::CreatorEarnings,
            (points / 10) as f64,
        );
        assert_eq!(earned, points);
    }
}

#[test]
fn test_indices_stay_consistent_across_every_mutation() {
    let (mut engine, clock) = engine();
    for (i, points) in [0, 480, 990, 4_990, 9_990, 12_000].into_iter().enumerate() {
        user_with_points(&mut engine, &format!("user-{i}"), points);
        assert!(engine.verify_indices().is_ok());
    }

    engine.record_activity("user-1", "post-1", ActivityKind::Post, 0.0);
    assert!(engine.verify_indices().is_ok());
    assert_eq!(engine.user("user-1").unwrap().tier(), MembershipTier::Silver);

    engine.follow("user-0", "user-5");
    engine.record_login("user-2");
    assert!(engine.verify_indices().is_ok());

    engine.conduct_lucky_draw(900, 5_000, None);
    assert!(engine.verify_indices().is_ok());

    engine.record_activity("user-3", "sku-9", ActivityKind::Purchase, 1.0);
    engine.conduct_product_promotion("sku-9");
    assert!(engine.verify_indices().is_ok());

    clock.advance(Duration::days(31));
    engine.apply_weekly_decay();
    assert!(engine.verify_indices().is_ok());

    engine.expire_points();
    engine.generate_surprise_rewards();
    engine.generate_random_bonus_points();
    engine.conduct_random_lucky_draw();
    assert!(engine.verify_indices().is_ok());

    for tier in [
        MembershipTier::Bronze,
        MembershipTier::Silver,
        MembershipTier::Gold,
        MembershipTier::Platinum,
    ] {
        for profile in engine.users_by_tier(tier) {
            assert_eq!(profile.tier(), tier);
        }
    }
}

#[test]
fn test_top_users_are_ordered_with_id_tiebreak() {
    let (mut engine, _) = engine();
    user_with_points(&mut engine, "carol", 300);
    user_with_points(&mut engine, "alice", 700);
    user_with_points(&mut engine, "bob", 300);
    user_with_points(&mut engine, "dave", 0);

    let ids: Vec<&str> = engine.top_users(10).iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["alice", "bob", "carol", "dave"]);
    assert_eq!(engine.top_users(2).len(), 2);
    assert_eq!(engine.rank_of("carol"), Some(3));

    let top = engine.top_users(4);
    assert!(top.windows(2).all(|pair| pair[0].total_points() >= pair[1].total_points()));
}

#[test]
fn test_comment_cap_through_engine() {
    let (mut engine, _) = engine();
    engine.register_user("alice", "Alice");
    let awards: Vec<i64> = (0..6)
        .map(|_| engine.record_activity("alice", "post-1", ActivityKind::Comment, 0.0))
        .collect();
    assert_eq!(awards, vec![10, 10, 10, 10, 10, 0]);
}

#[test]
fn test_video_watch_deltas_through_engine() {
    let (mut engine, _) = engine();
    engine.register_user("alice", "Alice");
    let deltas: Vec<i64> = [3.0, 5.0, 20.0, 30.0]
        .into_iter()
        .map(|minutes| engine.record_activity("alice", "video-1", ActivityKind::VideoWatch, minutes))
        .collect();
    assert_eq!(deltas, vec![15, 10, 25, 0]);
}

#[test]
fn test_gold_trending_power_hour_post_earns_450() {
    let (mut engine, clock) = engine();
    user_with_points(&mut engine, "alice", 5_000);
    assert_eq!(engine.user("alice").unwrap().tier(), MembershipTier::Gold);

    clock.set(Utc.with_ymd_and_hms(2024, 6, 3, 19, 0, 0).unwrap());
    engine.mark_trending("post-x");
    assert_eq!(engine.record_activity("alice", "post-x", ActivityKind::Post, 0.0), 450);
}

#[test]
fn test_decay_once_per_interval() {
    let (mut engine, clock) = engine();
    user_with_points(&mut engine, "alice", 1_000);

    clock.advance(Duration::days(30));
    assert_eq!(engine.apply_weekly_decay(), 1);
    assert_eq!(engine.user("alice").unwrap().total_points(), 950);

    clock.advance(Duration::days(10));
    assert_eq!(engine.apply_weekly_decay(), 0);
    assert_eq!(engine.user("alice").unwrap().total_points(), 950);

    let last = engine.user("alice").unwrap().activity_history().last().unwrap().clone();
    assert_eq!(last.kind, ActivityKind::PointsDecay);
    assert_eq!(last.points, -50);
}

#[test]
fn test_challenge_completion_scenario() {
    let (mut engine, _) = engine();
    engine.register_user("alice", "Alice");
    engine.register_user("bob", "Bob");
    let id = engine
        .create_challenge(NewChallenge {
            name: "Comment Spree".to_string(),
            description: "Comment together".to_string(),
            target_points: 100,
            duration: Duration::hours(48),
            reward: "Custom Emoji".to_string(),
        })
        .id()
        .to_string();
    assert!(engine.join_challenge("alice", &id));
    assert!(engine.join_challenge("bob", &id));
    engine.drain_events();

    assert!(engine.contribute("alice", &id, 60));
    assert!(engine.contribute("bob", &id, 50));
    assert!(!engine.contribute("alice", &id, 5));
    assert_eq!(engine.challenge(&id).unwrap().status(), ChallengeStatus::Completed);

    let events = engine.drain_events();
    let rewarded: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            LedgerEvent::RewardGranted { user_id, .. } => Some(user_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(rewarded, vec!["alice", "bob"]);
    assert!(engine.user("alice").unwrap().participating_challenges().contains(&id));
}

#[test]
fn test_expiring_points_lapse_but_permanent_stay() {
    let (mut engine, clock) = engine();
    user_with_points(&mut engine, "alice", 100);
    engine.record_activity("alice", "post-1", ActivityKind::Share, 0.0);
    assert_eq!(engine.user("alice").unwrap().total_points(), 125);

    clock.advance(Duration::days(29));
    assert_eq!(engine.expire_points(), 0);

    clock.advance(Duration::days(1));
    assert_eq!(engine.expire_points(), 1);
    assert_eq!(engine.user("alice").unwrap().total_points(), 100);
}

#[test]
fn test_badges_and_social_graph() {
    let (mut engine, _) = engine();
    engine.register_user("star", "Star");
    for i in 0..100 {
        let fan = format!("fan-{i:03}");
        engine.register_user(&fan, &fan);
        assert!(engine.follow(&fan, "star"));
    }
    let star = engine.user("star").unwrap();
    assert_eq!(star.followers_count(), 100);
    assert!(star.has_badge(AchievementBadge::SocialButterfly));
    assert_eq!(star.total_points(), AchievementBadge::SocialButterfly.bonus_points());
}
