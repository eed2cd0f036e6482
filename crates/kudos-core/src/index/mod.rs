//! Derived views over the ledger: leaderboard order and range/tier buckets.

mod buckets;
mod rank;

pub use buckets::{Placement, SecondaryIndex};
pub use rank::RankIndex;
