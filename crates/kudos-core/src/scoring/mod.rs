//! Point scoring: base awards, trending state and the multiplier pipeline.

pub mod calculator;
mod multiplier;
mod trend;

pub use calculator::{ItemCounters, PointCalculator};
pub use multiplier::MultiplierPolicy;
pub use trend::TrendTracker;
