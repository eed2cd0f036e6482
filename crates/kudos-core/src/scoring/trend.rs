use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

/// Tracks when items were marked trending.
///
/// Expired marks are evicted when they are read; there is no background sweep.
#[derive(Debug, Clone)]
pub struct TrendTracker {
    marked_at: HashMap<String, DateTime<Utc>>,
    window: Duration,
}

impl TrendTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            marked_at: HashMap::new(),
            window,
        }
    }

    /// Starts (or restarts) the trending window for `item_id`.
    pub fn mark(&mut self, item_id: &str, now: DateTime<Utc>) {
        self.marked_at.insert(item_id.to_string(), now);
    }

    pub fn is_trending(&mut self, item_id: &str, now: DateTime<Utc>) -> bool {
        match self.marked_at.get(item_id) {
            Some(marked) if now < *marked + self.window => true,
            Some(_) => {
                self.marked_at.remove(item_id);
                false
            }
            None => false,
        }
    }

    /// Number of marks held, including ones not yet evicted.
    pub fn tracked(&self) -> usize {
        self.marked_at.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_is_half_open_and_evicts_on_read() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let mut tracker = TrendTracker::new(Duration::hours(24));
        tracker.mark("post-1", start);

        assert!(tracker.is_trending("post-1", start));
        assert!(tracker.is_trending("post-1", start + Duration::hours(23)));
        assert_eq!(tracker.tracked(), 1);

        assert!(!tracker.is_trending("post-1", start + Duration::hours(24)));
        assert_eq!(tracker.tracked(), 0);
        assert!(!tracker.is_trending("unknown", start));
    }

    #[test]
    fn test_remark_restarts_window() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let mut tracker = TrendTracker::new(Duration::hours(24));
        tracker.mark("post-1", start);
        tracker.mark("post-1", start + Duration::hours(20));
        assert!(tracker.is_trending("post-1", start + Duration::hours(30)));
    }
}
