// Sliding dispatch windows
// Author: kelexine (https://github.com/kelexine)

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

pub const MINUTE: Duration = Duration::from_secs(60);
pub const HOUR: Duration = Duration::from_secs(3600);

/// Which trailing window blocked an admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Minute,
    Hour,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Minute => "minute",
            WindowKind::Hour => "hour",
        }
    }
}

/// Dispatch timestamps over the trailing minute and hour, oldest first.
#[derive(Debug, Default)]
pub struct RateWindow {
    minute: VecDeque<Instant>,
    hour: VecDeque<Instant>,
}

impl RateWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop timestamps that have left their lookback horizon.
    pub fn prune(&mut self, now: Instant) {
        prune_older_than(&mut self.minute, now, MINUTE);
        prune_older_than(&mut self.hour, now, HOUR);
    }

    /// If a window is full, how long until its oldest entry ages out.
    ///
    /// The minute window is checked first. Call after `prune`.
    pub fn wait_time(
        &self,
        now: Instant,
        per_minute: usize,
        per_hour: usize,
    ) -> Option<(WindowKind, Duration)> {
        if self.minute.len() >= per_minute {
            let oldest = self.minute.front().copied().unwrap_or(now);
            return Some((WindowKind::Minute, (oldest + MINUTE).saturating_duration_since(now)));
        }
        if self.hour.len() >= per_hour {
            let oldest = self.hour.front().copied().unwrap_or(now);
            return Some((WindowKind::Hour, (oldest + HOUR).saturating_duration_since(now)));
        }
        None
    }

    /// Record one dispatch in both windows.
    pub fn record(&mut self, now: Instant) {
        self.minute.push_back(now);
        self.hour.push_back(now);
    }

    /// Dispatches within the trailing minute and hour, without mutating.
    pub fn counts(&self, now: Instant) -> (usize, usize) {
        (
            count_within(&self.minute, now, MINUTE),
            count_within(&self.hour, now, HOUR),
        )
    }
}

fn prune_older_than(window: &mut VecDeque<Instant>, now: Instant, horizon: Duration) {
    while let Some(front) = window.front() {
        if now.saturating_duration_since(*front) >= horizon {
            window.pop_front();
        } else {
            break;
        }
    }
}

fn count_within(window: &VecDeque<Instant>, now: Instant, horizon: Duration) -> usize {
    window
        .iter()
        .filter(|t| now.saturating_duration_since(**t) < horizon)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minute_window_blocks_until_oldest_expires() {
        let start = Instant::now();
        let mut window = RateWindow::new();
        window.record(start);
        window.record(start + Duration::from_secs(10));

        let now = start + Duration::from_secs(20);
        window.prune(now);
        let (kind, wait) = window.wait_time(now, 2, 100).unwrap();
        assert_eq!(kind, WindowKind::Minute);
        assert_eq!(wait, Duration::from_secs(40));

        let later = start + MINUTE;
        window.prune(later);
        assert!(window.wait_time(later, 2, 100).is_none());
        assert_eq!(window.counts(later), (1, 2));
    }

    #[test]
    fn test_hour_window_checked_after_minute() {
        let start = Instant::now();
        let mut window = RateWindow::new();
        for i in 0..3 {
            window.record(start + Duration::from_secs(i * 120));
        }
        let now = start + Duration::from_secs(400);
        window.prune(now);
        let (kind, wait) = window.wait_time(now, 10, 3).unwrap();
        assert_eq!(kind, WindowKind::Hour);
        assert_eq!(wait, HOUR - Duration::from_secs(400));
    }
}
