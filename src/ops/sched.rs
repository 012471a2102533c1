use std::time::{Duration, Instant};

/// Single-flight poll schedule for sync cycles.
///
/// One timer drives everything: `start` arms it with an immediate first
/// cycle, `due` says when to fire, `begin`/`finish` bracket the in-flight
/// cycle, and `finish` re-arms one full interval later whether the cycle
/// succeeded or not — a failed poll is simply retried on the next tick.
/// Timestamps are passed in so the transitions are testable.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Duration,
    running: bool,
    in_flight: bool,
    next_due: Option<Instant>,
}

impl PollSchedule {
    pub fn new(interval: Duration) -> Self {
        PollSchedule {
            interval,
            running: false,
            in_flight: false,
            next_due: None,
        }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self::new(Duration::from_secs(minutes.max(1) * 60))
    }

    /// Arm the schedule; the first cycle is due immediately.
    pub fn start(&mut self, now: Instant) {
        self.running = true;
        self.next_due = Some(now);
    }

    /// Disarm. An in-flight cycle still finishes, but nothing new fires.
    pub fn stop(&mut self) {
        self.running = false;
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Manual trigger: make the next cycle due now. Ignored while a cycle
    /// is in flight (single-flight). Works even when the schedule is
    /// stopped — that's a one-shot sync.
    pub fn request_sync(&mut self, now: Instant) {
        if !self.in_flight {
            self.next_due = Some(now);
        }
    }

    /// Should a cycle fire?
    pub fn due(&self, now: Instant) -> bool {
        !self.in_flight && self.next_due.is_some_and(|due| due <= now)
    }

    /// A cycle started.
    pub fn begin(&mut self) {
        self.in_flight = true;
        self.next_due = None;
    }

    /// The cycle ended (either way); re-arm if still running.
    pub fn finish(&mut self, now: Instant) {
        self.in_flight = false;
        if self.running {
            self.next_due = Some(now + self.interval);
        }
    }

    /// Countdown to the next cycle, `None` when nothing is scheduled.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let due = self.next_due?;
        Some(due.saturating_duration_since(now))
    }

    /// Apply a new interval (config reload). Takes effect from the next
    /// `finish`; an already-armed deadline is left alone.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }
}

/// Format a countdown as `MM:SS` (`-` when idle, `00:00` while due).
pub fn format_remaining(remaining: Option<Duration>) -> String {
    match remaining {
        None => "-".to_string(),
        Some(d) => {
            let total = d.as_secs();
            format!("{:02}:{:02}", total / 60, total % 60)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sched() -> PollSchedule {
        PollSchedule::new(Duration::from_secs(600))
    }

    #[test]
    fn starts_due_immediately() {
        let mut s = sched();
        let now = Instant::now();
        assert!(!s.due(now));
        s.start(now);
        assert!(s.due(now));
    }

    #[test]
    fn cycle_reschedules_one_interval_out() {
        let mut s = sched();
        let now = Instant::now();
        s.start(now);
        s.begin();
        assert!(!s.due(now));

        let end = now + Duration::from_secs(5);
        s.finish(end);
        assert!(!s.due(end));
        assert!(s.due(end + Duration::from_secs(600)));
        assert_eq!(s.remaining(end), Some(Duration::from_secs(600)));
    }

    #[test]
    fn failure_path_is_the_same_reschedule() {
        // finish() carries no success flag: failed cycles re-arm identically
        let mut s = sched();
        let now = Instant::now();
        s.start(now);
        s.begin();
        s.finish(now);
        assert_eq!(s.remaining(now), Some(Duration::from_secs(600)));
    }

    #[test]
    fn manual_trigger_fires_early() {
        let mut s = sched();
        let now = Instant::now();
        s.start(now);
        s.begin();
        s.finish(now);

        let later = now + Duration::from_secs(60);
        assert!(!s.due(later));
        s.request_sync(later);
        assert!(s.due(later));
    }

    #[test]
    fn manual_trigger_ignored_in_flight() {
        let mut s = sched();
        let now = Instant::now();
        s.start(now);
        s.begin();
        s.request_sync(now);
        assert!(!s.due(now));
    }

    #[test]
    fn manual_trigger_works_while_stopped() {
        let mut s = sched();
        let now = Instant::now();
        s.request_sync(now);
        assert!(s.due(now));
        s.begin();
        s.finish(now);
        // Stopped schedule does not re-arm after a one-shot sync
        assert_eq!(s.remaining(now), None);
    }

    #[test]
    fn stop_disarms() {
        let mut s = sched();
        let now = Instant::now();
        s.start(now);
        s.stop();
        assert!(!s.due(now));
        assert_eq!(s.remaining(now), None);
    }

    #[test]
    fn from_minutes_clamps_to_one() {
        let mut s = PollSchedule::from_minutes(0);
        let now = Instant::now();
        s.start(now);
        s.begin();
        s.finish(now);
        assert_eq!(s.remaining(now), Some(Duration::from_secs(60)));
    }

    #[test]
    fn countdown_formatting() {
        assert_eq!(format_remaining(None), "-");
        assert_eq!(format_remaining(Some(Duration::from_secs(0))), "00:00");
        assert_eq!(format_remaining(Some(Duration::from_secs(65))), "01:05");
        assert_eq!(format_remaining(Some(Duration::from_secs(1800))), "30:00");
    }

    #[test]
    fn remaining_saturates_past_due() {
        let mut s = sched();
        let now = Instant::now();
        s.start(now);
        let later = now + Duration::from_secs(30);
        assert_eq!(s.remaining(later), Some(Duration::ZERO));
    }
}
