//! Probe-start cadence scheduler.

use std::time::Duration;

use tokio::time::Instant;

/// Drift-correcting scheduler for probe starts.
///
/// Holds the instant of the most recently *started* probe and, before
/// each new probe, sleeps only for whatever remains of the interval.
/// Recording the start instant before the probe runs means probe
/// latency never compounds into the next deadline; long-run drift is
/// bounded by scheduling overhead alone.
///
/// The comparison is sub-second precise. A probe that overruns the
/// interval gets no sleep at all for the next slot, and no catch-up
/// burst: the schedule simply resumes from the late start.
#[derive(Debug)]
pub struct Cadence {
    interval: Duration,
    last_start: Option<Instant>,
}

impl Cadence {
    /// Create a scheduler with the given target interval. Zero is
    /// legal and disables pacing (test mode).
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_start: None,
        }
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next probe slot, then mark it started.
    ///
    /// The very first call returns immediately. State carries across
    /// session boundaries because the caller owns this value for the
    /// life of the sampling loop.
    pub async fn pace(&mut self) {
        if let Some(last) = self.last_start {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        self.last_start = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_probe_starts_immediately() {
        let mut cadence = Cadence::new(Duration::from_secs(1));
        let before = Instant::now();
        cadence.pace().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_cumulative_drift_over_100_probes() {
        let mut cadence = Cadence::new(Duration::from_secs(1));
        let origin = Instant::now();

        cadence.pace().await;
        for _ in 0..100 {
            cadence.pace().await;
        }

        // Instant probes: 100 intervals after the first start, exact
        // under the paused clock. Drift stays below one interval.
        assert_eq!(origin.elapsed(), Duration::from_secs(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subsecond_remainder_is_respected() {
        let mut cadence = Cadence::new(Duration::from_secs(1));
        cadence.pace().await;

        // Probe takes 300ms; the next slot is 700ms away, not a whole
        // second and not zero.
        tokio::time::advance(Duration::from_millis(300)).await;
        let before = Instant::now();
        cadence.pace().await;
        assert_eq!(before.elapsed(), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_probe_gets_no_sleep_and_no_catch_up() {
        let mut cadence = Cadence::new(Duration::from_secs(1));
        cadence.pace().await;

        // Probe overruns the interval by 1.5s.
        tokio::time::advance(Duration::from_millis(2500)).await;

        // Next slot starts immediately, no negative sleep.
        let before = Instant::now();
        cadence.pace().await;
        assert_eq!(before.elapsed(), Duration::ZERO);

        // And the slot after that is one full interval out: the
        // schedule resumed from the late start rather than bursting.
        let before = Instant::now();
        cadence.pace().await;
        assert_eq!(before.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_zero_interval_never_sleeps() {
        let mut cadence = Cadence::new(Duration::ZERO);
        let before = std::time::Instant::now();
        for _ in 0..50 {
            cadence.pace().await;
        }
        assert!(before.elapsed() < Duration::from_millis(100));
    }
}
