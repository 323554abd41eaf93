use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A simulation clock that tracks hourly ticks over a fixed duration.
///
/// The clock can start part-way through a run, so a simulator that has
/// already stepped keeps counting hours from where it stopped.
///
/// # Examples
///
/// ```
/// use solar_swarm::sim::clock::Clock;
///
/// let mut clock = Clock::starting_at(22, 3);
/// let mut hours = Vec::new();
///
/// clock.run(|hour| hours.push(hour));
/// assert_eq!(hours, vec![22, 23, 24]);
/// ```
pub struct Clock {
    /// Next hour to hand out
    current: usize,
    /// Hour at which the clock stops (exclusive)
    end: usize,
}

impl Clock {
    /// Creates a clock that ticks hours `0..total`.
    pub fn new(total: usize) -> Self {
        Self::starting_at(0, total)
    }

    /// Creates a clock that ticks `total` hours starting at `start`.
    pub fn starting_at(start: usize, total: usize) -> Self {
        Self {
            current: start,
            end: start.saturating_add(total),
        }
    }

    /// Advances the clock by one hour.
    ///
    /// # Returns
    ///
    /// * `Some(hour)` - The hour before advancing
    /// * `None` - If the clock has reached its end
    pub fn tick(&mut self) -> Option<usize> {
        if self.current < self.end {
            let hour = self.current;
            self.current += 1;
            Some(hour)
        } else {
            None
        }
    }

    /// Hours left to tick.
    pub fn remaining(&self) -> usize {
        self.end - self.current
    }

    /// Runs a function for each remaining hour.
    pub fn run(&mut self, mut f: impl FnMut(usize)) {
        while let Some(hour) = self.tick() {
            f(hour);
        }
    }
}

/// Cancellation flag and presentation pacing for a multi-tick run.
///
/// The flag is polled between ticks only; a tick in progress always
/// completes. Clones share the same flag, so a UI or request handler can
/// stop a run owned by another thread.
#[derive(Debug, Clone)]
pub struct RunControl {
    running: Arc<AtomicBool>,
    tick_delay: Option<Duration>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            tick_delay: None,
        }
    }
}

impl RunControl {
    /// Running control with no delay between ticks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pause between ticks. A zero delay is ignored.
    pub fn with_tick_delay(mut self, delay: Duration) -> Self {
        self.tick_delay = (!delay.is_zero()).then_some(delay);
        self
    }

    /// Pause inserted between ticks, if any.
    pub fn tick_delay(&self) -> Option<Duration> {
        self.tick_delay
    }

    /// Returns `true` until [`RunControl::stop`] is called.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Asks the run to stop before its next tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Sleeps for the configured delay.
    pub fn pace(&self) {
        if let Some(delay) = self.tick_delay {
            std::thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick() {
        let mut clock = Clock::new(2);
        assert_eq!(clock.tick(), Some(0));
        assert_eq!(clock.tick(), Some(1));
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn test_offset_clock() {
        let mut clock = Clock::starting_at(5, 2);
        assert_eq!(clock.remaining(), 2);
        assert_eq!(clock.tick(), Some(5));
        assert_eq!(clock.tick(), Some(6));
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.remaining(), 0);
    }

    #[test]
    fn test_empty_clock() {
        let mut clock = Clock::new(0);
        assert_eq!(clock.tick(), None);

        let mut was_called = false;
        clock.run(|_| was_called = true);
        assert!(!was_called);
    }

    #[test]
    fn stop_is_shared_between_clones() {
        let control = RunControl::new();
        let handle = control.clone();
        assert!(control.is_running());
        handle.stop();
        assert!(!control.is_running());
    }

    #[test]
    fn zero_delay_is_no_delay() {
        let control = RunControl::new().with_tick_delay(Duration::ZERO);
        assert_eq!(control.tick_delay(), None);
        let control = RunControl::new().with_tick_delay(Duration::from_millis(5));
        assert_eq!(control.tick_delay(), Some(Duration::from_millis(5)));
    }
}
