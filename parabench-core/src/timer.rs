// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Wall-clock timing around a strategy's execution window.
//!
//! Readings come from the monotonic clock. Reporting is left to callers.

use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

/// Timer for measuring one execution window.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time so far, leaving the timer running.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return elapsed seconds.
    pub fn stop(self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Measure the execution time of a closure.
pub fn measure<F, T>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let timer = Timer::start();
    let result = f();
    (result, timer.elapsed())
}

/// Measure a closure that may panic.
///
/// The second reading is taken before the panic is handed back, so the
/// duration is always available.
pub fn measure_unwind<F, T>(f: F) -> (thread::Result<T>, Duration)
where
    F: FnOnce() -> T,
{
    let timer = Timer::start();
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    (result, timer.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        thread::sleep(Duration::from_millis(10));
        let elapsed = timer.stop();

        // Should be at least 10ms
        assert!(elapsed >= 0.010, "Elapsed {} < 10ms", elapsed);
    }

    #[test]
    fn test_measure() {
        let (result, duration) = measure(|| {
            thread::sleep(Duration::from_millis(5));
            42
        });

        assert_eq!(result, 42);
        assert!(duration >= Duration::from_millis(5));
    }

    #[test]
    fn test_measure_unwind_keeps_reading_on_panic() {
        let (result, duration) = measure_unwind(|| {
            thread::sleep(Duration::from_millis(5));
            panic!("strategy blew up");
        });

        assert!(result.is_err());
        assert!(duration >= Duration::from_millis(5));
    }

    #[test]
    fn test_empty_window_is_non_negative() {
        let (_, duration) = measure(|| ());
        assert!(duration.as_secs_f64() >= 0.0);
    }
}
