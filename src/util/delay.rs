//! Delay before the screen is grabbed
//!
//! With a countdown the remaining seconds are written to stderr as
//! `Taking shot in 3.. 2.. 1.. `, one step per second.

use std::{
    io::{self, Write},
    thread,
    time::Duration,
};

/// Sleeps for `seconds`, optionally printing a countdown
pub fn apply_delay(seconds: u64, countdown: bool) {
    if seconds == 0 {
        return;
    }
    tracing::debug!("Delaying capture by {}s", seconds);

    if !countdown {
        thread::sleep(Duration::from_secs(seconds));
        return;
    }

    let mut stderr = io::stderr().lock();
    let _ = write!(stderr, "Taking shot in ");
    for remaining in (1..=seconds).rev() {
        let _ = write!(stderr, "{}.. ", remaining);
        let _ = stderr.flush();
        thread::sleep(Duration::from_secs(1));
    }
    let _ = writeln!(stderr);
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn test_zero_delay_returns_immediately() {
        let start = Instant::now();
        apply_delay(0, true);
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
