//! Bounded retry with a fixed pause between attempts.

use std::thread;
use std::time::Duration;

use log::error;

/// Run `op` up to `max_attempts` times, pausing `pause` between attempts.
///
/// Each failure is logged with its attempt counter. The error of the final
/// attempt is returned once the budget is used up; no retry loop in this
/// crate runs unbounded.
pub fn with_retry<T, E, F>(max_attempts: u32, pause: Duration, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                error!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                if attempt >= max_attempts {
                    return Err(e);
                }
                thread::sleep(pause);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A write that fails nine times and succeeds on the tenth attempt
    /// reports overall success.
    #[test]
    fn succeeds_within_budget() {
        let mut calls = 0;
        let result = with_retry(10, Duration::ZERO, || {
            calls += 1;
            if calls < 10 {
                Err("transient failure")
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result, Ok(10));
    }

    #[test]
    fn exhausts_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), &str> = with_retry(10, Duration::ZERO, || {
            calls += 1;
            Err("persistent failure")
        });
        assert_eq!(result, Err("persistent failure"));
        assert_eq!(calls, 10, "budget is exactly ten execution attempts");
    }

    #[test]
    fn first_success_short_circuits() {
        let mut calls = 0;
        let result: Result<i32, &str> = with_retry(10, Duration::ZERO, || {
            calls += 1;
            Ok(7)
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls, 1);
    }
}
