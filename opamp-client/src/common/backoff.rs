//! Exponential back-off for the HTTP polling sender, clamped up to any
//! `Retry-After` hint the Server provides.

use std::time::Duration;

const INITIAL: Duration = Duration::from_millis(500);
const MAX: Duration = Duration::from_secs(30);
const MULTIPLIER: u32 = 2;

/// Tracks the current retry delay across a sequence of failed send attempts.
/// Resets to `INITIAL` after a successful send.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Backoff {
    current: Duration,
}

impl Backoff {
    pub(crate) fn new() -> Self {
        Self { current: INITIAL }
    }

    /// Returns the delay to wait before the next retry, lengthening the
    /// internal state for the following call. If `retry_after` is larger
    /// than the computed back-off, it takes precedence.
    pub(crate) fn next_delay(&mut self, retry_after: Option<Duration>) -> Duration {
        let computed = self.current;
        self.current = (self.current * MULTIPLIER).min(MAX);
        match retry_after {
            Some(hint) if hint > computed => hint,
            _ => computed,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.current = INITIAL;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses an HTTP `Retry-After` header value, which is either an integer
/// number of seconds or an HTTP-date. Only the integer-seconds form is
/// supported; an HTTP-date value is logged and ignored.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    tracing::debug!("ignoring non-numeric Retry-After value: {value}");
    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn backoff_doubles_until_max() {
        let mut backoff = Backoff::new();
        let first = backoff.next_delay(None);
        let second = backoff.next_delay(None);
        assert_eq!(second, first * MULTIPLIER);
    }

    #[test]
    fn backoff_never_exceeds_max() {
        let mut backoff = Backoff::new();
        for _ in 0..20 {
            backoff.next_delay(None);
        }
        assert!(backoff.next_delay(None) <= MAX);
    }

    #[test]
    fn retry_after_hint_wins_when_larger() {
        let mut backoff = Backoff::new();
        let delay = backoff.next_delay(Some(Duration::from_secs(120)));
        assert_eq!(delay, Duration::from_secs(120));
    }

    #[test]
    fn reset_restores_initial_delay() {
        let mut backoff = Backoff::new();
        backoff.next_delay(None);
        backoff.next_delay(None);
        backoff.reset();
        assert_eq!(backoff.next_delay(None), INITIAL);
    }

    #[test]
    fn parse_retry_after_accepts_seconds() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
    }

    #[test]
    fn parse_retry_after_rejects_http_date() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2026 07:28:00 GMT"),
            None
        );
    }
}
