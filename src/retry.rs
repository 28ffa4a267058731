//! Fixed-count retry policy shared by every generation step.
//!
//! Sequential and blocking: each attempt runs to completion before the next
//! starts, with no backoff, jitter or cancellation. Transient failures emit
//! a visible warning per attempt; the final failure escalates to a terminal
//! error through the same [`Reporter`] seam the UI listens on.

use std::fmt::Display;
use std::future::Future;
use tracing::{error, warn};

/// Sink for user-visible warnings and terminal errors raised by the retry
/// loop. The UI shell renders these; tests count them.
pub trait Reporter: Send {
    fn warn(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Forwards reports to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn warn(&mut self, message: &str) {
        warn!("{message}");
    }

    fn error(&mut self, message: &str) {
        error!("{message}");
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` up to `max_attempts` times. Attempts 1..max that fail raise
    /// a warning; a failure on the final attempt raises a terminal error and
    /// returns it to the caller.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        reporter: &mut dyn Reporter,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt == self.max_attempts => {
                    reporter.error(&format!(
                        "Error {} after {} attempts: {}",
                        label, self.max_attempts, err
                    ));
                    return Err(err);
                }
                Err(_) => {
                    reporter.warn(&format!(
                        "Error {}. Retrying attempt {}/{}...",
                        label,
                        attempt + 1,
                        self.max_attempts
                    ));
                    attempt += 1;
                }
            }
        }
    }

    /// Like [`run`](Self::run) but exhaustion yields the failure sentinel
    /// (`T::default()`, e.g. an empty list or string) instead of an error.
    pub async fn run_or_default<T, E, F, Fut>(
        &self,
        label: &str,
        reporter: &mut dyn Reporter,
        op: F,
    ) -> T
    where
        T: Default,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run(label, reporter, op).await.unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Counts what the UI would have shown.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingReporter {
        pub warnings: Vec<String>,
        pub errors: Vec<String>,
    }

    impl Reporter for RecordingReporter {
        fn warn(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }

        fn error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    #[tokio::test]
    async fn succeeds_after_two_failures() {
        let policy = RetryPolicy::new(3);
        let mut reporter = RecordingReporter::default();
        let calls = AtomicU32::new(0);

        let result: Result<&str, String> = policy
            .run("generating threat model", &mut reporter, || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("transient".to_string())
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(reporter.warnings.len(), 2);
        assert!(reporter.errors.is_empty());
    }

    #[tokio::test]
    async fn exhaustion_reports_terminal_error_and_sentinel() {
        let policy = RetryPolicy::new(3);
        let mut reporter = RecordingReporter::default();

        let result: Vec<String> = policy
            .run_or_default("suggesting mitigations", &mut reporter, || async {
                Err::<Vec<String>, _>("provider down".to_string())
            })
            .await;

        assert!(result.is_empty());
        assert_eq!(reporter.warnings.len(), 2);
        assert_eq!(reporter.errors.len(), 1);
        assert!(reporter.errors[0].contains("after 3 attempts"));
    }

    #[test]
    fn first_attempt_success_is_silent() {
        let policy = RetryPolicy::default();
        let mut reporter = RecordingReporter::default();
        let result: Result<u32, String> = tokio_test::block_on(policy.run(
            "noop",
            &mut reporter,
            || async { Ok(7) },
        ));
        assert_eq!(result.unwrap(), 7);
        assert!(reporter.warnings.is_empty());
        assert!(reporter.errors.is_empty());
    }
}
