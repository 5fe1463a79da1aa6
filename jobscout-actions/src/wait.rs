//! How the discovery loop gives lazily rendered content time to appear.
//!
//! None of these observe the content itself; they are heuristics that can be
//! swapped without touching the loop.

use jobscout_config::WaitConfig;
use jobscout_drivers::BrowserSession;
use rand::Rng;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum WaitStrategy {
    /// Same pause after every scroll.
    Fixed(Duration),
    /// `base * 2^(attempt-1)`, capped at `max`, optionally with up to 50% jitter.
    Backoff {
        base: Duration,
        max: Duration,
        jitter: bool,
    },
    /// Poll `document.readyState` until `"complete"` or `timeout`.
    Readiness { poll: Duration, timeout: Duration },
}

impl Default for WaitStrategy {
    fn default() -> Self {
        Self::Fixed(Duration::from_millis(1000))
    }
}

impl From<&WaitConfig> for WaitStrategy {
    fn from(cfg: &WaitConfig) -> Self {
        match *cfg {
            WaitConfig::Fixed { delay_ms } => Self::Fixed(Duration::from_millis(delay_ms)),
            WaitConfig::Backoff {
                base_ms,
                max_ms,
                jitter,
            } => Self::Backoff {
                base: Duration::from_millis(base_ms),
                max: Duration::from_millis(max_ms),
                jitter,
            },
            WaitConfig::Readiness {
                poll_ms,
                timeout_ms,
            } => Self::Readiness {
                poll: Duration::from_millis(poll_ms),
                timeout: Duration::from_millis(timeout_ms),
            },
        }
    }
}

impl WaitStrategy {
    /// No pause at all; useful for tests and static pages.
    pub fn none() -> Self {
        Self::Fixed(Duration::ZERO)
    }

    /// Pause before jitter for the 1-based `attempt`. Readiness polling has no
    /// fixed delay and reports its poll interval.
    ///
    /// ```
    /// use jobscout_actions::wait::WaitStrategy;
    /// use std::time::Duration;
    ///
    /// let backoff = WaitStrategy::Backoff {
    ///     base: Duration::from_millis(100),
    ///     max: Duration::from_millis(350),
    ///     jitter: false,
    /// };
    /// assert_eq!(backoff.base_delay(1), Duration::from_millis(100));
    /// assert_eq!(backoff.base_delay(2), Duration::from_millis(200));
    /// assert_eq!(backoff.base_delay(3), Duration::from_millis(350));
    /// ```
    pub fn base_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(d) => *d,
            Self::Backoff { base, max, .. } => {
                let shift = attempt.saturating_sub(1).min(16);
                base.saturating_mul(1u32 << shift).min(*max)
            }
            Self::Readiness { poll, .. } => *poll,
        }
    }

    /// Wait after the `attempt`-th scroll.
    pub async fn wait(&self, session: &dyn BrowserSession, attempt: u32) {
        match self {
            Self::Fixed(_) | Self::Backoff { jitter: false, .. } => {
                sleep(self.base_delay(attempt)).await
            }
            Self::Backoff { jitter: true, .. } => {
                let base = self.base_delay(attempt);
                let extra_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64 / 2);
                sleep(base + Duration::from_millis(extra_ms)).await
            }
            Self::Readiness { poll, timeout } => {
                let started = Instant::now();
                loop {
                    sleep(*poll).await;
                    match session.ready_state().await {
                        Ok(state) if state == "complete" => break,
                        Ok(state) => debug!(target: "jobscout.wait", %state, "page still loading"),
                        Err(e) => {
                            debug!(target: "jobscout.wait", error = %e, "readyState unavailable");
                            break;
                        }
                    }
                    if started.elapsed() >= *timeout {
                        debug!(target: "jobscout.wait", "readiness wait timed out");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_from_config() {
        assert_eq!(
            WaitStrategy::from(&WaitConfig::default()),
            WaitStrategy::Fixed(Duration::from_secs(1))
        );
        assert_eq!(
            WaitStrategy::from(&WaitConfig::Readiness {
                poll_ms: 50,
                timeout_ms: 500
            }),
            WaitStrategy::Readiness {
                poll: Duration::from_millis(50),
                timeout: Duration::from_millis(500)
            }
        );
    }

    #[test]
    fn backoff_is_capped_for_large_attempts() {
        let s = WaitStrategy::Backoff {
            base: Duration::from_millis(250),
            max: Duration::from_secs(4),
            jitter: true,
        };
        assert_eq!(s.base_delay(40), Duration::from_secs(4));
    }
}
