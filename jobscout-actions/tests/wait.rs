mod common;

use common::FakeSession;
use jobscout_actions::wait::WaitStrategy;
use std::time::{Duration, Instant};

fn readiness(poll_ms: u64, timeout_ms: u64) -> WaitStrategy {
    WaitStrategy::Readiness {
        poll: Duration::from_millis(poll_ms),
        timeout: Duration::from_millis(timeout_ms),
    }
}

#[tokio::test]
async fn readiness_polls_until_complete() {
    let session = FakeSession::new().with_ready_states(&["loading", "interactive", "complete"]);
    readiness(5, 5_000).wait(&session, 1).await;
    assert_eq!(session.ready_calls(), 3);
}

#[tokio::test]
async fn readiness_gives_up_at_the_timeout() {
    let session = FakeSession::new().with_ready_states(&["loading"]);
    let started = Instant::now();
    readiness(5, 40).wait(&session, 1).await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(40), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
    assert!(session.ready_calls() >= 2);
}

#[tokio::test]
async fn readiness_stops_when_the_page_cannot_answer() {
    let session = FakeSession::new().with_failing_ready_state();
    readiness(5, 5_000).wait(&session, 1).await;
    assert_eq!(session.ready_calls(), 1);
}

#[tokio::test]
async fn jittered_backoff_stays_within_half_again_the_delay() {
    let session = FakeSession::new();
    let strategy = WaitStrategy::Backoff {
        base: Duration::from_millis(20),
        max: Duration::from_millis(20),
        jitter: true,
    };

    for attempt in [1, 5] {
        let started = Instant::now();
        strategy.wait(&session, attempt).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(20), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(1), "{elapsed:?}");
    }
    assert_eq!(session.ready_calls(), 0);
}
