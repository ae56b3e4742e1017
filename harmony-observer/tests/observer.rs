mod support;

use harmony_core::domain::job::JobState;
use harmony_observer::Backoff;
use std::time::Duration;
use support::{FakeServer, config, observer_for};
use tokio::time::sleep;

const TICK: Duration = Duration::from_millis(250);
const SETTLE: Duration = Duration::from_millis(10);

#[tokio::test(start_paused = true)]
async fn stage_sequence_drives_lifecycle() {
    let server = FakeServer::new();
    server.script_stages([0, 1, 1, 2]);
    server.set_progress(100);
    let mut observer = observer_for(&server, config());
    assert_eq!(observer.state(), JobState::Unknown);

    observer.start_observing();
    let mut states = Vec::new();
    sleep(SETTLE).await;
    states.push(observer.state());
    for _ in 0..3 {
        sleep(TICK).await;
        states.push(observer.state());
    }

    assert_eq!(
        states,
        vec![
            JobState::Idle,
            JobState::Running,
            JobState::Running,
            JobState::Complete
        ]
    );
    assert!(observer.snapshot().diagnostics.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_after_running_ends_stopped_not_idle() {
    let server = FakeServer::new();
    let mut observer = observer_for(&server, config());
    let commands = observer.commands();
    observer.start_observing();

    commands.start().await.unwrap();
    sleep(TICK + SETTLE).await;
    assert_eq!(observer.state(), JobState::Running);

    commands.stop().await.unwrap();
    sleep(TICK).await;
    assert_eq!(observer.state(), JobState::Stopped);
    assert!(observer.snapshot().diagnostics.is_empty());
}

#[tokio::test(start_paused = true)]
async fn regression_without_stop_is_idle_with_diagnostic() {
    let server = FakeServer::new();
    server.script_stages([1, 0]);
    let mut observer = observer_for(&server, config());
    observer.start_observing();

    sleep(TICK + SETTLE).await;
    let snapshot = observer.snapshot();
    assert_eq!(snapshot.state, JobState::Idle);
    assert_eq!(
        snapshot.diagnostics,
        vec![harmony_core::domain::observation::Diagnostic::StageRegressed { from: 1, to: 0 }]
    );
}

#[tokio::test(start_paused = true)]
async fn failing_stage_stream_goes_unknown_while_progress_updates() {
    let server = FakeServer::new();
    server.set_stage(1);
    server.set_progress(10);
    let mut observer = observer_for(&server, config());
    observer.start_observing();

    sleep(SETTLE).await;
    assert_eq!(observer.state(), JobState::Running);

    server.fail("stage", true);
    server.set_progress(20);
    // Stage ticks at 250, 500, 750 and 1000 fail; the last success is at 0
    sleep(TICK * 4).await;

    let snapshot = observer.snapshot();
    assert_eq!(snapshot.state, JobState::Unknown);
    assert!(snapshot.failures.stage.consecutive_failures >= 3);
    assert_eq!(snapshot.failures.progress.consecutive_failures, 0);
    assert_eq!(snapshot.observation.progress(), Some(20));
    assert_eq!(snapshot.observation.stage(), Some(1));

    // Recovers on the next successful stage poll
    server.fail("stage", false);
    sleep(TICK).await;
    let snapshot = observer.snapshot();
    assert_eq!(snapshot.state, JobState::Running);
    assert_eq!(snapshot.failures.stage.consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn slow_server_never_sees_more_than_one_request_per_stream() {
    let server = FakeServer::new();
    server.set_stage(1);
    server.delay("stage", Duration::from_millis(1100));
    server.delay("pog", Duration::from_millis(600));
    let mut observer = observer_for(&server, config());
    observer.start_observing();

    sleep(Duration::from_secs(5)).await;
    observer.stop_observing();

    assert_eq!(server.max_in_flight("stage"), 1);
    assert_eq!(server.max_in_flight("pog"), 1);

    let snapshot = observer.snapshot();
    assert!(snapshot.failures.stage.skipped_ticks > 0);
    assert!(snapshot.failures.progress.skipped_ticks > 0);
    // Unthrottled, a 250ms tick would have issued 21 stage requests in 5s
    assert!(server.requests_to("stage").len() <= 5);
    assert_eq!(snapshot.observation.stage(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn stopping_discards_in_flight_responses() {
    let server = FakeServer::new();
    server.set_stage(1);
    server.set_progress(50);
    server.delay("stage", Duration::from_secs(1));
    server.delay("pog", Duration::from_secs(1));
    let mut observer = observer_for(&server, config());
    observer.start_observing();

    sleep(Duration::from_millis(100)).await;
    assert_eq!(server.request_count(), 2);
    observer.stop_observing();
    assert!(!observer.is_observing());

    sleep(Duration::from_secs(3)).await;
    let snapshot = observer.snapshot();
    assert_eq!(snapshot.observation.stage, None);
    assert_eq!(snapshot.observation.progress, None);
    assert_eq!(server.request_count(), 2);
    assert_eq!(server.max_in_flight("stage"), 1);
}

#[tokio::test(start_paused = true)]
async fn observation_can_restart_after_stop() {
    let server = FakeServer::new();
    server.set_stage(1);
    let mut observer = observer_for(&server, config());

    observer.start_observing();
    observer.start_observing();
    sleep(SETTLE).await;
    assert_eq!(observer.state(), JobState::Running);
    observer.stop_observing();

    server.set_stage(2);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(observer.snapshot().observation.stage(), Some(1));

    observer.start_observing();
    sleep(SETTLE).await;
    assert_eq!(observer.state(), JobState::Complete);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_observer_stops_polling() {
    let server = FakeServer::new();
    let mut observer = observer_for(&server, config());
    observer.start_observing();
    sleep(SETTLE).await;

    drop(observer);
    let seen = server.request_count();
    sleep(Duration::from_secs(2)).await;
    assert_eq!(server.request_count(), seen);
}

#[tokio::test(start_paused = true)]
async fn subscribers_receive_state_changes() {
    let server = FakeServer::new();
    server.set_stage(1);
    let mut observer = observer_for(&server, config());
    let mut updates = observer.subscribe();
    observer.start_observing();

    loop {
        updates.changed().await.unwrap();
        if updates.borrow().state == JobState::Running {
            break;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn request_timeout_frees_the_slot() {
    let server = FakeServer::new();
    server.delay("stage", Duration::from_secs(60));
    let mut cfg = config();
    cfg.request_timeout = Some(Duration::from_millis(300));
    let mut observer = observer_for(&server, cfg);
    observer.start_observing();

    // Requests at 0 and 500 time out at 300 and 800
    sleep(Duration::from_millis(900)).await;
    let snapshot = observer.snapshot();
    assert_eq!(snapshot.failures.stage.total_failures, 2);
    assert_eq!(server.requests_to("stage").len(), 2);
    assert_eq!(server.max_in_flight("stage"), 1);
}

#[tokio::test(start_paused = true)]
async fn backoff_spaces_out_failing_requests() {
    let server = FakeServer::new();
    server.fail("stage", true);
    let mut cfg = config();
    cfg.backoff = Some(Backoff {
        initial: Duration::from_secs(1),
        max: Duration::from_secs(4),
    });
    let mut observer = observer_for(&server, cfg);
    observer.start_observing();

    // Failures at 0 (+1s), 1000 (+2s), 3000
    sleep(Duration::from_millis(3010)).await;
    assert_eq!(server.requests_to("stage").len(), 3);
    assert_eq!(observer.snapshot().failures.stage.consecutive_failures, 3);
    // Progress is unaffected by the stage stream's backoff
    assert!(server.requests_to("pog").len() >= 12);
}
