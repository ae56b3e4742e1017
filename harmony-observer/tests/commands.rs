mod support;

use harmony_client::Method;
use harmony_core::domain::job::{JobCommand, JobState, Limit};
use harmony_observer::CommandError;
use serde_json::json;
use support::{FakeServer, config, observer_for};

#[tokio::test]
async fn non_positive_limits_are_rejected_without_a_request() {
    let server = FakeServer::new();
    let observer = observer_for(&server, config());
    let commands = observer.commands();

    for limit in [0, -5] {
        let err = commands.set_limit(limit).await.unwrap_err();
        assert!(err.is_validation(), "{limit} should fail validation");
    }
    assert_eq!(server.request_count(), 0);
}

#[tokio::test]
async fn set_limit_issues_exactly_one_put() {
    let server = FakeServer::new();
    let observer = observer_for(&server, config());

    observer.commands().set_limit(50).await.unwrap();

    let requests = server.requests_to("limit");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Put);
    assert_eq!(requests[0].body, Some(json!({ "limit": 50 })));
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn start_and_stop_send_bodyless_puts() {
    let server = FakeServer::new();
    let observer = observer_for(&server, config());
    let commands = observer.commands();

    commands.start().await.unwrap();
    commands.stop().await.unwrap();

    for endpoint in ["start", "stop"] {
        let requests = server.requests_to(endpoint);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].body, None);
    }
}

#[tokio::test]
async fn transport_failures_reach_the_caller() {
    let server = FakeServer::new();
    server.fail("start", true);
    let observer = observer_for(&server, config());

    let err = observer.commands().start().await.unwrap_err();
    match err {
        CommandError::Transport { command, source } => {
            assert_eq!(command, "start");
            assert!(source.is_server_error());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn commands_never_touch_observed_state() {
    let server = FakeServer::new();
    let observer = observer_for(&server, config());
    let before = observer.snapshot();

    observer.commands().start().await.unwrap();
    observer
        .commands()
        .issue(JobCommand::SetLimit(Limit::new(10).unwrap()))
        .await
        .unwrap();

    assert_eq!(observer.snapshot(), before);
    assert_eq!(observer.state(), JobState::Unknown);
}

#[tokio::test]
async fn dispatched_commands_resolve_in_background() {
    let server = FakeServer::new();
    let observer = observer_for(&server, config());

    let handle = observer.commands().dispatch(JobCommand::Stop);
    handle.await.unwrap().unwrap();
    assert_eq!(server.requests_to("stop").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_stop_does_not_count_as_stopped() {
    let server = FakeServer::new();
    server.set_stage(1);
    let mut observer = observer_for(&server, config());
    let commands = observer.commands();
    commands.start().await.unwrap();
    observer.start_observing();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert_eq!(observer.state(), JobState::Running);

    server.fail("stop", true);
    assert!(commands.stop().await.is_err());

    // The job falls back to not-started on its own; no stop was accepted
    server.set_stage(0);
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    assert_eq!(observer.state(), JobState::Idle);
}

#[tokio::test(start_paused = true)]
async fn accepted_stop_survives_an_earlier_failed_stop() {
    let server = FakeServer::new();
    let mut observer = observer_for(&server, config());
    let commands = observer.commands();
    commands.start().await.unwrap();
    observer.start_observing();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert_eq!(observer.state(), JobState::Running);

    // The first stop is slow and fails; the second goes out meanwhile and is accepted
    server.fail_next("stop", std::time::Duration::from_millis(100));
    let first = commands.dispatch(JobCommand::Stop);
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    commands.stop().await.unwrap();

    assert!(first.await.unwrap().is_err());
    assert_eq!(server.requests_to("stop").len(), 2);

    tokio::time::sleep(std::time::Duration::from_millis(600)).await;
    assert_eq!(observer.state(), JobState::Stopped);
}
