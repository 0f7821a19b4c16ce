//! Managed Process Lifecycle Tests
//!
//! not started -> running/waiting -> torn down, through the Connector port.

#![cfg(unix)]

use std::time::Duration;

use tether_core::domain::{SetupSpec, SpawnOptions};
use tether_core::{Connector, ConnectorError};
use tether_infra_local::LocalConnector;
use tokio::time::timeout;

const GUARD: Duration = Duration::from_secs(5);

/// Lifecycle 1: setup resolves once READY is printed
#[tokio::test]
async fn test_setup_waits_for_token() {
    let connector = LocalConnector::new();
    let spec = SetupSpec::new("printf 'READY\\n'; sleep 30").wait_for("READY");

    let mut process = timeout(GUARD, connector.setup(&spec))
        .await
        .expect("setup never resolved")
        .unwrap()
        .expect("command given, handle expected");

    assert!(process.is_ready());
    let pid = process.pid().unwrap();
    assert!(connector.is_alive(pid));

    connector.tear_down(Some(&mut process)).await;
    assert!(!connector.is_alive(pid));
}

/// Lifecycle 2: error output before the token fails setup for good
#[tokio::test]
async fn test_setup_fails_on_early_stderr() {
    let connector = LocalConnector::new();
    let spec = SetupSpec::new("echo 'port in use' >&2; sleep 0.2; echo READY; sleep 30")
        .wait_for("READY");

    let result = timeout(GUARD, connector.setup(&spec))
        .await
        .expect("setup never resolved");

    match result {
        Err(ConnectorError::ReadinessFailed(msg)) => assert!(msg.contains("port in use")),
        other => panic!("expected readiness failure, got {:?}", other.map(|p| p.is_some())),
    }
}

/// Lifecycle 3: without wait_for, setup resolves at spawn
#[tokio::test]
async fn test_setup_without_token_resolves_at_spawn() {
    let connector = LocalConnector::new();
    let spec = SetupSpec::new("sleep 30");

    let mut process = timeout(Duration::from_secs(1), connector.setup(&spec))
        .await
        .expect("setup should not wait")
        .unwrap()
        .unwrap();

    assert!(process.is_live());
    connector.tear_down(Some(&mut process)).await;
}

/// Lifecycle 4: teardown is guarded by liveness and runs at most once
#[tokio::test]
async fn test_tear_down_twice_is_noop() {
    let connector = LocalConnector::new();
    let mut process = connector
        .setup(&SetupSpec::new("sleep 30"))
        .await
        .unwrap()
        .unwrap();

    connector.tear_down(Some(&mut process)).await;
    assert!(!process.is_live());

    connector.tear_down(Some(&mut process)).await;
    connector.tear_down(None).await;
    assert!(!process.is_live());
}

/// Lifecycle 5: the interrupt byte reaches stdin before the kill
#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_interrupt_byte_written_to_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let mut connector = LocalConnector::new();
    connector.set_cwd(dir.path().display().to_string());

    // The reader runs in its own session so the group kill cannot cut it off
    let spec = SetupSpec::new(
        "echo READY; setsid sh -c 'head -c 1 > interrupt.part && mv interrupt.part interrupt.bin'",
    )
    .wait_for("READY");
    let mut process = timeout(GUARD, connector.setup(&spec))
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    connector.tear_down(Some(&mut process)).await;

    let written = dir.path().join("interrupt.bin");
    let deadline = std::time::Instant::now() + GUARD;
    while !written.exists() && std::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(std::fs::read(&written).unwrap(), [0x03]);
}

/// Start through the port, give up on readiness, tear down
async fn abandon_before_ready<C: Connector>(connector: &C, spec: &SetupSpec) -> C::Process {
    let mut process = connector
        .start(spec)
        .await
        .unwrap()
        .expect("command given, handle expected");

    let pending = timeout(Duration::from_millis(200), connector.wait_ready(&mut process)).await;
    assert!(pending.is_err(), "token never printed, wait must still be pending");

    connector.tear_down(Some(&mut process)).await;
    process
}

/// Lifecycle 6: teardown works while readiness is still pending
#[tokio::test]
async fn test_tear_down_before_ready() {
    let connector = LocalConnector::new();
    let spec = SetupSpec::new("sleep 30").wait_for("NEVER");

    let mut process = abandon_before_ready(&connector, &spec).await;
    let pid = process.pid().unwrap();

    assert!(!process.is_live());
    assert!(!connector.is_alive(pid));
    assert!(matches!(
        connector.wait_ready(&mut process).await,
        Err(ConnectorError::ReadinessFailed(_))
    ));
}

/// Lifecycle 7: spawn returns at once, errors arrive on their own channel
#[tokio::test]
async fn test_spawn_reports_errors_after_return() {
    let connector = LocalConnector::new();

    let mut spawned = timeout(
        Duration::from_millis(500),
        connector.spawn("sleep 0.2; echo 'late' >&2", SpawnOptions::default()),
    )
    .await
    .expect("spawn must not wait for the process")
    .unwrap();

    assert!(spawned.pid().is_some());

    let error = timeout(GUARD, spawned.next_error()).await.unwrap();
    assert_eq!(error.as_deref(), Some("late\n"));
}

/// Lifecycle 8: spawn forces the connector's working directory
#[tokio::test]
async fn test_spawn_uses_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut connector = LocalConnector::new();
    connector.set_cwd(dir.path().display().to_string());

    let mut spawned = connector
        .spawn("touch spawned.txt; echo done >&2", SpawnOptions::default())
        .await
        .unwrap();

    timeout(GUARD, spawned.next_error()).await.unwrap();
    assert!(connector.path_exists("spawned.txt").await);
}
