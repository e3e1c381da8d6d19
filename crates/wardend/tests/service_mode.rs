//! End-to-end service-mode behaviour on a Unix host: a real signal winds the
//! heartbeat service down through the dispatch bridge, and teardown removes
//! the runtime artefacts.

#![cfg(unix)]

use std::fs;
use std::thread;
use std::time::Duration;

use nix::sys::signal::{Signal, raise};

use warden_config::{RuntimePaths, StopWaitPolicy, WorkerSettings};
use warden_control::ControlDispatchBridge;
use warden_control_types::AcceptedControls;
use wardend::{HeartbeatService, SignalHost};

#[test]
fn sigterm_stops_the_service_and_teardown_removes_artefacts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let paths = RuntimePaths::at(dir.path().join("state")).expect("paths should derive");
    let host = SignalHost::new(paths.clone());

    let hooks = HeartbeatService::new(
        WorkerSettings {
            heartbeat_interval_ms: 10_000,
            poll_interval_ms: 10,
        },
        StopWaitPolicy::Unbounded,
    );
    let bridge = ControlDispatchBridge::register(
        &host,
        "it-service",
        Box::new(hooks),
        AcceptedControls::default(),
        Duration::from_secs(30),
    )
    .expect("handshake should succeed");

    assert!(
        paths.pid_path("it-service").exists(),
        "registration should record the pid"
    );

    let signaller = thread::spawn(|| {
        // Give the dispatch loop time to start before delivering the stop.
        thread::sleep(Duration::from_millis(300));
        raise(Signal::SIGTERM).expect("raise should deliver");
    });

    bridge.run(&[]).expect("service should run to Stopped");
    signaller.join().expect("signaller should finish");

    // The final snapshot persists the Stopped state until teardown.
    let snapshot = fs::read_to_string(paths.status_path("it-service"))
        .expect("status snapshot should exist before teardown");
    let snapshot: serde_json::Value =
        serde_json::from_str(&snapshot).expect("snapshot should parse");
    assert_eq!(snapshot["status"]["state"], "stopped");

    host.teardown();
    assert!(!paths.pid_path("it-service").exists());
    assert!(!paths.status_path("it-service").exists());
}
