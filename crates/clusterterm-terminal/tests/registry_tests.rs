mod common;

use clusterterm_terminal::types::{SessionError, Target, TargetKind};
use clusterterm_terminal::{ConnectionState, SessionRegistry, TransportEvent};
use common::*;
use pretty_assertions::assert_eq;

fn open(registry: &mut SessionRegistry, connector: &mut FakeConnector, target: Target) -> Result<(), SessionError> {
    let mut surface = FakeSurface::new();
    let (emulator, _screen) = FakeEmulator::new(Some(dims(24, 80)));
    registry
        .open(target, endpoint(), connector, emulator, &mut surface)
        .map(|_| ())
}

#[test]
fn test_second_live_session_for_target_is_rejected() {
    let mut registry = SessionRegistry::default();
    let mut connector = FakeConnector::new();
    open(&mut registry, &mut connector, task("42")).unwrap();

    let mut surface = FakeSurface::new();
    let (emulator, screen) = FakeEmulator::new(Some(dims(24, 80)));
    let result = registry.open(task("42"), endpoint(), &mut connector, emulator, &mut surface);

    assert_eq!(result.err(), Some(SessionError::TargetBusy("task/42".to_string())));
    assert_eq!(screen.borrow().disposed, 1);
    assert_eq!(surface.listeners.borrow().attached.len(), 0);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_same_id_different_kind_is_a_different_target() {
    let mut registry = SessionRegistry::default();
    let mut connector = FakeConnector::new();
    open(&mut registry, &mut connector, task("42")).unwrap();
    open(
        &mut registry,
        &mut connector,
        Target::new(TargetKind::Container, "42").unwrap(),
    )
    .unwrap();
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_finished_session_can_be_reopened() {
    let mut registry = SessionRegistry::default();
    let mut connector = FakeConnector::new();
    open(&mut registry, &mut connector, task("42")).unwrap();

    let session = registry.get_mut(&task("42")).unwrap();
    session.handle_transport(TransportEvent::Opened);
    session.handle_transport(TransportEvent::Closed {
        code: 1006,
        reason: String::new(),
    });
    assert_eq!(session.state(), ConnectionState::Failed);

    open(&mut registry, &mut connector, task("42")).unwrap();
    assert_eq!(
        registry.get(&task("42")).map(|s| s.state()),
        Some(ConnectionState::Connecting)
    );
    assert_eq!(connector.wire.borrow().opened_urls.len(), 2);
}

#[test]
fn test_close_removes_and_releases() {
    let mut registry = SessionRegistry::default();
    let mut connector = FakeConnector::new();
    open(&mut registry, &mut connector, task("42")).unwrap();

    assert!(registry.close(&task("42")));
    assert!(!registry.close(&task("42")));
    assert!(registry.is_empty());
    assert_eq!(connector.wire.borrow().closes.len(), 1);
}

#[test]
fn test_session_cap_counts_only_live_sessions() {
    let mut registry = SessionRegistry::new(2);
    let mut connector = FakeConnector::new();
    open(&mut registry, &mut connector, task("1")).unwrap();
    open(&mut registry, &mut connector, task("2")).unwrap();
    assert_eq!(
        open(&mut registry, &mut connector, task("3")),
        Err(SessionError::TooManySessions(2))
    );

    registry
        .get_mut(&task("1"))
        .unwrap()
        .handle_transport(TransportEvent::Error("gone".to_string()));
    open(&mut registry, &mut connector, task("3")).unwrap();
    assert_eq!(registry.len(), 2);
    assert!(registry.get(&task("1")).is_none());
}

#[test]
fn test_prune_reports_released_targets() {
    let mut registry = SessionRegistry::new(3);
    let mut connector = FakeConnector::new();
    for id in ["1", "2", "3"] {
        open(&mut registry, &mut connector, task(id)).unwrap();
    }
    assert!(registry.is_full());
    registry
        .get_mut(&task("2"))
        .unwrap()
        .handle_transport(TransportEvent::Error("gone".to_string()));

    assert_eq!(registry.prune(), vec![task("2")]);
    assert!(!registry.is_full());
    assert_eq!(registry.len(), 2);
    assert!(registry.prune().is_empty());
}
