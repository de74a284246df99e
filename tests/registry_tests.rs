// Integration tests for the session registry and the shutdown sweep.

mod common;

use common::MockConnector;
use live_interview::{CompletionReason, SessionError, SessionRegistry, Stage};
use std::time::Duration;
use tokio::time;

#[tokio::test(start_paused = true)]
async fn duplicate_session_ids_are_rejected() {
    let registry = SessionRegistry::new();

    let (connector, _engine) = MockConnector::new();
    registry
        .create(common::test_config("dup", 900), connector)
        .await
        .unwrap();

    let (connector, _engine) = MockConnector::new();
    let err = registry
        .create(common::test_config("dup", 900), connector)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::DuplicateSession(_)));
    assert_eq!(registry.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn get_unknown_session_is_not_found() {
    let registry = SessionRegistry::new();
    let err = registry.get("missing").await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn removing_a_live_session_is_rejected() {
    let registry = SessionRegistry::new();
    let (connector, engine) = MockConnector::new();
    let session = registry
        .create(common::test_config("live", 900), connector)
        .await
        .unwrap();
    session.start().await.unwrap();

    let err = registry.remove("live").await.unwrap_err();
    assert!(matches!(err, SessionError::SessionLive(_)));

    engine.turn_complete().await;
    session.end().await;
    time::timeout(Duration::from_secs(3600), session.wait_completed())
        .await
        .unwrap();

    registry.remove("live").await.unwrap();
    assert!(matches!(
        registry.get("live").await.unwrap_err(),
        SessionError::NotFound(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn shutdown_sweep_completes_every_live_session() {
    let registry = SessionRegistry::new();

    let (connector_a, engine_a) = MockConnector::new();
    let a = registry
        .create(common::test_config("shutdown-a", 900), connector_a)
        .await
        .unwrap();
    a.start().await.unwrap();
    engine_a.turn_complete().await;

    let (connector_b, _engine_b) = MockConnector::new();
    let b = registry
        .create(common::test_config("shutdown-b", 600), connector_b)
        .await
        .unwrap();
    b.start().await.unwrap();

    // A session that was registered but never started must not stall
    // the sweep.
    let (connector_c, _engine_c) = MockConnector::new();
    let c = registry
        .create(common::test_config("shutdown-c", 600), connector_c)
        .await
        .unwrap();

    registry.shutdown_all(Duration::from_secs(30)).await;

    for session in [&a, &b, &c] {
        assert_eq!(
            session.stage().await,
            Stage::Completed(CompletionReason::Shutdown),
            "session {} not swept",
            session.id()
        );
    }

    // Each started session got the best-effort standard closing.
    let scripts = a.config().scripts.clone();
    assert!(engine_a.sent_texts().await.contains(&scripts.standard_closing));
}

#[tokio::test(start_paused = true)]
async fn shutdown_sweep_closes_outbound_subscriptions() {
    let registry = SessionRegistry::new();
    let (connector, engine) = MockConnector::new();
    let session = registry
        .create(common::test_config("shutdown-ws", 900), connector)
        .await
        .unwrap();
    session.start().await.unwrap();
    engine.turn_complete().await;

    let mut events = session.subscribe().await;
    registry.shutdown_all(Duration::from_secs(30)).await;

    // A socket forwarding loop parked on this stream must unblock once
    // the sweep completes the session, so a server drain never waits on
    // a session that will only end at shutdown.
    let closed = time::timeout(Duration::from_secs(3600), async {
        loop {
            match events.recv().await {
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return true,
            }
        }
    })
    .await
    .expect("subscription never closed after the sweep");
    assert!(closed);
    assert_eq!(
        session.stage().await,
        Stage::Completed(CompletionReason::Shutdown)
    );
}
