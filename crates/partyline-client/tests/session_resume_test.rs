//! Session persistence across client restarts.
//!
//! A fresh client over the same storage medium must transparently resume
//! room membership; a persisted record for a room that no longer exists must
//! be cleared by the failed rejoin.

use std::{sync::Arc, time::Duration};

use partyline_client::{RoomClient, RoomSnapshot};
use partyline_core::{
    controller::RoomPhase,
    session::Session,
    storage::{MemoryMedium, SessionStore},
};
use partyline_harness::{SimBackend, SimTransport};
use tokio::sync::watch;

fn new_client(backend: &SimBackend, medium: MemoryMedium) -> RoomClient {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let transport = Arc::new(SimTransport::new(backend.clone()));
    RoomClient::start(transport, SessionStore::new(medium))
}

async fn wait_for(
    snapshots: &mut watch::Receiver<RoomSnapshot>,
    what: &str,
    predicate: impl Fn(&RoomSnapshot) -> bool,
) -> RoomSnapshot {
    let outcome = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let snapshot = snapshots.borrow_and_update();
                if predicate(&snapshot) {
                    return snapshot.clone();
                }
            }
            snapshots.changed().await.expect("client stopped");
        }
    })
    .await;
    match outcome {
        Ok(snapshot) => snapshot,
        Err(_) => panic!("timed out waiting for: {what}"),
    }
}

#[tokio::test]
async fn restart_resumes_the_persisted_session() {
    let backend = SimBackend::new();
    let medium = MemoryMedium::new();

    let first = new_client(&backend, medium.clone());
    let mut snapshots = first.snapshots();
    wait_for(&mut snapshots, "connected", |s| s.connected).await;
    let room_id = first.create_room("ada", Some("owl".to_string())).await.unwrap();
    first.send_message("remember me");
    wait_for(&mut snapshots, "message delivered", |s| {
        s.messages.iter().any(|m| m.body == "remember me")
    })
    .await;

    // Shutting down is not leaving: the session record stays behind.
    first.shutdown().await;
    assert!(SessionStore::new(medium.clone()).load().is_some());

    // A fresh client over the same medium rejoins on its own.
    let second = new_client(&backend, medium);
    let mut snapshots = second.snapshots();
    let snapshot =
        wait_for(&mut snapshots, "membership resumed", |s| s.phase == RoomPhase::InRoom).await;

    let session = snapshot.session.expect("resumed session");
    assert_eq!(session.room_id, room_id);
    assert_eq!(session.nickname, "ada");
    assert_eq!(session.user_icon.as_deref(), Some("owl"));

    // The log came from the server history, the pre-restart message in it.
    assert!(snapshot.messages.iter().any(|m| m.body == "remember me"));
    assert_eq!(backend.join_count(), 1);

    second.shutdown().await;
}

#[tokio::test]
async fn failed_rejoin_clears_the_stale_session() {
    let backend = SimBackend::new();
    let medium = MemoryMedium::new();

    // A record for a room this backend has never heard of.
    SessionStore::new(medium.clone()).save(&Session {
        room_id: "room-gone".to_string(),
        nickname: "ada".to_string(),
        user_icon: None,
    });

    let client = new_client(&backend, medium.clone());
    let mut snapshots = client.snapshots();

    let snapshot = wait_for(&mut snapshots, "stale session dropped", |s| {
        s.connected && s.phase == RoomPhase::NoSession
    })
    .await;
    assert!(snapshot.session.is_none());
    assert_eq!(SessionStore::new(medium).load(), None);

    client.shutdown().await;
}
