//! Integration Tests: companion sync between host and a paired display
//!
//! These tests verify:
//! 1. Network switch re-renders the companion without an empty state in between
//! 2. Identical publishes reach companions once
//! 3. Companion state survives restart and suppresses the wake offer
//! 4. Wake from an empty companion makes the host republish

use marlin_bridge::companion::state::OPEN_APP_PATH;
use marlin_bridge::companion::{FileStateStore, StateStore};
use marlin_bridge::config::BridgeConfig;
use marlin_bridge::{
    CompanionPublisher, CompanionReceiver, CompanionView, LocalSyncTransport, Network, PublishOutcome,
};
use std::sync::Arc;
use tempfile::TempDir;

fn config(dir: &TempDir) -> BridgeConfig {
    BridgeConfig::new(Network::Mainnet).with_app("companion-test").with_data_dir(dir.path())
}

fn open_receiver(config: &BridgeConfig, transport: &LocalSyncTransport) -> CompanionReceiver {
    let store = Arc::new(FileStateStore::new(config.companion_state_path()));
    CompanionReceiver::open(store, Arc::new(transport.pair())).expect("open receiver")
}

/// Test: ecash → ectest switch is observed as two full views
#[tokio::test]
async fn network_switch_never_shows_empty_view() {
    let dir = TempDir::new().expect("tempdir");
    let config = config(&dir);
    let transport = Arc::new(LocalSyncTransport::new());
    let mut publisher = CompanionPublisher::new(transport.clone());

    let receiver = open_receiver(&config, &transport);
    let mut views = receiver.subscribe();
    let context = transport.pair().context;
    let companion = tokio::spawn(receiver.run(context));

    let address = "qpm2qsznhks23z7629mms6s4cwef74vcwva87rkuu2";
    assert_eq!(publisher.publish(&format!("ecash:{address}"), "ecash:"), PublishOutcome::Published);
    views.changed().await.expect("first view");
    let first = views.borrow_and_update().clone();
    assert_eq!(
        first,
        CompanionView::Payment { address: format!("ecash:{address}"), payment_uri: format!("ecash:{address}") }
    );

    assert_eq!(publisher.publish(&format!("ectest:{address}"), "ectest:"), PublishOutcome::Published);
    views.changed().await.expect("second view");
    let second = views.borrow_and_update().clone();
    assert_ne!(second, CompanionView::OpenOnPhone);
    assert_eq!(
        second,
        CompanionView::Payment { address: format!("ectest:{address}"), payment_uri: format!("ectest:{address}") }
    );

    drop(publisher);
    drop(transport);
    companion.await.expect("companion loop ends with the host");

    let stored = FileStateStore::new(config.companion_state_path()).load().expect("load").expect("state");
    assert_eq!(stored.uri_prefix, "ectest:");
}

/// Test: publishing the same state twice changes the companion context once
#[tokio::test]
async fn identical_publish_is_sent_once() {
    let transport = Arc::new(LocalSyncTransport::new());
    let mut publisher = CompanionPublisher::new(transport.clone());
    let mut observer = transport.pair().context;
    observer.borrow_and_update();

    assert_eq!(publisher.publish("ecash:qxyz", "ecash:"), PublishOutcome::Published);
    assert_eq!(publisher.publish("ecash:qxyz", "ecash:"), PublishOutcome::Unchanged);

    assert!(observer.has_changed().expect("host alive"));
    observer.borrow_and_update();
    assert!(!observer.has_changed().expect("host alive"));
}

/// Test: restart restores the last state and skips the wake offer
#[tokio::test]
async fn restart_restores_state() {
    let dir = TempDir::new().expect("tempdir");
    let config = config(&dir);
    let transport = LocalSyncTransport::new();

    let mut receiver = open_receiver(&config, &transport);
    let payload = marlin_bridge::CompanionState::new("ecash:qxyz", "ecash:").to_payload();
    receiver.apply(&payload);
    drop(receiver);

    let restarted = open_receiver(&config, &transport);
    assert_eq!(restarted.payment_uri().as_deref(), Some("ecash:qxyz"));
    assert_eq!(restarted.request_wake(), None);
}

/// Test: an empty companion wakes the host, which republishes its last state
#[tokio::test]
async fn wake_triggers_republish() {
    let dir = TempDir::new().expect("tempdir");
    let config = config(&dir);
    let transport = Arc::new(LocalSyncTransport::new());
    let mut wakes = transport.wake_requests();
    let mut publisher = CompanionPublisher::new(transport.clone());
    publisher.publish("ecash:qxyz", "ecash:");

    // Fresh companion that has not read the retained context yet.
    let mut receiver = CompanionReceiver::open(
        Arc::new(FileStateStore::new(config.companion_state_path())),
        Arc::new(transport.pair()),
    )
    .expect("open receiver");
    assert_eq!(receiver.view(), CompanionView::OpenOnPhone);
    assert_eq!(receiver.request_wake(), Some(1));

    let request = wakes.recv().await.expect("wake request");
    assert_eq!(request.path, OPEN_APP_PATH);
    assert_eq!(publisher.on_wake(), Some(PublishOutcome::Published));

    let mut context = transport.pair().context;
    let payload = context.borrow_and_update().clone().expect("context");
    receiver.apply(&payload);
    assert_eq!(receiver.payment_uri().as_deref(), Some("ecash:qxyz"));
}
