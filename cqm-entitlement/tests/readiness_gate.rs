//! Readiness Gate Tests
//!
//! Covers the chain from the platform runtime's readiness signal to the
//! entitlement-ready signal, and listener delivery semantics.

use cqm_entitlement::test_utils::MockNativeBridge;
use cqm_entitlement::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::unbounded_channel;

const WAIT: Duration = Duration::from_secs(1);

#[tokio::test]
async fn test_listeners_registered_before_ready_run_in_order() {
    let signals = SignalRegistry::new(Handle::current());
    let entitlement = Entitlement::new(MockNativeBridge::new(), &signals);
    let order = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, mut done_rx) = unbounded_channel();

    for label in ["first", "second"] {
        let order = order.clone();
        let done = done_tx.clone();
        entitlement.on_ready(move || {
            order.lock().unwrap().push(label);
            done.send(()).unwrap();
        });
    }

    assert!(!entitlement.is_ready());
    signals
        .get(PLATFORM_READY_SIGNAL)
        .expect("platform signal registered")
        .fire();

    for _ in 0..2 {
        tokio::time::timeout(WAIT, done_rx.recv()).await.unwrap();
    }
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(entitlement.gate_state(), GateState::Ready);
}

#[tokio::test]
async fn test_listener_registered_after_ready_runs_once() {
    let signals = SignalRegistry::new(Handle::current());
    let entitlement = Entitlement::new(MockNativeBridge::new(), &signals);
    entitlement.platform_ready().fire();
    tokio::time::timeout(WAIT, entitlement.ready()).await.unwrap();

    let hits = Arc::new(AtomicU32::new(0));
    let (done_tx, mut done_rx) = unbounded_channel();
    let counter = hits.clone();
    entitlement.on_ready(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        done_tx.send(()).unwrap();
    });

    tokio::time::timeout(WAIT, done_rx.recv()).await.unwrap();

    // Firing again changes nothing.
    assert!(!entitlement.platform_ready().fire());
    assert!(!entitlement.entitlement_ready().fire());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_host_startup_waits_on_entitlement_signal() {
    let signals = SignalRegistry::new(Handle::current());
    let _entitlement = Entitlement::new(MockNativeBridge::new(), &signals);

    assert_eq!(
        signals.pending_initialization(),
        vec![ENTITLEMENT_READY_SIGNAL]
    );
    assert!(
        tokio::time::timeout(Duration::from_millis(30), signals.initialized())
            .await
            .is_err(),
        "startup must not complete before the platform is ready"
    );

    signals.create_sticky(PLATFORM_READY_SIGNAL).fire();
    tokio::time::timeout(WAIT, signals.initialized())
        .await
        .expect("startup completes once entitlements are ready");
}

#[tokio::test]
async fn test_platform_ready_before_facade_still_chains() {
    let signals = SignalRegistry::new(Handle::current());
    signals.create_sticky(PLATFORM_READY_SIGNAL).fire();

    let entitlement = Entitlement::new(MockNativeBridge::new(), &signals);
    tokio::time::timeout(WAIT, entitlement.ready())
        .await
        .expect("late facade sees the sticky platform signal");
}

#[tokio::test]
async fn test_custom_signal_names() {
    let signals = SignalRegistry::new(Handle::current());
    let config = EntitlementConfig::from_json(
        r#"{"platform_ready_signal":"onDeviceReady","entitlement_ready_signal":"onStoreReady"}"#,
    )
    .unwrap();
    let entitlement = Entitlement::with_config(MockNativeBridge::new(), &signals, config);

    assert_eq!(entitlement.platform_ready().name(), "onDeviceReady");
    signals.get("onDeviceReady").unwrap().fire();
    tokio::time::timeout(WAIT, signals.get("onStoreReady").unwrap().wait())
        .await
        .unwrap();
    assert!(signals.get(PLATFORM_READY_SIGNAL).is_none());
}
