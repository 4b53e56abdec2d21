//! Client Integration Tests
//!
//! Drives `EntitlementClient` through the FFI surface the way a Swift or
//! Kotlin host would: a host-side invoker receives each request and answers
//! through its `NativeCompletion`.

use cqm_entitlement_mobile::*;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(1);
const QUIET: Duration = Duration::from_millis(50);

// ============================================================================
// Test Infrastructure
// ============================================================================

/// How the simulated host answers.
#[derive(Clone)]
enum HostAnswer {
    Succeed(String),
    Fail(Option<i32>),
    Hold,
}

#[derive(Debug, Clone, PartialEq)]
struct RecordedInvoke {
    service: String,
    action: String,
    args_json: String,
}

#[derive(Clone)]
struct HostState {
    answer: HostAnswer,
    invokes: Arc<Mutex<Vec<RecordedInvoke>>>,
    held: Arc<Mutex<Vec<Arc<NativeCompletion>>>>,
}

impl HostState {
    fn new(answer: HostAnswer) -> Self {
        Self {
            answer,
            invokes: Arc::new(Mutex::new(Vec::new())),
            held: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn invokes(&self) -> Vec<RecordedInvoke> {
        self.invokes.lock().unwrap().clone()
    }
}

/// Simulated StoreKit/Billing invoker. Answers from another thread, as a
/// real store queue would.
struct HostInvoker(HostState);

impl NativeInvokerFFI for HostInvoker {
    fn invoke(
        &self,
        service: String,
        action: String,
        args_json: String,
        completion: Arc<NativeCompletion>,
    ) {
        self.0.invokes.lock().unwrap().push(RecordedInvoke {
            service,
            action,
            args_json,
        });
        match self.0.answer.clone() {
            HostAnswer::Succeed(json) => {
                std::thread::spawn(move || {
                    completion.succeed(json).unwrap();
                });
            }
            HostAnswer::Fail(code) => {
                std::thread::spawn(move || {
                    completion.fail(code);
                });
            }
            HostAnswer::Hold => self.0.held.lock().unwrap().push(completion),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Outcome {
    Success(String),
    Error(EntitlementErrorFFI),
}

struct Recorder(Mutex<Sender<Outcome>>);

impl EntitlementSuccessCallback for Recorder {
    fn on_success(&self, payload_json: String) {
        let _ = self.0.lock().unwrap().send(Outcome::Success(payload_json));
    }
}

impl EntitlementErrorCallback for Recorder {
    fn on_error(&self, error: EntitlementErrorFFI) {
        let _ = self.0.lock().unwrap().send(Outcome::Error(error));
    }
}

/// Holds a client reference and gives it up from inside the callback.
struct ClientReleaser {
    client: Mutex<Option<Arc<EntitlementClient>>>,
    done: Mutex<Sender<bool>>,
}

impl EntitlementSuccessCallback for ClientReleaser {
    fn on_success(&self, _payload_json: String) {
        let client = self.client.lock().unwrap().take();
        let released = client.is_some();
        drop(client);
        let _ = self.done.lock().unwrap().send(released);
    }
}

/// Asks the client to wait for readiness from inside the callback.
struct ReadyWaiter {
    client: Arc<EntitlementClient>,
    done: Mutex<Sender<bool>>,
}

impl EntitlementSuccessCallback for ReadyWaiter {
    fn on_success(&self, _payload_json: String) {
        let ready = self.client.wait_until_ready(1_000);
        let _ = self.done.lock().unwrap().send(ready);
    }
}

struct ReadyRecorder(Mutex<Sender<&'static str>>, &'static str);

impl EntitlementReadyListener for ReadyRecorder {
    fn on_ready(&self) {
        let _ = self.0.lock().unwrap().send(self.1);
    }
}

fn recorder() -> (Arc<Recorder>, Receiver<Outcome>) {
    let (tx, rx) = mpsc::channel();
    (Arc::new(Recorder(Mutex::new(tx))), rx)
}

fn client_with(answer: HostAnswer) -> (Arc<EntitlementClient>, HostState) {
    let state = HostState::new(answer);
    let client = EntitlementClient::new_with_config(
        Box::new(HostInvoker(state.clone())),
        EntitlementClientConfigFFI {
            worker_threads: Some(2),
            ..Default::default()
        },
    )
    .unwrap();
    (client, state)
}

fn success_cb(recorder: &Arc<Recorder>) -> Option<Arc<dyn EntitlementSuccessCallback>> {
    Some(recorder.clone())
}

fn error_cb(recorder: &Arc<Recorder>) -> Option<Arc<dyn EntitlementErrorCallback>> {
    Some(recorder.clone())
}

fn call_all(client: &EntitlementClient, recorder: &Arc<Recorder>) {
    let success = || success_cb(recorder);
    let error = || error_cb(recorder);
    client.get_subscription_info(success(), error()).unwrap();
    client
        .get_offers("premium".to_string(), success(), error())
        .unwrap();
    client
        .purchase_offer("com.example.monthly".to_string(), success(), error())
        .unwrap();
    client.restore_purchases(success(), error()).unwrap();
}

// ============================================================================
// Request Tests
// ============================================================================

#[test]
fn test_requests_reach_host_with_documented_shape() {
    let (client, host) = client_with(HostAnswer::Hold);
    let (recorder, _rx) = recorder();

    call_all(&client, &recorder);

    let invokes = host.invokes();
    assert_eq!(invokes.len(), 4);
    assert!(invokes.iter().all(|i| i.service == "CQMEntitlement"));
    assert_eq!(
        invokes.iter().map(|i| i.action.as_str()).collect::<Vec<_>>(),
        vec![
            "getSubscriptionInfo",
            "getOffers",
            "purchaseOffer",
            "restorePurchases"
        ]
    );
    assert_eq!(invokes[0].args_json, "[]");
    assert_eq!(invokes[1].args_json, r#"["premium"]"#);
    assert_eq!(invokes[2].args_json, r#"["com.example.monthly"]"#);
    assert_eq!(invokes[3].args_json, "[]");
}

#[test]
fn test_payload_passes_through() {
    let payload = r#"{"productId":"p1","price":"4.99"}"#;
    let (client, _host) = client_with(HostAnswer::Succeed(payload.to_string()));
    let (recorder, rx) = recorder();

    call_all(&client, &recorder);

    for _ in 0..4 {
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Outcome::Success(payload.to_string())
        );
    }
    assert!(rx.recv_timeout(QUIET).is_err());
}

#[test]
fn test_payload_text_is_not_rewritten() {
    let payloads = [
        r#"{"z":1,"a":2}"#,
        r#"{"n":123456789012345678901234567890}"#,
        r#"{"p": 1.50}"#,
        "[\n  {\"productId\": \"p1\"}\n]",
    ];

    for payload in payloads {
        let (client, _host) = client_with(HostAnswer::Succeed(payload.to_string()));
        let (recorder, rx) = recorder();

        client
            .restore_purchases(success_cb(&recorder), error_cb(&recorder))
            .unwrap();

        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Outcome::Success(payload.to_string())
        );
    }
}

#[test]
fn test_store_failure_reaches_error_callback() {
    let (client, _host) = client_with(HostAnswer::Fail(Some(70)));
    let (recorder, rx) = recorder();

    call_all(&client, &recorder);

    for _ in 0..4 {
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Outcome::Error(EntitlementErrorFFI {
                code: Some(70),
                name: Some("STORE_ERROR".to_string()),
            })
        );
    }
}

#[test]
fn test_failure_without_code() {
    let (client, _host) = client_with(HostAnswer::Fail(None));
    let (recorder, rx) = recorder();

    client
        .restore_purchases(success_cb(&recorder), error_cb(&recorder))
        .unwrap();

    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        Outcome::Error(EntitlementErrorFFI {
            code: None,
            name: None,
        })
    );
}

#[test]
fn test_host_answering_twice_delivers_once() {
    let (client, host) = client_with(HostAnswer::Hold);
    let (recorder, rx) = recorder();

    client
        .get_subscription_info(success_cb(&recorder), error_cb(&recorder))
        .unwrap();

    let completion = host.held.lock().unwrap().pop().unwrap();
    assert_eq!(completion.action(), "getSubscriptionInfo");
    assert!(completion.fail(Some(41)));
    assert!(!completion.succeed("{}".to_string()).unwrap());

    assert!(matches!(
        rx.recv_timeout(WAIT).unwrap(),
        Outcome::Error(EntitlementErrorFFI { code: Some(41), .. })
    ));
    assert!(rx.recv_timeout(QUIET).is_err());
}

// ============================================================================
// Argument Error Tests
// ============================================================================

#[test]
fn test_missing_success_callback_throws() {
    let (client, host) = client_with(HostAnswer::Fail(Some(70)));
    let (recorder, rx) = recorder();
    let error = || error_cb(&recorder);

    let results = [
        client.get_subscription_info(None, error()),
        client.get_offers("premium".to_string(), None, error()),
        client.purchase_offer("p1".to_string(), None, error()),
        client.restore_purchases(None, error()),
    ];

    for result in results {
        assert!(matches!(
            result,
            Err(EntitlementMobileError::InvalidArgument { .. })
        ));
    }
    assert!(host.invokes().is_empty());
    assert!(rx.recv_timeout(QUIET).is_err());
}

#[test]
fn test_invalid_collection_name_throws() {
    let (client, host) = client_with(HostAnswer::Hold);
    let (recorder, _rx) = recorder();

    let err = client
        .get_offers("-abc".to_string(), success_cb(&recorder), None)
        .unwrap_err();
    match err {
        EntitlementMobileError::InvalidArgument { msg } => {
            assert!(msg.contains("64 characters"), "unexpected message: {msg}");
        }
        other => panic!("Expected InvalidArgument, got {other:?}"),
    }
    assert!(host.invokes().is_empty());
}

// ============================================================================
// Readiness Tests
// ============================================================================

#[test]
fn test_readiness_chain() {
    let (client, _host) = client_with(HostAnswer::Hold);
    let (tx, rx) = mpsc::channel();

    client.on_entitlement_ready(Arc::new(ReadyRecorder(Mutex::new(tx.clone()), "early")));
    assert!(!client.is_entitlement_ready());
    assert_eq!(client.gate_state(), GateStateFFI::Uninitialized);
    assert_eq!(client.pending_initialization(), vec!["onEntitlementInfoReady"]);
    assert!(!client.wait_until_ready(20));

    assert!(client.fire_platform_ready());
    assert!(client.wait_until_ready(1_000));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "early");
    assert_eq!(client.gate_state(), GateStateFFI::Ready);
    assert!(client.pending_initialization().is_empty());

    // Late listeners still run, exactly once.
    client.on_entitlement_ready(Arc::new(ReadyRecorder(Mutex::new(tx), "late")));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "late");
    assert!(!client.fire_platform_ready());
    assert!(rx.recv_timeout(QUIET).is_err());
}

#[test]
fn test_create_entitlement_client_uses_defaults() {
    let client = create_entitlement_client(Box::new(HostInvoker(HostState::new(
        HostAnswer::Hold,
    ))))
    .unwrap();
    assert_eq!(client.service_name(), "CQMEntitlement");
    assert!(!client.is_entitlement_ready());
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn test_client_released_inside_callback() {
    let (client, host) = client_with(HostAnswer::Hold);
    let (tx, rx) = mpsc::channel();
    let releaser: Arc<dyn EntitlementSuccessCallback> = Arc::new(ClientReleaser {
        client: Mutex::new(Some(client.clone())),
        done: Mutex::new(tx),
    });

    client.restore_purchases(Some(releaser), None).unwrap();
    drop(client);

    // The callback now owns the last client reference.
    let completion = host.held.lock().unwrap().pop().unwrap();
    assert!(completion.succeed("{}".to_string()).unwrap());
    assert_eq!(rx.recv_timeout(WAIT), Ok(true));
}

#[test]
fn test_wait_until_ready_inside_callback_does_not_block() {
    let (client, host) = client_with(HostAnswer::Hold);
    let (tx, rx) = mpsc::channel();
    let waiter: Arc<dyn EntitlementSuccessCallback> = Arc::new(ReadyWaiter {
        client: client.clone(),
        done: Mutex::new(tx),
    });

    client.get_subscription_info(Some(waiter), None).unwrap();
    let completion = host.held.lock().unwrap().pop().unwrap();
    assert!(completion.succeed("{}".to_string()).unwrap());
    assert_eq!(rx.recv_timeout(WAIT), Ok(false));

    assert!(client.fire_platform_ready());
    assert!(client.wait_until_ready(1_000));
}
