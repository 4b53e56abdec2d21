//! Scriptable native bridge for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::bridge::{FailureCallback, NativeBridge, NativeCall, SuccessCallback};
use crate::Payload;

/// How the mock answers new calls.
#[derive(Clone, Debug, PartialEq)]
pub enum MockResponse {
    /// Answer on a spawned task with this payload.
    Succeed(Payload),
    /// Answer on a spawned task with this failure code.
    Fail(Option<i32>),
    /// Keep the call pending until a `resolve_*` method is called.
    Hold,
}

struct HeldCall {
    on_success: SuccessCallback,
    on_failure: Option<FailureCallback>,
}

/// A [`NativeBridge`] that records calls and answers as scripted.
///
/// `Succeed` and `Fail` answer from a spawned Tokio task, so the bridge must be
/// invoked inside a runtime.
pub struct MockNativeBridge {
    response: RwLock<MockResponse>,
    calls: RwLock<Vec<NativeCall>>,
    held: Mutex<VecDeque<HeldCall>>,
}

impl MockNativeBridge {
    /// A bridge that holds every call until resolved by hand.
    pub fn new() -> Arc<Self> {
        Self::with_response(MockResponse::Hold)
    }

    /// A bridge that answers every call with `payload`.
    pub fn succeeding(payload: impl Into<Payload>) -> Arc<Self> {
        Self::with_response(MockResponse::Succeed(payload.into()))
    }

    /// A bridge that fails every call with `code`.
    pub fn failing(code: i32) -> Arc<Self> {
        Self::with_response(MockResponse::Fail(Some(code)))
    }

    pub fn with_response(response: MockResponse) -> Arc<Self> {
        Arc::new(Self {
            response: RwLock::new(response),
            calls: RwLock::new(Vec::new()),
            held: Mutex::new(VecDeque::new()),
        })
    }

    /// Change how subsequent calls are answered.
    pub fn set_response(&self, response: MockResponse) {
        *self.response.write().unwrap_or_else(PoisonError::into_inner) = response;
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Calls waiting for a manual answer.
    pub fn held_count(&self) -> usize {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Answer the oldest held call with `payload`. Returns `false` if none.
    pub fn resolve_success(&self, payload: impl Into<Payload>) -> bool {
        match self.take_held() {
            Some(held) => {
                (held.on_success)(payload.into());
                true
            }
            None => false,
        }
    }

    /// Fail the oldest held call with `code`. Returns `false` if none.
    ///
    /// A call dispatched without a failure path is consumed silently.
    pub fn resolve_failure(&self, code: Option<i32>) -> bool {
        match self.take_held() {
            Some(held) => {
                if let Some(on_failure) = held.on_failure {
                    on_failure(code);
                }
                true
            }
            None => false,
        }
    }

    /// Misbehave: answer the oldest held call on both paths, failure first.
    pub fn resolve_both(&self, payload: impl Into<Payload>, code: Option<i32>) -> bool {
        match self.take_held() {
            Some(held) => {
                if let Some(on_failure) = held.on_failure {
                    on_failure(code);
                }
                (held.on_success)(payload.into());
                true
            }
            None => false,
        }
    }

    /// Drop the oldest held call without answering it.
    pub fn abandon(&self) -> bool {
        self.take_held().is_some()
    }

    fn take_held(&self) -> Option<HeldCall> {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

impl NativeBridge for MockNativeBridge {
    fn invoke(
        &self,
        call: NativeCall,
        on_success: SuccessCallback,
        on_failure: Option<FailureCallback>,
    ) {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);

        let response = self
            .response
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match response {
            MockResponse::Succeed(payload) => {
                tokio::spawn(async move { on_success(payload) });
            }
            MockResponse::Fail(code) => {
                tokio::spawn(async move {
                    if let Some(on_failure) = on_failure {
                        on_failure(code);
                    }
                });
            }
            MockResponse::Hold => {
                self.held
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push_back(HeldCall {
                        on_success,
                        on_failure,
                    });
            }
        }
    }
}
