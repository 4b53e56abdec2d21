//! Downward seam to the platform-native entitlement layer.
//!
//! The native side is reachable only through [`NativeBridge::invoke`]: the
//! facade hands over a [`NativeCall`] plus a callback pair and returns right
//! away. The bridge answers later, from whatever thread or task it likes, by
//! calling at most one of the two callbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::errors::EntitlementError;
use crate::{Action, Payload};

/// Receives the opaque payload of a successful request.
pub type SuccessCallback = Box<dyn FnOnce(Payload) + Send + 'static>;

/// Receives the boxed failure of a request.
pub type ErrorCallback = Box<dyn FnOnce(EntitlementError) + Send + 'static>;

/// Receives the raw failure code from the native layer. `None` when the native
/// side reported a failure without a code.
pub type FailureCallback = Box<dyn FnOnce(Option<i32>) + Send + 'static>;

/// One request addressed to the native layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCall {
    /// Target subsystem, normally [`crate::SERVICE_NAME`].
    pub service: String,
    pub action: Action,
    /// Positional arguments, in order.
    pub args: Vec<Value>,
}

impl NativeCall {
    pub fn new(service: impl Into<String>, action: Action, args: Vec<Value>) -> Self {
        Self {
            service: service.into(),
            action,
            args,
        }
    }
}

/// Asynchronous invocation primitive provided by the host platform.
///
/// Implementations must not block until the native side answers, and must not
/// answer inline from within `invoke`. `on_failure` is `None` when the caller
/// opted out of failure delivery; a failure for such a call is dropped.
pub trait NativeBridge: Send + Sync {
    fn invoke(
        &self,
        call: NativeCall,
        on_success: SuccessCallback,
        on_failure: Option<FailureCallback>,
    );
}

impl<B: NativeBridge + ?Sized> NativeBridge for Arc<B> {
    fn invoke(
        &self,
        call: NativeCall,
        on_success: SuccessCallback,
        on_failure: Option<FailureCallback>,
    ) {
        (**self).invoke(call, on_success, on_failure)
    }
}

/// Shared flag that lets exactly one of a callback pair run.
#[derive(Clone, Default)]
pub(crate) struct Settled(Arc<AtomicBool>);

impl Settled {
    /// Returns true for the first caller only.
    pub(crate) fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

/// Wrap a callback pair so the bridge can resolve a request at most once, even
/// if it misbehaves and answers twice or on both paths.
pub(crate) fn settle_once(
    on_success: SuccessCallback,
    on_failure: Option<FailureCallback>,
) -> (SuccessCallback, Option<FailureCallback>) {
    let settled = Settled::default();
    let success_guard = settled.clone();
    let success: SuccessCallback = Box::new(move |payload| {
        if success_guard.claim() {
            on_success(payload);
        }
    });
    let failure = on_failure.map(|on_failure| -> FailureCallback {
        Box::new(move |code| {
            if settled.claim() {
                on_failure(code);
            }
        })
    });
    (success, failure)
}
