//! Native Invoker FFI
//!
//! The host app (Swift/Kotlin) owns the real store integration. It implements
//! [`NativeInvokerFFI`] and answers each request through the
//! [`NativeCompletion`] handed to it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                Mobile App (Swift/Kotlin)                  │
//! │   NativeInvokerFFI implementation (StoreKit / Billing)    │
//! └──────────────────────────────────────────────────────────┘
//!              ▲ invoke(...)            │ completion.succeed / fail
//!              │                        ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Rust FFI Layer                        │
//! │   NativeInvokerBridge (cqm_entitlement::NativeBridge)     │
//! └──────────────────────────────────────────────────────────┘
//!              ▲
//!              │
//! ┌──────────────────────────────────────────────────────────┐
//! │              cqm_entitlement::Entitlement                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example (Swift)
//!
//! ```swift
//! class StoreInvoker: NativeInvokerFfi {
//!     func invoke(service: String, action: String, argsJson: String, completion: NativeCompletion) {
//!         storeQueue.async {
//!             switch action {
//!             case "restorePurchases":
//!                 store.restore { result in
//!                     switch result {
//!                     case .success(let json): try? completion.succeed(payloadJson: json)
//!                     case .failure(let err): completion.fail(code: err.entitlementCode)
//!                     }
//!                 }
//!             // ...
//!             }
//!         }
//!     }
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use cqm_entitlement::{
    EntitlementError, FailureCallback, NativeBridge, NativeCall, Payload, SuccessCallback,
};
use tokio::runtime::Handle;

use crate::{EntitlementMobileError, Result};

/// Native invocation primitive implemented by the host app.
///
/// # Thread Safety
///
/// Called from whichever thread issued the request. Implementations must
/// dispatch the work and return; answering later through `completion` from
/// any thread is fine.
#[uniffi::export(callback_interface)]
pub trait NativeInvokerFFI: Send + Sync {
    /// Dispatch one request.
    ///
    /// # Arguments
    ///
    /// * `service` - Target subsystem, `"CQMEntitlement"` by default
    /// * `action` - One of `getSubscriptionInfo`, `getOffers`, `purchaseOffer`,
    ///   `restorePurchases`
    /// * `args_json` - Positional arguments as a JSON array
    /// * `completion` - Answer exactly once through this handle
    fn invoke(
        &self,
        service: String,
        action: String,
        args_json: String,
        completion: Arc<NativeCompletion>,
    );
}

type Pair = (SuccessCallback, Option<FailureCallback>);

/// One-shot answer handle for a dispatched request.
///
/// Only the first answer counts. Callbacks run on the client's runtime, never
/// on the thread that answers.
#[derive(uniffi::Object)]
pub struct NativeCompletion {
    action: String,
    pair: Mutex<Option<Pair>>,
    handle: Handle,
}

impl NativeCompletion {
    pub(crate) fn new(
        action: String,
        on_success: SuccessCallback,
        on_failure: Option<FailureCallback>,
        handle: Handle,
    ) -> Arc<Self> {
        Arc::new(Self {
            action,
            pair: Mutex::new(Some((on_success, on_failure))),
            handle,
        })
    }

    fn take(&self) -> Option<Pair> {
        self.pair
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn deliver_failure(&self, code: Option<i32>) -> bool {
        let Some((_, on_failure)) = self.take() else {
            return false;
        };
        match on_failure {
            Some(on_failure) => {
                self.handle.spawn(async move { on_failure(code) });
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    action = %self.action,
                    code = ?code,
                    "dropping failure, caller gave no error callback"
                );
            }
        }
        true
    }
}

#[uniffi::export]
impl NativeCompletion {
    /// Answer with a JSON payload. The text reaches the caller unchanged.
    ///
    /// Returns `Ok(false)` if the request was already answered. Malformed JSON
    /// is rejected and leaves the request unanswered.
    pub fn succeed(&self, payload_json: String) -> Result<bool> {
        let payload = Payload::from_json(payload_json).map_err(|e| {
            EntitlementMobileError::Serialization {
                msg: format!("{} payload is not valid JSON: {}", self.action, e),
            }
        })?;
        let Some((on_success, _)) = self.take() else {
            return Ok(false);
        };
        self.handle.spawn(async move { on_success(payload) });
        Ok(true)
    }

    /// Answer with a failure code. `None` means the native side has no code.
    ///
    /// Returns `false` if the request was already answered.
    pub fn fail(&self, code: Option<i32>) -> bool {
        self.deliver_failure(code)
    }

    /// Whether an answer has been given.
    pub fn is_settled(&self) -> bool {
        self.pair
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// The action this completion answers.
    pub fn action(&self) -> String {
        self.action.clone()
    }
}

/// Bridge from the FFI invoker to [`cqm_entitlement::NativeBridge`].
pub struct NativeInvokerBridge {
    invoker: Arc<dyn NativeInvokerFFI>,
    handle: Handle,
}

impl NativeInvokerBridge {
    pub fn new(invoker: Arc<dyn NativeInvokerFFI>, handle: Handle) -> Self {
        Self { invoker, handle }
    }
}

impl std::fmt::Debug for NativeInvokerBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeInvokerBridge")
            .field("invoker", &"<NativeInvokerFFI>")
            .finish()
    }
}

impl NativeBridge for NativeInvokerBridge {
    fn invoke(
        &self,
        call: NativeCall,
        on_success: SuccessCallback,
        on_failure: Option<FailureCallback>,
    ) {
        let action = call.action.as_str().to_string();
        let completion = NativeCompletion::new(
            action.clone(),
            on_success,
            on_failure,
            self.handle.clone(),
        );

        let args_json = match serde_json::to_string(&call.args) {
            Ok(json) => json,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(action = %action, error = %_e, "could not encode native arguments");
                completion.deliver_failure(Some(EntitlementError::INVALID_ARGUMENT_ERROR));
                return;
            }
        };

        self.invoker.invoke(call.service, action, args_json, completion);
    }
}
