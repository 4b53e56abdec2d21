//! CQM Entitlement Mobile FFI Bindings
//!
//! This crate provides UniFFI bindings for the entitlement facade, enabling
//! integration with iOS (Swift) and Android (Kotlin) applications.
//!
//! # Architecture
//!
//! - The host implements [`native_ffi::NativeInvokerFFI`] on top of StoreKit
//!   or Google Play Billing and answers through [`native_ffi::NativeCompletion`].
//! - App code calls [`EntitlementClient`] with optional success/error
//!   callbacks. Argument mistakes are thrown synchronously; store failures
//!   arrive on the error callback as [`EntitlementErrorFFI`].
//!
//! # Thread Safety
//!
//! All exposed types are thread-safe. Callbacks run on the client's own Tokio
//! runtime, never inline from the call that triggered them.

pub mod async_bridge;
pub mod native_ffi;

pub use native_ffi::{NativeCompletion, NativeInvokerBridge, NativeInvokerFFI};

use std::sync::Arc;
use std::time::Duration;

use cqm_entitlement::{
    ArgumentError, Entitlement, EntitlementConfig, EntitlementError, ErrorCallback, ErrorCode,
    GateState, SignalRegistry, SuccessCallback,
};

use crate::async_bridge::AsyncRuntime;

// UniFFI scaffolding
uniffi::setup_scaffolding!();

// ============================================================================
// Error Types
// ============================================================================

/// Mobile-friendly error type for synchronous failures.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum EntitlementMobileError {
    /// Caller passed a missing callback or malformed argument.
    #[error("Invalid argument: {msg}")]
    InvalidArgument { msg: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {msg}")]
    Serialization { msg: String },

    /// Internal error (unexpected state).
    #[error("Internal error: {msg}")]
    Internal { msg: String },
}

impl From<ArgumentError> for EntitlementMobileError {
    fn from(e: ArgumentError) -> Self {
        Self::InvalidArgument { msg: e.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, EntitlementMobileError>;

// ============================================================================
// Core Types (FFI-safe wrappers)
// ============================================================================

/// Failure reported by the native store layer.
#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct EntitlementErrorFFI {
    /// Raw code; `None` if the native side sent none.
    pub code: Option<i32>,
    /// Constant name for known codes, e.g. `"STORE_ERROR"`.
    pub name: Option<String>,
}

impl From<EntitlementError> for EntitlementErrorFFI {
    fn from(e: EntitlementError) -> Self {
        Self {
            code: e.code(),
            name: e.known_code().map(|c| c.name().to_string()),
        }
    }
}

/// A named error code from the native catalog.
#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct ErrorCodeEntryFFI {
    pub name: String,
    pub code: i32,
}

/// Readiness gate state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum GateStateFFI {
    Uninitialized,
    WaitingForNative,
    Ready,
}

impl From<GateState> for GateStateFFI {
    fn from(state: GateState) -> Self {
        match state {
            GateState::Uninitialized => Self::Uninitialized,
            GateState::WaitingForNative => Self::WaitingForNative,
            GateState::Ready => Self::Ready,
        }
    }
}

/// Client configuration. Unset fields take the library defaults.
#[derive(Clone, Debug, Default, uniffi::Record)]
pub struct EntitlementClientConfigFFI {
    /// Worker threads for the client runtime.
    pub worker_threads: Option<u32>,
    /// Native subsystem name.
    pub service: Option<String>,
    /// Host signal that reports the platform runtime is ready.
    pub platform_ready_signal: Option<String>,
    /// Signal fired once entitlements are ready.
    pub entitlement_ready_signal: Option<String>,
}

impl EntitlementClientConfigFFI {
    fn to_library_config(&self) -> EntitlementConfig {
        let mut config = EntitlementConfig::default();
        if let Some(service) = &self.service {
            config.service = service.clone();
        }
        if let Some(signal) = &self.platform_ready_signal {
            config.platform_ready_signal = signal.clone();
        }
        if let Some(signal) = &self.entitlement_ready_signal {
            config.entitlement_ready_signal = signal.clone();
        }
        config
    }
}

// ============================================================================
// Callback Interfaces
// ============================================================================

/// Receives the JSON payload of a successful request.
#[uniffi::export(with_foreign)]
pub trait EntitlementSuccessCallback: Send + Sync {
    fn on_success(&self, payload_json: String);
}

/// Receives the failure of a request.
#[uniffi::export(with_foreign)]
pub trait EntitlementErrorCallback: Send + Sync {
    fn on_error(&self, error: EntitlementErrorFFI);
}

/// Notified once entitlements are ready.
#[uniffi::export(with_foreign)]
pub trait EntitlementReadyListener: Send + Sync {
    fn on_ready(&self);
}

fn success_adapter(
    callback: Option<Arc<dyn EntitlementSuccessCallback>>,
) -> Option<SuccessCallback> {
    callback.map(|callback| -> SuccessCallback {
        Box::new(move |payload| callback.on_success(payload.into_string()))
    })
}

fn error_adapter(callback: Option<Arc<dyn EntitlementErrorCallback>>) -> Option<ErrorCallback> {
    callback.map(|callback| -> ErrorCallback {
        Box::new(move |error| callback.on_error(error.into()))
    })
}

// ============================================================================
// Main Client
// ============================================================================

/// Entitlement client for mobile applications.
#[derive(uniffi::Object)]
pub struct EntitlementClient {
    entitlement: Entitlement,
    signals: SignalRegistry,
    /// Declared last so it drops after everything that holds its handle.
    runtime: AsyncRuntime,
}

#[uniffi::export]
impl EntitlementClient {
    /// Create a client with the default configuration.
    ///
    /// # Example (Swift)
    ///
    /// ```swift
    /// let client = try EntitlementClient(invoker: StoreInvoker())
    /// client.onEntitlementReady(listener: ReadyHandler())
    /// client.firePlatformReady()
    /// ```
    #[uniffi::constructor]
    pub fn new(invoker: Box<dyn NativeInvokerFFI>) -> Result<Arc<Self>> {
        Self::new_with_config(invoker, EntitlementClientConfigFFI::default())
    }

    /// Create a client with custom configuration.
    #[uniffi::constructor]
    pub fn new_with_config(
        invoker: Box<dyn NativeInvokerFFI>,
        config: EntitlementClientConfigFFI,
    ) -> Result<Arc<Self>> {
        let runtime = AsyncRuntime::from_worker_threads(config.worker_threads)?;
        let handle = runtime.handle();

        let bridge = NativeInvokerBridge::new(Arc::from(invoker), handle.clone());
        let signals = SignalRegistry::new(handle);
        let entitlement =
            Entitlement::with_config(Arc::new(bridge), &signals, config.to_library_config());

        Ok(Arc::new(Self {
            entitlement,
            signals,
            runtime,
        }))
    }

    /// Fetch the subscription info of the current publication and device.
    pub fn get_subscription_info(
        &self,
        on_success: Option<Arc<dyn EntitlementSuccessCallback>>,
        on_error: Option<Arc<dyn EntitlementErrorCallback>>,
    ) -> Result<()> {
        Ok(self
            .entitlement
            .get_subscription_info(success_adapter(on_success), error_adapter(on_error))?)
    }

    /// Fetch the offers (products and subscriptions) of a collection.
    pub fn get_offers(
        &self,
        collection_name: String,
        on_success: Option<Arc<dyn EntitlementSuccessCallback>>,
        on_error: Option<Arc<dyn EntitlementErrorCallback>>,
    ) -> Result<()> {
        Ok(self.entitlement.get_offers(
            &collection_name,
            success_adapter(on_success),
            error_adapter(on_error),
        )?)
    }

    /// Start a purchase of a product or subscription offer.
    pub fn purchase_offer(
        &self,
        product_id: String,
        on_success: Option<Arc<dyn EntitlementSuccessCallback>>,
        on_error: Option<Arc<dyn EntitlementErrorCallback>>,
    ) -> Result<()> {
        Ok(self.entitlement.purchase_offer(
            &product_id,
            success_adapter(on_success),
            error_adapter(on_error),
        )?)
    }

    /// Restore the user's previous purchases.
    pub fn restore_purchases(
        &self,
        on_success: Option<Arc<dyn EntitlementSuccessCallback>>,
        on_error: Option<Arc<dyn EntitlementErrorCallback>>,
    ) -> Result<()> {
        Ok(self
            .entitlement
            .restore_purchases(success_adapter(on_success), error_adapter(on_error))?)
    }

    /// Report that the host platform runtime is ready.
    ///
    /// Returns `false` if it was already reported.
    pub fn fire_platform_ready(&self) -> bool {
        self.entitlement.platform_ready().fire()
    }

    pub fn is_entitlement_ready(&self) -> bool {
        self.entitlement.is_ready()
    }

    pub fn gate_state(&self) -> GateStateFFI {
        self.entitlement.gate_state().into()
    }

    /// Register a listener for entitlement readiness.
    ///
    /// Called once, from the client runtime, even if readiness already fired.
    pub fn on_entitlement_ready(&self, listener: Arc<dyn EntitlementReadyListener>) {
        self.entitlement.on_ready(move || listener.on_ready());
    }

    /// Block the calling thread until entitlements are ready or `timeout_ms`
    /// elapses. Returns whether they became ready.
    ///
    /// Do not call from the main thread. Request callbacks and readiness
    /// listeners run on the client runtime, where blocking is not allowed;
    /// called from there this returns the current readiness without waiting.
    pub fn wait_until_ready(&self, timeout_ms: u64) -> bool {
        if AsyncRuntime::in_async_context() {
            return self.is_entitlement_ready();
        }
        self.runtime.block_on(async {
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.entitlement.ready())
                .await
                .is_ok()
        })
    }

    /// Startup signals that have not fired yet.
    pub fn pending_initialization(&self) -> Vec<String> {
        self.signals.pending_initialization()
    }

    /// Native subsystem this client addresses.
    pub fn service_name(&self) -> String {
        self.entitlement.config().service.clone()
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Create a new entitlement client.
#[uniffi::export]
pub fn create_entitlement_client(
    invoker: Box<dyn NativeInvokerFFI>,
) -> Result<Arc<EntitlementClient>> {
    EntitlementClient::new(invoker)
}

/// All error codes shared with the native layer.
#[uniffi::export]
pub fn entitlement_error_codes() -> Vec<ErrorCodeEntryFFI> {
    ErrorCode::ALL
        .into_iter()
        .map(|c| ErrorCodeEntryFFI {
            name: c.name().to_string(),
            code: c.code(),
        })
        .collect()
}

/// Constant name for a code, if it is a known one.
#[uniffi::export]
pub fn entitlement_error_name(code: i32) -> Option<String> {
    ErrorCode::from_code(code).map(|c| c.name().to_string())
}

/// Check a collection name without sending a request.
#[uniffi::export]
pub fn is_valid_collection_name(name: String) -> bool {
    cqm_entitlement::validation::is_valid_collection_name(&name)
}

/// Get the library version.
#[uniffi::export]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
