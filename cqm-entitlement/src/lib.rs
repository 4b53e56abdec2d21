//! CQM entitlement library.
//!
//! A thin facade over a platform-native entitlement and purchase service:
//! subscription lookup, offer listing, purchase, and restore. The crate holds
//! no store logic of its own. Each request is validated, forwarded once through
//! an injected [`NativeBridge`], and answered through a callback pair.
//!
//! # Features
//!
//! - **Readiness gate**: sticky signals that let callers defer work until the
//!   native subsystem is up
//! - **Typed errors**: native failure codes boxed into [`EntitlementError`];
//!   caller mistakes reported synchronously as [`ArgumentError`]
//! - **Mockable bridge**: the native layer is a trait, so the facade runs in
//!   tests without a device
//!
//! # Example
//!
//! ```ignore
//! use cqm_entitlement::{Entitlement, SignalRegistry};
//!
//! let signals = SignalRegistry::new(handle);
//! let entitlement = Entitlement::new(bridge, &signals);
//!
//! entitlement.purchase_offer(
//!     "com.example.monthly",
//!     Some(Box::new(|receipt| println!("purchased: {receipt}"))),
//!     Some(Box::new(|err| eprintln!("purchase failed: {err}"))),
//! )?;
//! ```

pub mod action;
pub mod bridge;
pub mod config;
pub mod entitlement;
pub mod errors;
pub mod payload;
pub mod readiness;
pub mod request;
pub mod validation;

/// Test utilities (mock native bridge).
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use action::{Action, UnknownAction, SERVICE_NAME};
pub use bridge::{ErrorCallback, FailureCallback, NativeBridge, NativeCall, SuccessCallback};
pub use config::{EntitlementConfig, ENTITLEMENT_READY_SIGNAL, PLATFORM_READY_SIGNAL};
pub use entitlement::{Entitlement, GateState};
pub use errors::{ArgumentError, EntitlementError, ErrorCode, INVALID_COLLECTION_NAME_MESSAGE};
pub use payload::Payload;
pub use readiness::{ReadinessSignal, SignalRegistry};
pub use request::PendingRequest;

/// Common result alias for synchronous argument checks.
pub type Result<T> = std::result::Result<T, ArgumentError>;
