//! Error types for entitlement operations.
//!
//! Two disjoint categories live here:
//!
//! - [`ArgumentError`]: caller mistakes (missing callback, malformed collection
//!   name, empty product id). Returned synchronously from the call site and
//!   never routed to an error callback.
//! - [`EntitlementError`]: operational failures reported by the native layer as
//!   an integer code. Delivered asynchronously to the caller's error callback.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message returned for a malformed collection name.
///
/// Historical wording: the rule only constrains the first character, not the
/// last one. Native counterparts match on this string, so it is kept verbatim.
pub const INVALID_COLLECTION_NAME_MESSAGE: &str = "Names must be limited to 64 characters. The value must start and end with a letter or number and can also contain dots, dashes, and underscores";

/// Error codes reported by the native entitlement layer.
///
/// Must stay synchronized with the native implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// Operation not supported on this platform
    NotSupported = 1,
    /// Invalid argument passed to the native layer
    InvalidArgument = 10,
    /// Network error
    Network = 41,
    /// Network rate limit exceeded
    NetworkRateLimitExceeded = 42,
    /// Entity not found
    EntityNotFound = 61,
    /// Store error
    Store = 70,
    /// Payment cancelled by the user
    StorePaymentCancelled = 71,
    /// Product not available in the store
    StoreProductNotAvailable = 72,
    /// Project misconfigured
    ProjectConfiguration = 81,
}

impl ErrorCode {
    /// Every known code, in ascending numeric order.
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::Unknown,
        ErrorCode::NotSupported,
        ErrorCode::InvalidArgument,
        ErrorCode::Network,
        ErrorCode::NetworkRateLimitExceeded,
        ErrorCode::EntityNotFound,
        ErrorCode::Store,
        ErrorCode::StorePaymentCancelled,
        ErrorCode::StoreProductNotAvailable,
        ErrorCode::ProjectConfiguration,
    ];

    /// Numeric value on the wire.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a known code. Returns `None` for codes outside the catalog.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Constant name shared with the native side.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN_ERROR",
            Self::NotSupported => "NOT_SUPPORTED_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::NetworkRateLimitExceeded => "NETWORK_RATE_LIMIT_EXCEEDED_ERROR",
            Self::EntityNotFound => "ENTITY_NOT_FOUND_ERROR",
            Self::Store => "STORE_ERROR",
            Self::StorePaymentCancelled => "STORE_PAYMENT_CANCELLED_ERROR",
            Self::StoreProductNotAvailable => "STORE_PRODUCT_NOT_AVAILABLE_ERROR",
            Self::ProjectConfiguration => "PROJECT_CONFIGURATION_ERROR",
        }
    }

    /// Look up a code by its constant name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Failure reported by the native entitlement layer.
///
/// Wraps whatever code the native side sent, including codes that are not in
/// [`ErrorCode`]. A missing code is kept as `None` and is distinct from
/// [`EntitlementError::UNKNOWN_ERROR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EntitlementError {
    code: Option<i32>,
}

impl EntitlementError {
    pub const UNKNOWN_ERROR: i32 = 0;
    pub const NOT_SUPPORTED_ERROR: i32 = 1;
    pub const INVALID_ARGUMENT_ERROR: i32 = 10;
    pub const NETWORK_ERROR: i32 = 41;
    pub const NETWORK_RATE_LIMIT_EXCEEDED_ERROR: i32 = 42;
    pub const ENTITY_NOT_FOUND_ERROR: i32 = 61;
    pub const STORE_ERROR: i32 = 70;
    pub const STORE_PAYMENT_CANCELLED_ERROR: i32 = 71;
    pub const STORE_PRODUCT_NOT_AVAILABLE_ERROR: i32 = 72;
    pub const PROJECT_CONFIGURATION_ERROR: i32 = 81;

    /// Box a raw code. `None` means the native layer sent no code.
    pub fn new(code: Option<i32>) -> Self {
        Self { code }
    }

    /// An error with no code.
    pub fn unset() -> Self {
        Self { code: None }
    }

    /// The raw code, if one was provided.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    /// The code as a catalog entry, if it is one.
    pub fn known_code(&self) -> Option<ErrorCode> {
        self.code.and_then(ErrorCode::from_code)
    }

    pub fn is_unset(&self) -> bool {
        self.code.is_none()
    }
}

impl From<i32> for EntitlementError {
    fn from(code: i32) -> Self {
        Self::new(Some(code))
    }
}

impl From<ErrorCode> for EntitlementError {
    fn from(code: ErrorCode) -> Self {
        Self::new(Some(code.code()))
    }
}

impl fmt::Display for EntitlementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.known_code()) {
            (None, _) => write!(f, "entitlement error (no code)"),
            (Some(_), Some(known)) => write!(f, "entitlement error: {}", known),
            (Some(raw), None) => write!(f, "entitlement error: unrecognized code {}", raw),
        }
    }
}

impl std::error::Error for EntitlementError {}

/// Caller mistakes detected before anything is sent to the native layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// The required success callback was not supplied.
    #[error("{method}: success callback is required")]
    MissingSuccessCallback { method: &'static str },

    /// Collection name failed the naming rule.
    #[error("{}", INVALID_COLLECTION_NAME_MESSAGE)]
    InvalidCollectionName,

    /// Product id was empty.
    #[error("{method}: product id must be a non-empty string")]
    EmptyProductId { method: &'static str },
}
