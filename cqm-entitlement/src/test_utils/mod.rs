//! Test utilities for the entitlement facade.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cqm_entitlement::test_utils::MockNativeBridge;
//!
//! let bridge = MockNativeBridge::failing(EntitlementError::STORE_ERROR);
//! let entitlement = Entitlement::new(bridge.clone(), &signals);
//! entitlement.restore_purchases(Some(on_success), Some(on_error))?;
//! assert_eq!(bridge.call_count(), 1);
//! ```

mod mock_bridge;

pub use mock_bridge::{MockNativeBridge, MockResponse};
