//! The entitlement facade.
//!
//! [`Entitlement`] validates each request synchronously, hands it to the
//! injected [`NativeBridge`], and returns. Argument problems come back as
//! `Err(ArgumentError)` from the call itself; native failures arrive later, as
//! an [`EntitlementError`], through the optional error callback.
//!
//! # Example
//!
//! ```ignore
//! let signals = SignalRegistry::new(runtime.handle().clone());
//! let entitlement = Entitlement::new(bridge, &signals);
//!
//! entitlement.on_ready(|| println!("entitlements ready"));
//! entitlement.get_offers(
//!     "premium",
//!     Some(Box::new(|offers| println!("{offers}"))),
//!     Some(Box::new(|err| eprintln!("{err}"))),
//! )?;
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::bridge::{
    settle_once, ErrorCallback, FailureCallback, NativeBridge, NativeCall, SuccessCallback,
};
use crate::config::EntitlementConfig;
use crate::errors::{ArgumentError, EntitlementError};
use crate::readiness::{ReadinessSignal, SignalRegistry};
use crate::request::PendingRequest;
use crate::validation::{validate_collection_name, validate_product_id};
use crate::{Action, Result};

/// Where the readiness gate currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// The platform runtime has not reported ready.
    Uninitialized,
    /// The platform is ready; the entitlement signal has not fired yet.
    WaitingForNative,
    /// Entitlements are ready. Permanent.
    Ready,
}

/// Entitlement and purchase service facade.
pub struct Entitlement {
    bridge: Arc<dyn NativeBridge>,
    config: EntitlementConfig,
    platform_ready: ReadinessSignal,
    entitlement_ready: ReadinessSignal,
}

impl Entitlement {
    /// Create a facade with the default configuration.
    pub fn new(bridge: Arc<dyn NativeBridge>, signals: &SignalRegistry) -> Self {
        Self::with_config(bridge, signals, EntitlementConfig::default())
    }

    /// Create a facade with a custom configuration.
    ///
    /// Registers the entitlement-ready signal as required for host startup and
    /// chains it to the platform's own readiness signal.
    pub fn with_config(
        bridge: Arc<dyn NativeBridge>,
        signals: &SignalRegistry,
        config: EntitlementConfig,
    ) -> Self {
        let entitlement_ready = signals.wait_for_initialization(&config.entitlement_ready_signal);
        let platform_ready = signals.create_sticky(&config.platform_ready_signal);

        let chained = entitlement_ready.clone();
        platform_ready.subscribe(move || {
            chained.fire();
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            service = %config.service,
            platform_ready = %config.platform_ready_signal,
            entitlement_ready = %config.entitlement_ready_signal,
            "entitlement facade created"
        );

        Self {
            bridge,
            config,
            platform_ready,
            entitlement_ready,
        }
    }

    pub fn config(&self) -> &EntitlementConfig {
        &self.config
    }

    /// The platform runtime's readiness signal.
    pub fn platform_ready(&self) -> &ReadinessSignal {
        &self.platform_ready
    }

    /// The signal fired once entitlements are usable.
    pub fn entitlement_ready(&self) -> &ReadinessSignal {
        &self.entitlement_ready
    }

    pub fn is_ready(&self) -> bool {
        self.entitlement_ready.is_fired()
    }

    pub fn gate_state(&self) -> GateState {
        if self.entitlement_ready.is_fired() {
            GateState::Ready
        } else if self.platform_ready.is_fired() {
            GateState::WaitingForNative
        } else {
            GateState::Uninitialized
        }
    }

    /// Run `listener` once entitlements are ready, never inline.
    pub fn on_ready<F>(&self, listener: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.entitlement_ready.subscribe(listener);
    }

    /// Wait until entitlements are ready.
    pub async fn ready(&self) {
        self.entitlement_ready.wait().await;
    }

    /// Fetch the subscription info for the current publication and device.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn get_subscription_info(
        &self,
        on_success: Option<SuccessCallback>,
        on_error: Option<ErrorCallback>,
    ) -> Result<()> {
        let on_success = require_success(Action::GetSubscriptionInfo, on_success)?;
        self.dispatch(Action::GetSubscriptionInfo, Vec::new(), on_success, on_error);
        Ok(())
    }

    /// Fetch the offers (products and subscriptions) of a collection.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, on_success, on_error)))]
    pub fn get_offers(
        &self,
        collection_name: &str,
        on_success: Option<SuccessCallback>,
        on_error: Option<ErrorCallback>,
    ) -> Result<()> {
        let on_success = require_success(Action::GetOffers, on_success)?;
        validate_collection_name(collection_name)?;
        self.dispatch(
            Action::GetOffers,
            vec![Value::from(collection_name)],
            on_success,
            on_error,
        );
        Ok(())
    }

    /// Start a purchase of a product or subscription offer.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, on_success, on_error)))]
    pub fn purchase_offer(
        &self,
        product_id: &str,
        on_success: Option<SuccessCallback>,
        on_error: Option<ErrorCallback>,
    ) -> Result<()> {
        let on_success = require_success(Action::PurchaseOffer, on_success)?;
        validate_product_id(product_id)?;
        self.dispatch(
            Action::PurchaseOffer,
            vec![Value::from(product_id)],
            on_success,
            on_error,
        );
        Ok(())
    }

    /// Restore the user's previous purchases.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn restore_purchases(
        &self,
        on_success: Option<SuccessCallback>,
        on_error: Option<ErrorCallback>,
    ) -> Result<()> {
        let on_success = require_success(Action::RestorePurchases, on_success)?;
        self.dispatch(Action::RestorePurchases, Vec::new(), on_success, on_error);
        Ok(())
    }

    /// [`Self::get_subscription_info`] as a future.
    pub fn get_subscription_info_async(&self) -> Result<PendingRequest> {
        let (pending, on_success, on_error) = PendingRequest::channel();
        self.get_subscription_info(Some(on_success), Some(on_error))?;
        Ok(pending)
    }

    /// [`Self::get_offers`] as a future.
    pub fn get_offers_async(&self, collection_name: &str) -> Result<PendingRequest> {
        let (pending, on_success, on_error) = PendingRequest::channel();
        self.get_offers(collection_name, Some(on_success), Some(on_error))?;
        Ok(pending)
    }

    /// [`Self::purchase_offer`] as a future.
    pub fn purchase_offer_async(&self, product_id: &str) -> Result<PendingRequest> {
        let (pending, on_success, on_error) = PendingRequest::channel();
        self.purchase_offer(product_id, Some(on_success), Some(on_error))?;
        Ok(pending)
    }

    /// [`Self::restore_purchases`] as a future.
    pub fn restore_purchases_async(&self) -> Result<PendingRequest> {
        let (pending, on_success, on_error) = PendingRequest::channel();
        self.restore_purchases(Some(on_success), Some(on_error))?;
        Ok(pending)
    }

    fn dispatch(
        &self,
        action: Action,
        args: Vec<Value>,
        on_success: SuccessCallback,
        on_error: Option<ErrorCallback>,
    ) {
        #[cfg(feature = "tracing")]
        let reports_failures = on_error.is_some();

        let on_failure = on_error.map(translate_failure);
        let (on_success, on_failure) = settle_once(on_success, on_failure);
        let call = NativeCall::new(self.config.service.clone(), action, args);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            service = %call.service,
            action = %action,
            args = call.args.len(),
            reports_failures,
            "dispatching native call"
        );

        self.bridge.invoke(call, on_success, on_failure);
    }
}

impl std::fmt::Debug for Entitlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entitlement")
            .field("bridge", &"<NativeBridge>")
            .field("config", &self.config)
            .field("gate_state", &self.gate_state())
            .finish()
    }
}

fn require_success(
    action: Action,
    on_success: Option<SuccessCallback>,
) -> Result<SuccessCallback> {
    on_success.ok_or(ArgumentError::MissingSuccessCallback {
        method: action.qualified_name(),
    })
}

/// Box the raw native code before it reaches the caller's handler.
fn translate_failure(on_error: ErrorCallback) -> FailureCallback {
    Box::new(move |code| {
        #[cfg(feature = "tracing")]
        tracing::debug!(code = ?code, "native call failed");
        on_error(EntitlementError::new(code));
    })
}
