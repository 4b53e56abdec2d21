//! Native action catalog.

use std::fmt;
use std::str::FromStr;

/// Native subsystem that serves every entitlement action.
pub const SERVICE_NAME: &str = "CQMEntitlement";

/// An action understood by the native entitlement subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GetSubscriptionInfo,
    GetOffers,
    PurchaseOffer,
    RestorePurchases,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::GetSubscriptionInfo,
        Action::GetOffers,
        Action::PurchaseOffer,
        Action::RestorePurchases,
    ];

    /// Action name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetSubscriptionInfo => "getSubscriptionInfo",
            Self::GetOffers => "getOffers",
            Self::PurchaseOffer => "purchaseOffer",
            Self::RestorePurchases => "restorePurchases",
        }
    }

    /// Qualified name used in argument errors and log fields.
    pub fn qualified_name(&self) -> &'static str {
        match self {
            Self::GetSubscriptionInfo => "CQMEntitlement.getSubscriptionInfo",
            Self::GetOffers => "CQMEntitlement.getOffers",
            Self::PurchaseOffer => "CQMEntitlement.purchaseOffer",
            Self::RestorePurchases => "CQMEntitlement.restorePurchases",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entitlement action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}
