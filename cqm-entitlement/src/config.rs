//! Configuration for the entitlement facade.

use serde::{Deserialize, Serialize};

use crate::SERVICE_NAME;

/// Name of the platform runtime's own readiness signal.
pub const PLATFORM_READY_SIGNAL: &str = "onPlatformReady";

/// Name of the signal fired once the entitlement subsystem is usable.
pub const ENTITLEMENT_READY_SIGNAL: &str = "onEntitlementInfoReady";

/// Names the facade uses when talking to the host.
///
/// The defaults match what the native counterparts expect; override them only
/// when embedding into a host that registers its signals under other names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementConfig {
    /// Native subsystem addressed by every request.
    #[serde(default = "default_service")]
    pub service: String,

    /// Signal fired by the host when its runtime is up.
    #[serde(default = "default_platform_ready_signal")]
    pub platform_ready_signal: String,

    /// Signal the facade fires once entitlements are ready.
    #[serde(default = "default_entitlement_ready_signal")]
    pub entitlement_ready_signal: String,
}

fn default_service() -> String {
    SERVICE_NAME.to_string()
}

fn default_platform_ready_signal() -> String {
    PLATFORM_READY_SIGNAL.to_string()
}

fn default_entitlement_ready_signal() -> String {
    ENTITLEMENT_READY_SIGNAL.to_string()
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
            platform_ready_signal: default_platform_ready_signal(),
            entitlement_ready_signal: default_entitlement_ready_signal(),
        }
    }
}

impl EntitlementConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EntitlementConfig::default();
        assert_eq!(config.service, "CQMEntitlement");
        assert_eq!(config.platform_ready_signal, "onPlatformReady");
        assert_eq!(config.entitlement_ready_signal, "onEntitlementInfoReady");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EntitlementConfig::from_json(r#"{"platform_ready_signal":"onDeviceReady"}"#)
            .unwrap();
        assert_eq!(config.platform_ready_signal, "onDeviceReady");
        assert_eq!(config.service, "CQMEntitlement");
    }

    #[test]
    fn test_invalid_json() {
        assert!(EntitlementConfig::from_json("not json").is_err());
    }
}
