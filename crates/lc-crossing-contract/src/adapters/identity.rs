//! Static Client Identity Adapter
//!
//! Identity with a fixed organisation and attribute set, as a certificate
//! authority would have issued it.

use crate::config::ContractConfig;
use crate::ports::outbound::ClientIdentity;
use std::collections::HashMap;

/// Caller identity with fixed attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticIdentity {
    msp_id: String,
    attributes: HashMap<String, String>,
}

impl StaticIdentity {
    /// Identity in `msp_id` with no attributes.
    pub fn new(msp_id: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            attributes: HashMap::new(),
        }
    }

    /// Adds a signed attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Railway user allowed to administer crossings and trains.
    pub fn infra_controller() -> Self {
        let config = ContractConfig::default();
        Self::new(config.railway_msp).with_attribute(config.role_attribute, config.infra_controller_role)
    }

    /// Railway user without an administrative role (train operator).
    pub fn railway_operator() -> Self {
        Self::new(ContractConfig::default().railway_msp)
    }

    /// Road vehicle identified by its license plate.
    pub fn vehicle(plate: &str) -> Self {
        let config = ContractConfig::default();
        Self::new(config.vehicles_msp).with_attribute(config.license_plate_attribute, plate)
    }
}

impl ClientIdentity for StaticIdentity {
    fn msp_id(&self) -> &str {
        &self.msp_id
    }

    fn attribute_value(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }
}
