//! Contract configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Organisation ids, attribute names and collection names the contract's
/// access policy and private records depend on.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContractConfig {
    /// MSP id of the railway company (infrastructure and trains).
    pub railway_msp: String,

    /// MSP id of the road vehicle organisation.
    pub vehicles_msp: String,

    /// Attribute carrying a railway user's role.
    pub role_attribute: String,

    /// Role value allowed to administer crossings and trains.
    pub infra_controller_role: String,

    /// Attribute carrying a vehicle's license plate.
    pub license_plate_attribute: String,

    /// Private collection holding per-vehicle occupancy records.
    pub private_collection: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            railway_msp: "RailwayCompanyMSP".to_string(),
            vehicles_msp: "VehiclesMSP".to_string(),
            role_attribute: "role".to_string(),
            infra_controller_role: "infraController".to_string(),
            license_plate_attribute: "licensePlate".to_string(),
            private_collection: "RailwayPrivateCollection".to_string(),
        }
    }
}

impl ContractConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LC_RAILWAY_MSP`: Railway organisation (default: RailwayCompanyMSP)
    /// - `LC_VEHICLES_MSP`: Vehicle organisation (default: VehiclesMSP)
    /// - `LC_INFRA_ROLE`: Administrator role value (default: infraController)
    /// - `LC_PRIVATE_COLLECTION`: Occupancy collection (default: RailwayPrivateCollection)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            railway_msp: env::var("LC_RAILWAY_MSP").unwrap_or(defaults.railway_msp),
            vehicles_msp: env::var("LC_VEHICLES_MSP").unwrap_or(defaults.vehicles_msp),
            role_attribute: defaults.role_attribute,
            infra_controller_role: env::var("LC_INFRA_ROLE")
                .unwrap_or(defaults.infra_controller_role),
            license_plate_attribute: defaults.license_plate_attribute,
            private_collection: env::var("LC_PRIVATE_COLLECTION")
                .unwrap_or(defaults.private_collection),
        }
    }
}
