//! # Identity & Policy Gate
//!
//! Evaluates the caller's organisation and signed attributes against the
//! access rule of the operation being invoked.
//!
//! | Operation class | Required org | Required attribute |
//! |-----------------|--------------|--------------------|
//! | `Public` | any | none |
//! | `InfraAdministration` | railway | `role = infraController` |
//! | `RailwayRead` | railway | none |
//! | `TrainArbitration` | railway | none |
//! | `VehicleOccupancy` | vehicles | non-empty `licensePlate` |
//!
//! Authorization is always evaluated before any entity is read or written.

use crate::config::ContractConfig;
use crate::ports::outbound::ClientIdentity;

/// Access class an operation belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationClass {
    /// Existence checks and crossing reads.
    Public,
    /// Create/update/delete of crossings and trains.
    InfraAdministration,
    /// Reading train records.
    RailwayRead,
    /// Train request/release.
    TrainArbitration,
    /// Vehicle slot request/release and occupancy reads.
    VehicleOccupancy,
}

/// Rule evaluated for an operation class.
#[derive(Clone, Debug, PartialEq, Eq)]
enum AccessRule<'a> {
    Anyone,
    Org(&'a str),
    OrgWithAttribute {
        org: &'a str,
        name: &'a str,
        value: &'a str,
    },
    OrgWithPresentAttribute {
        org: &'a str,
        name: &'a str,
    },
}

/// The contract's access policy, bound to configured organisation ids.
#[derive(Clone, Debug)]
pub struct AccessPolicy {
    config: ContractConfig,
}

impl AccessPolicy {
    /// Builds the policy table from configuration.
    #[must_use]
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }

    fn rule(&self, class: OperationClass) -> AccessRule<'_> {
        let c = &self.config;
        match class {
            OperationClass::Public => AccessRule::Anyone,
            OperationClass::InfraAdministration => AccessRule::OrgWithAttribute {
                org: &c.railway_msp,
                name: &c.role_attribute,
                value: &c.infra_controller_role,
            },
            OperationClass::RailwayRead | OperationClass::TrainArbitration => {
                AccessRule::Org(&c.railway_msp)
            }
            OperationClass::VehicleOccupancy => AccessRule::OrgWithPresentAttribute {
                org: &c.vehicles_msp,
                name: &c.license_plate_attribute,
            },
        }
    }

    /// Returns true if `identity` may invoke an operation of `class`.
    #[must_use]
    pub fn authorize(&self, class: OperationClass, identity: &dyn ClientIdentity) -> bool {
        match self.rule(class) {
            AccessRule::Anyone => true,
            AccessRule::Org(org) => identity.msp_id() == org,
            AccessRule::OrgWithAttribute { org, name, value } => {
                identity.msp_id() == org && identity.has_attribute(name, Some(value))
            }
            AccessRule::OrgWithPresentAttribute { org, name } => {
                identity.msp_id() == org && identity.has_attribute(name, None)
            }
        }
    }

    /// The caller-bound key for vehicle records (the license plate).
    #[must_use]
    pub fn vehicle_key(&self, identity: &dyn ClientIdentity) -> Option<String> {
        identity
            .attribute_value(&self.config.license_plate_attribute)
            .filter(|plate| !plate.is_empty())
    }

    /// Private collection holding vehicle records.
    #[must_use]
    pub fn private_collection(&self) -> &str {
        &self.config.private_collection
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(ContractConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
