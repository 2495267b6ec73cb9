//! Registered subnet record.

use super::{AccessibilityClass, NetworkBlock};
use serde::{Deserialize, Serialize};

/// One realised subnet: a block placed in a zone, belonging to a group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubnetRecord {
    /// CIDR block of the subnet.
    pub block: NetworkBlock,
    /// Availability zone the subnet lives in.
    pub zone: String,
    /// Reachability class.
    pub class: AccessibilityClass,
    /// Subnet group (tier) name.
    pub group: String,
}

impl SubnetRecord {
    /// Create a record.
    pub fn new(
        block: NetworkBlock,
        zone: impl Into<String>,
        class: AccessibilityClass,
        group: impl Into<String>,
    ) -> SubnetRecord {
        SubnetRecord {
            block,
            zone: zone.into(),
            class,
            group: group.into(),
        }
    }

    /// Identifier unique within a network: `group/zone`.
    pub fn id(&self) -> String {
        format!("{}/{}", self.group, self.zone)
    }

    /// `true` for subnets routed through the shared gateway.
    pub fn is_public(&self) -> bool {
        self.class == AccessibilityClass::Public
    }
}
