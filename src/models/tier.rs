//! Tiers, accessibility classes and placement requests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How reachable a subnet is from outside the network.
///
/// The three well-known classes drive gateway materialisation and the default
/// selection; anything else is carried through as [`AccessibilityClass::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccessibilityClass {
    /// Reachable from the internet through the shared gateway.
    Public,
    /// Private, with outbound-only egress.
    PrivateWithEgress,
    /// No route in or out of the network.
    Isolated,
    /// Any other, caller-defined class.
    Custom(String),
}

impl AccessibilityClass {
    /// The name used in plan files and output.
    pub fn as_str(&self) -> &str {
        match self {
            AccessibilityClass::Public => "Public",
            AccessibilityClass::PrivateWithEgress => "PrivateWithEgress",
            AccessibilityClass::Isolated => "Isolated",
            AccessibilityClass::Custom(name) => name,
        }
    }
}

impl From<String> for AccessibilityClass {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Public" => AccessibilityClass::Public,
            "PrivateWithEgress" => AccessibilityClass::PrivateWithEgress,
            "Isolated" => AccessibilityClass::Isolated,
            _ => AccessibilityClass::Custom(s),
        }
    }
}

impl From<AccessibilityClass> for String {
    fn from(class: AccessibilityClass) -> Self {
        class.as_str().to_string()
    }
}

impl FromStr for AccessibilityClass {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AccessibilityClass::from(s.to_string()))
    }
}

impl fmt::Display for AccessibilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named slice of the root block.
///
/// Tiers are partitioned in the order they are given; the same list always
/// yields the same blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Unique name within a plan, also used as the subnet group name.
    pub name: String,
    /// Class shared by every subnet of the tier.
    pub class: AccessibilityClass,
    /// Subnet mask used for the tier's zones when no placement sets one.
    #[serde(default)]
    pub mask: Option<u8>,
    /// Reserve the tier's address range without creating subnets in it.
    #[serde(default)]
    pub reserved: bool,
}

impl Tier {
    /// A tier with the natural subnet mask.
    pub fn new(name: impl Into<String>, class: AccessibilityClass) -> Tier {
        Tier {
            name: name.into(),
            class,
            mask: None,
            reserved: false,
        }
    }

    /// Set the default subnet mask for this tier's zones.
    pub fn with_mask(mut self, mask: u8) -> Tier {
        self.mask = Some(mask);
        self
    }

    /// Mark the tier as reserved.
    pub fn reserved(mut self) -> Tier {
        self.reserved = true;
        self
    }
}

/// Ask for one subnet of `tier` in `zone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    /// Tier the subnet belongs to.
    pub tier: String,
    /// Availability zone identifier.
    pub zone: String,
    /// Explicit subnet mask; every placement of a tier must agree on it.
    #[serde(default)]
    pub mask: Option<u8>,
}

impl PlacementRequest {
    /// A placement using the tier's default mask.
    pub fn new(tier: impl Into<String>, zone: impl Into<String>) -> PlacementRequest {
        PlacementRequest {
            tier: tier.into(),
            zone: zone.into(),
            mask: None,
        }
    }

    /// Set an explicit subnet mask.
    pub fn with_mask(mut self, mask: u8) -> PlacementRequest {
        self.mask = Some(mask);
        self
    }
}
