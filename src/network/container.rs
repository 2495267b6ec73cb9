//! Locked network: a frozen subnet table with its gateway and routes.

use super::selector::{select, SubnetSelection};
use crate::allocation::AddressSpace;
use crate::error::Result;
use crate::models::{AccessibilityClass, NetworkBlock, SubnetRecord};
use itertools::Itertools;
use serde::Serialize;

/// Shared internet gateway, present when the network has public subnets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gateway {
    /// Gateway identifier, derived from the network name.
    pub id: String,
}

/// Default route of a public subnet through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Subnet the route belongs to.
    pub subnet_id: String,
    /// Always `0.0.0.0/0`.
    pub destination: NetworkBlock,
    /// Target gateway.
    pub gateway_id: String,
}

/// Immutable network produced by [`NetworkBuilder::build`](super::NetworkBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkContainer {
    name: String,
    root: AddressSpace,
    subnets: Vec<SubnetRecord>,
    gateway: Option<Gateway>,
    routes: Vec<Route>,
}

impl NetworkContainer {
    pub(super) fn new(
        name: String,
        root: AddressSpace,
        subnets: Vec<SubnetRecord>,
        gateway: Option<Gateway>,
        routes: Vec<Route>,
    ) -> NetworkContainer {
        NetworkContainer {
            name,
            root,
            subnets,
            gateway,
            routes,
        }
    }

    /// Network name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root address space.
    pub fn root(&self) -> &AddressSpace {
        &self.root
    }

    /// Every subnet, in registration order.
    pub fn subnets(&self) -> &[SubnetRecord] {
        &self.subnets
    }

    /// Subnet with the given `group/zone` id.
    pub fn subnet(&self, id: &str) -> Option<&SubnetRecord> {
        self.subnets.iter().find(|s| s.id() == id)
    }

    /// The shared gateway, if any subnet is public.
    pub fn internet_gateway(&self) -> Option<&Gateway> {
        self.gateway.as_ref()
    }

    /// Identifier of the shared gateway.
    pub fn internet_gateway_id(&self) -> Option<&str> {
        self.gateway.as_ref().map(|gw| gw.id.as_str())
    }

    /// Default routes, one per public subnet.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Class used by selections that name no class, group or subnet list:
    /// private-with-egress if any, else isolated if any, else public.
    pub fn default_class(&self) -> AccessibilityClass {
        let has = |class: AccessibilityClass| self.subnets.iter().any(|s| s.class == class);
        if has(AccessibilityClass::PrivateWithEgress) {
            AccessibilityClass::PrivateWithEgress
        } else if has(AccessibilityClass::Isolated) {
            AccessibilityClass::Isolated
        } else {
            AccessibilityClass::Public
        }
    }

    /// Subnets matching `selection`, in registration order.
    pub fn select(&self, selection: &SubnetSelection) -> Result<Vec<&SubnetRecord>> {
        select(&self.subnets, &self.default_class(), selection)
    }

    fn of_class(&self, class: AccessibilityClass) -> Vec<&SubnetRecord> {
        self.subnets.iter().filter(|s| s.class == class).collect()
    }

    /// Public subnets.
    pub fn public_subnets(&self) -> Vec<&SubnetRecord> {
        self.of_class(AccessibilityClass::Public)
    }

    /// Private subnets with egress.
    pub fn private_subnets(&self) -> Vec<&SubnetRecord> {
        self.of_class(AccessibilityClass::PrivateWithEgress)
    }

    /// Isolated subnets.
    pub fn isolated_subnets(&self) -> Vec<&SubnetRecord> {
        self.of_class(AccessibilityClass::Isolated)
    }

    /// Distinct zones in registration order.
    pub fn availability_zones(&self) -> Vec<&str> {
        self.subnets.iter().map(|s| s.zone.as_str()).unique().collect()
    }

    /// Distinct group names in registration order.
    pub fn group_names(&self) -> Vec<&str> {
        self.subnets.iter().map(|s| s.group.as_str()).unique().collect()
    }
}
