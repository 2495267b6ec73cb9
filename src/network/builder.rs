//! Mutable phase of a network: subnet registration.

use super::container::{Gateway, NetworkContainer, Route};
use crate::allocation::{AddressSpace, ConcreteAllocation};
use crate::error::{PlanError, Result};
use crate::models::{NetworkBlock, SubnetRecord};
use colored::Colorize;

/// Collects subnets; [`NetworkBuilder::build`] freezes them into a
/// [`NetworkContainer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBuilder {
    name: String,
    root: AddressSpace,
    subnets: Vec<SubnetRecord>,
}

impl NetworkBuilder {
    /// Empty network named `name` over `root`.
    pub fn new(name: impl Into<String>, root: AddressSpace) -> NetworkBuilder {
        NetworkBuilder {
            name: name.into(),
            root,
            subnets: Vec::new(),
        }
    }

    /// Network name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subnets registered so far, in registration order.
    pub fn subnets(&self) -> &[SubnetRecord] {
        &self.subnets
    }

    /// Register a subnet. A group may hold only one subnet per zone.
    pub fn add_subnet(&mut self, record: SubnetRecord) -> Result<&SubnetRecord> {
        if self
            .subnets
            .iter()
            .any(|s| s.group == record.group && s.zone == record.zone)
        {
            log::warn!("duplicate subnet {}", record.id());
            return Err(PlanError::DuplicateSubnet {
                group: record.group,
                zone: record.zone,
            });
        }
        log::debug!(
            "{}: add subnet {} {} ({})",
            self.name,
            record.id(),
            record.block,
            record.class
        );
        self.subnets.push(record);
        Ok(&self.subnets[self.subnets.len() - 1])
    }

    /// Register one subnet per realised (tier, zone) of `allocation`, tier by
    /// tier in plan order.
    ///
    /// Nothing is registered if any of the subnets would be rejected.
    pub fn add_allocation(&mut self, allocation: &ConcreteAllocation) -> Result<()> {
        let mut staged = self.clone();
        for (tier, zone, block) in allocation.subnets() {
            staged.add_subnet(SubnetRecord::new(block, zone, tier.class.clone(), &tier.name))?;
        }
        *self = staged;
        Ok(())
    }

    /// Freeze the subnet table and materialise the shared gateway and one
    /// default route per public subnet.
    pub fn build(self) -> NetworkContainer {
        let gateway = self
            .subnets
            .iter()
            .any(SubnetRecord::is_public)
            .then(|| Gateway {
                id: format!("{}-igw", self.name),
            });
        let routes: Vec<Route> = match &gateway {
            Some(gw) => self
                .subnets
                .iter()
                .filter(|s| s.is_public())
                .map(|s| Route {
                    subnet_id: s.id(),
                    destination: NetworkBlock::ANY,
                    gateway_id: gw.id.clone(),
                })
                .collect(),
            None => Vec::new(),
        };
        log::info!(
            "locked network {} with {} subnets, gateway={}, {} default routes",
            self.name.bold(),
            self.subnets.len(),
            gateway.as_ref().map_or("none", |gw| gw.id.as_str()).green(),
            routes.len()
        );
        NetworkContainer::new(self.name, self.root, self.subnets, gateway, routes)
    }
}
