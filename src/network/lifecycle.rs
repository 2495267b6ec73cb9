//! Network that locks itself on first read.
//!
//! [`Network`] accepts subnets until any derived state is read. The first read
//! builds the [`NetworkContainer`] once; later additions fail.

use super::builder::NetworkBuilder;
use super::container::{NetworkContainer, Route};
use super::selector::SubnetSelection;
use crate::allocation::{AddressSpace, ConcreteAllocation};
use crate::error::{PlanError, Result};
use crate::models::{AccessibilityClass, SubnetRecord};
use std::cell::OnceCell;

/// Unlocked until the first read, locked afterwards.
#[derive(Debug)]
pub struct Network {
    builder: NetworkBuilder,
    locked: OnceCell<NetworkContainer>,
}

impl Network {
    /// Empty, unlocked network.
    pub fn new(name: impl Into<String>, root: AddressSpace) -> Network {
        Network::from_builder(NetworkBuilder::new(name, root))
    }

    /// Unlocked network starting from an existing builder.
    pub fn from_builder(builder: NetworkBuilder) -> Network {
        Network {
            builder,
            locked: OnceCell::new(),
        }
    }

    /// `true` once any derived state has been read.
    pub fn is_locked(&self) -> bool {
        self.locked.get().is_some()
    }

    /// Register a subnet while the network is unlocked.
    pub fn add_subnet(&mut self, record: SubnetRecord) -> Result<&SubnetRecord> {
        if self.is_locked() {
            log::warn!("{}: rejected {} after lock", self.builder.name(), record.id());
            return Err(PlanError::NetworkLocked {
                network: self.builder.name().to_string(),
                addition: format!("subnet {} ({})", record.block, record.class),
            });
        }
        self.builder.add_subnet(record)
    }

    /// Register every subnet of `allocation` while the network is unlocked.
    pub fn add_allocation(&mut self, allocation: &ConcreteAllocation) -> Result<()> {
        if self.is_locked() {
            log::warn!(
                "{}: rejected allocation rooted at {} after lock",
                self.builder.name(),
                allocation.root
            );
            return Err(PlanError::NetworkLocked {
                network: self.builder.name().to_string(),
                addition: format!("allocation rooted at {}", allocation.root),
            });
        }
        self.builder.add_allocation(allocation)
    }

    /// Lock (if not already) and return the frozen network.
    pub fn container(&self) -> &NetworkContainer {
        self.locked.get_or_init(|| self.builder.clone().build())
    }

    /// Default selection class. Locks the network.
    pub fn default_class(&self) -> AccessibilityClass {
        self.container().default_class()
    }

    /// Shared gateway id. Locks the network.
    pub fn internet_gateway_id(&self) -> Option<&str> {
        self.container().internet_gateway_id()
    }

    /// Default routes. Locks the network.
    pub fn routes(&self) -> &[Route] {
        self.container().routes()
    }

    /// Subnet query. Locks the network.
    pub fn select(&self, selection: &SubnetSelection) -> Result<Vec<&SubnetRecord>> {
        self.container().select(selection)
    }

    /// Consume the network, locking it if needed.
    pub fn into_container(self) -> NetworkContainer {
        match self.locked.into_inner() {
            Some(container) => container,
            None => self.builder.build(),
        }
    }
}
