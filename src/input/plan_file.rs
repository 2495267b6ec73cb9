//! JSON plan files.

use crate::allocation::{AddressSpace, StaticPool, TieredAllocator};
use crate::models::{NetworkBlock, PlacementRequest, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;

/// Everything needed to allocate and build one network.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlanFile {
    /// Network name.
    pub name: String,
    /// Literal root (`{"cidr": ...}`) or pool reference (`{"pool": ..., "prefix_length": ...}`).
    pub root: AddressSpace,
    /// Mask applied to every tier block instead of the natural one.
    #[serde(default)]
    pub tier_mask: Option<u8>,
    /// Tiers in allocation order.
    pub tiers: Vec<Tier>,
    /// One entry per wanted (tier, zone) subnet.
    #[serde(default)]
    pub placements: Vec<PlacementRequest>,
    /// Offline pool ranges used to resolve a pooled root.
    #[serde(default)]
    pub pools: BTreeMap<String, NetworkBlock>,
}

impl PlanFile {
    /// Parse a plan from JSON, reporting the path of a bad field.
    ///
    /// A pooled root is checked like [`AddressSpace::pool`].
    pub fn from_json(json: &str) -> Result<PlanFile, Box<dyn Error>> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let plan: PlanFile = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| format!("Error parsing plan: path={} error={}", e.path(), e))?;
        if let AddressSpace::Pooled(reference) = &plan.root {
            AddressSpace::pool(reference.pool.clone(), reference.prefix_length)?;
        }
        Ok(plan)
    }

    /// Read and parse a plan file.
    pub fn load(path: &str) -> Result<PlanFile, Box<dyn Error>> {
        log::info!("Reading plan file: {path}");
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading plan file {path}: {e}"))?;
        let plan = PlanFile::from_json(&json)?;
        log::debug!(
            "plan '{}': {} tiers, {} placements",
            plan.name,
            plan.tiers.len(),
            plan.placements.len()
        );
        Ok(plan)
    }

    /// Allocator configured from this plan.
    pub fn allocator(&self) -> TieredAllocator {
        TieredAllocator::new(self.root.clone()).with_tier_mask(self.tier_mask)
    }

    /// Pool manager serving the plan's offline pool ranges.
    pub fn pool_manager(&self) -> StaticPool {
        self.pools
            .iter()
            .fold(StaticPool::new(), |pools, (name, range)| {
                pools.with_pool(name.clone(), *range)
            })
    }
}
