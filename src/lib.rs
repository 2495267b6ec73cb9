//! Tiered IPv4 subnet planning.
//!
//! Carves a root block into named tiers and each tier into one subnet per
//! availability zone, then registers the subnets in a network that locks
//! itself once derived state is read.
//!
//! ```
//! use tiered_subnet_planner::allocation::{AddressSpace, NoPool, TieredAllocator};
//! use tiered_subnet_planner::models::{AccessibilityClass, PlacementRequest, Tier};
//! use tiered_subnet_planner::plan_network;
//!
//! let tiers = vec![
//!     Tier::new("public", AccessibilityClass::Public),
//!     Tier::new("private", AccessibilityClass::PrivateWithEgress),
//! ];
//! let requests = vec![
//!     PlacementRequest::new("public", "az1"),
//!     PlacementRequest::new("private", "az1"),
//! ];
//! let allocator = TieredAllocator::new(AddressSpace::cidr("10.0.0.0/16").unwrap());
//! let (allocation, network) =
//!     plan_network("demo", &allocator, &tiers, &requests, &mut NoPool).unwrap();
//! assert_eq!(allocation.block_for("private", "az1").unwrap().to_string(), "10.0.128.0/17");
//! assert_eq!(network.internet_gateway_id(), Some("demo-igw"));
//! ```

pub mod allocation;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
pub mod network;
pub mod output;

use allocation::{ConcreteAllocation, PoolManager, TieredAllocator};
use input::PlanFile;
use models::{PlacementRequest, Tier};
use network::{NetworkBuilder, NetworkContainer};

pub use error::{ErrorKind, PlanError, Result};

/// Allocate `tiers`/`requests`, resolve the plan through `pools` and build
/// the locked network holding one subnet per realised (tier, zone).
pub fn plan_network<P: PoolManager + ?Sized>(
    name: &str,
    allocator: &TieredAllocator,
    tiers: &[Tier],
    requests: &[PlacementRequest],
    pools: &mut P,
) -> Result<(ConcreteAllocation, NetworkContainer)> {
    let plan = allocator.allocate(tiers, requests)?;
    let allocation = plan.resolve(pools)?;
    let mut builder = NetworkBuilder::new(name, allocator.root().clone());
    builder.add_allocation(&allocation)?;
    Ok((allocation, builder.build()))
}

/// Run [`plan_network`] for a loaded plan file, using its offline pools.
pub fn plan_from_file(plan: &PlanFile) -> Result<(ConcreteAllocation, NetworkContainer)> {
    let mut pools = plan.pool_manager();
    plan_network(
        &plan.name,
        &plan.allocator(),
        &plan.tiers,
        &plan.placements,
        &mut pools,
    )
}
