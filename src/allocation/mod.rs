//! Address-space allocation.
//!
//! - [`partition`] - equal-size division of a block, free-space discovery
//! - [`strategy`] - direct and pooled strategies, plans and their resolution
//! - [`tiered`] - the tier then zone allocator

mod partition;
mod strategy;
mod tiered;

pub use partition::{child_prefix_length, divide, divide_cidr, free_blocks, natural_mask};
pub use strategy::{
    AddressSpace, AllocationPlan, ConcreteAllocation, DeferredBlock, NoPool, ParentRef,
    PlannedBlock, PoolManager, PoolReference, PoolRequest, StaticPool, TierAllocation,
};
pub use tiered::TieredAllocator;
