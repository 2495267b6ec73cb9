//! Direct and pooled allocation strategies.
//!
//! A direct strategy owns a literal root block and divides it in-process. A
//! pooled strategy only knows a pool id and the prefix length to ask for; it
//! records one [`PoolRequest`] per division and leaves the addresses to a
//! [`PoolManager`] when the [`AllocationPlan`] is resolved. Both run the same
//! prefix-length validation through [`child_prefix_length`].

use super::partition::{child_prefix_length, divide};
use crate::error::{PlanError, Result};
use crate::models::{AccessibilityClass, NetworkBlock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reference to an external address pool and the prefix length to request from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolReference {
    /// Pool identifier understood by the pool manager.
    pub pool: String,
    /// Prefix length of the root block to request.
    pub prefix_length: u8,
}

/// Where the root block comes from. Chosen once per network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressSpace {
    /// A literal block divided in-process.
    Direct {
        /// The root block.
        cidr: NetworkBlock,
    },
    /// A block handed out later by an address pool.
    Pooled(PoolReference),
}

impl AddressSpace {
    /// Direct strategy over a CIDR literal, validated here.
    pub fn cidr(cidr: &str) -> Result<AddressSpace> {
        Ok(AddressSpace::Direct {
            cidr: NetworkBlock::parse(cidr)?,
        })
    }

    /// Pooled strategy asking `pool` for a `/prefix_length` root.
    pub fn pool(pool: impl Into<String>, prefix_length: u8) -> Result<AddressSpace> {
        if prefix_length > crate::config::MAX_LENGTH {
            return Err(PlanError::MaskOutOfRange {
                mask: prefix_length,
            });
        }
        Ok(AddressSpace::Pooled(PoolReference {
            pool: pool.into(),
            prefix_length,
        }))
    }

    /// The root as a plannable block.
    pub fn root(&self) -> PlannedBlock {
        match self {
            AddressSpace::Direct { cidr } => PlannedBlock::Concrete(*cidr),
            AddressSpace::Pooled(reference) => PlannedBlock::Pool(reference.clone()),
        }
    }
}

/// Parent of a pool request: the pool itself, or a block handed out by an
/// earlier request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentRef {
    /// The root block allocated from this pool.
    Pool(PoolReference),
    /// Child `index` of request number `request`.
    Request {
        /// Index of the parent request in [`AllocationPlan::requests`].
        request: usize,
        /// Child index within that request.
        index: u32,
    },
}

/// One level of division to be carried out once addresses are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRequest {
    /// Block to divide.
    pub parent: ParentRef,
    /// Number of children.
    pub child_count: u32,
    /// Prefix length of every child.
    pub child_prefix_length: u8,
}

/// Handle for a block that exists only once the plan is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeferredBlock {
    /// Request that produces the block.
    pub request: usize,
    /// Position among that request's children.
    pub index: u32,
    /// Prefix length the block will have.
    pub prefix_length: u8,
}

/// A block in a plan: already known, or still to come from a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannedBlock {
    /// Literal block.
    Concrete(NetworkBlock),
    /// Root block to be allocated from a pool.
    Pool(PoolReference),
    /// Child of a pool request.
    Deferred(DeferredBlock),
}

impl PlannedBlock {
    /// Prefix length, known in every case.
    pub fn prefix_length(&self) -> u8 {
        match self {
            PlannedBlock::Concrete(block) => block.mask(),
            PlannedBlock::Pool(reference) => reference.prefix_length,
            PlannedBlock::Deferred(deferred) => deferred.prefix_length,
        }
    }

    /// The literal block, if already known.
    pub fn concrete(&self) -> Option<NetworkBlock> {
        match self {
            PlannedBlock::Concrete(block) => Some(*block),
            _ => None,
        }
    }

    /// Human-readable name used in errors and logs.
    pub fn label(&self) -> String {
        match self {
            PlannedBlock::Concrete(block) => block.to_string(),
            PlannedBlock::Pool(reference) => {
                format!("pool '{}' /{}", reference.pool, reference.prefix_length)
            }
            PlannedBlock::Deferred(d) => {
                format!("pooled block {}.{} /{}", d.request, d.index, d.prefix_length)
            }
        }
    }
}

impl std::fmt::Display for PlannedBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Divides planned blocks, eagerly for literal parents and by recording
/// requests for pooled ones.
#[derive(Debug, Default)]
pub(crate) struct Partitioner {
    requests: Vec<PoolRequest>,
}

impl Partitioner {
    pub(crate) fn partition(
        &mut self,
        parent: &PlannedBlock,
        count: u32,
        explicit_mask: Option<u8>,
    ) -> Result<Vec<PlannedBlock>> {
        let parent_ref = match parent {
            PlannedBlock::Concrete(block) => {
                return Ok(divide(*block, count, explicit_mask)?
                    .into_iter()
                    .map(PlannedBlock::Concrete)
                    .collect());
            }
            PlannedBlock::Pool(reference) => ParentRef::Pool(reference.clone()),
            PlannedBlock::Deferred(d) => ParentRef::Request {
                request: d.request,
                index: d.index,
            },
        };
        let prefix_length = child_prefix_length(
            &parent.label(),
            parent.prefix_length(),
            count,
            explicit_mask,
        )?;
        let request = self.requests.len();
        log::debug!("request #{request}: divide {parent} into {count} x /{prefix_length}");
        self.requests.push(PoolRequest {
            parent: parent_ref,
            child_count: count,
            child_prefix_length: prefix_length,
        });
        Ok((0..count)
            .map(|index| {
                PlannedBlock::Deferred(DeferredBlock {
                    request,
                    index,
                    prefix_length,
                })
            })
            .collect())
    }

    pub(crate) fn into_requests(self) -> Vec<PoolRequest> {
        self.requests
    }
}

/// Block assignment for one tier, and for each zone inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAllocation<B> {
    /// Tier name, also the subnet group name.
    pub name: String,
    /// Accessibility class of the tier's subnets.
    pub class: AccessibilityClass,
    /// Reserved tiers hold space but no zones.
    pub reserved: bool,
    /// Block assigned to the whole tier.
    pub block: B,
    /// Zone blocks in order of first request.
    pub zones: Vec<(String, B)>,
}

impl<B> TierAllocation<B> {
    /// Block assigned to `zone`, if the tier has one.
    pub fn zone(&self, zone: &str) -> Option<&B> {
        self.zones.iter().find(|(z, _)| z == zone).map(|(_, b)| b)
    }

    fn try_map<C>(&self, mut f: impl FnMut(&B) -> Result<C>) -> Result<TierAllocation<C>> {
        Ok(TierAllocation {
            name: self.name.clone(),
            class: self.class.clone(),
            reserved: self.reserved,
            block: f(&self.block)?,
            zones: self
                .zones
                .iter()
                .map(|(zone, b)| Ok((zone.clone(), f(b)?)))
                .collect::<Result<_>>()?,
        })
    }
}

/// Output of the tiered allocator: tier and zone blocks plus the pool
/// requests still to be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Root of the plan.
    pub root: PlannedBlock,
    /// Tiers in plan order.
    pub tiers: Vec<TierAllocation<PlannedBlock>>,
    /// Pool requests, parents always before their children. Empty for direct plans.
    pub requests: Vec<PoolRequest>,
}

impl AllocationPlan {
    /// Allocation for `tier`.
    pub fn tier(&self, tier: &str) -> Option<&TierAllocation<PlannedBlock>> {
        self.tiers.iter().find(|t| t.name == tier)
    }

    /// Block planned for `zone` of `tier`.
    pub fn block_for(&self, tier: &str, zone: &str) -> Option<&PlannedBlock> {
        self.tier(tier).and_then(|t| t.zone(zone))
    }

    /// `true` when every block is already literal.
    pub fn is_concrete(&self) -> bool {
        self.requests.is_empty()
    }

    /// Resolve a plan that needs no pool manager.
    pub fn resolve_direct(&self) -> Result<ConcreteAllocation> {
        self.resolve(&mut NoPool)
    }

    /// Carry out every pool request and replace all handles with literal blocks.
    ///
    /// Answers from `pools` are checked for count, prefix length, containment
    /// and for children that are ascending and disjoint.
    pub fn resolve<P: PoolManager + ?Sized>(&self, pools: &mut P) -> Result<ConcreteAllocation> {
        let mut roots: HashMap<PoolReference, NetworkBlock> = HashMap::new();
        let mut resolved: Vec<Vec<NetworkBlock>> = Vec::with_capacity(self.requests.len());

        for (i, request) in self.requests.iter().enumerate() {
            let (pool, parent) = match &request.parent {
                ParentRef::Pool(reference) => {
                    (reference.pool.clone(), allocate_root(pools, &mut roots, reference)?)
                }
                ParentRef::Request { request: r, index } => {
                    let parent = resolved
                        .get(*r)
                        .and_then(|children| children.get(*index as usize))
                        .copied()
                        .ok_or_else(|| {
                            mismatch("plan", request_label(i), "parent request is not resolved")
                        })?;
                    (request_label(*r), parent)
                }
            };
            let children =
                pools.divide(parent, request.child_count, request.child_prefix_length)?;
            check_children(&pool, i, parent, request, &children)?;
            log::debug!("resolved request #{i}: {parent} -> {} blocks", children.len());
            resolved.push(children);
        }

        let mut lookup = |planned: &PlannedBlock| -> Result<NetworkBlock> {
            match planned {
                PlannedBlock::Concrete(block) => Ok(*block),
                PlannedBlock::Pool(reference) => allocate_root(pools, &mut roots, reference),
                PlannedBlock::Deferred(d) => resolved
                    .get(d.request)
                    .and_then(|children| children.get(d.index as usize))
                    .copied()
                    .ok_or_else(|| {
                        mismatch(
                            "plan",
                            request_label(d.request),
                            "deferred block was never resolved",
                        )
                    }),
            }
        };

        let root = lookup(&self.root)?;
        let tiers = self
            .tiers
            .iter()
            .map(|t| t.try_map(&mut lookup))
            .collect::<Result<Vec<_>>>()?;
        log::info!(
            "resolved plan rooted at {root}: {} tiers, {} pool requests",
            tiers.len(),
            self.requests.len()
        );
        Ok(ConcreteAllocation { root, tiers })
    }
}

fn mismatch(pool: &str, subject: impl Into<String>, reason: impl Into<String>) -> PlanError {
    PlanError::PoolMismatch {
        pool: pool.to_string(),
        subject: subject.into(),
        reason: reason.into(),
    }
}

fn request_label(index: usize) -> String {
    format!("request #{index}")
}

fn root_label(prefix_length: u8) -> String {
    format!("root /{prefix_length}")
}

fn allocate_root<P: PoolManager + ?Sized>(
    pools: &mut P,
    roots: &mut HashMap<PoolReference, NetworkBlock>,
    reference: &PoolReference,
) -> Result<NetworkBlock> {
    if let Some(block) = roots.get(reference) {
        return Ok(*block);
    }
    let block = pools.allocate(&reference.pool, reference.prefix_length)?;
    if block.mask() != reference.prefix_length {
        return Err(mismatch(
            &reference.pool,
            root_label(reference.prefix_length),
            format!("got {block}"),
        ));
    }
    log::info!("pool '{}' allocated root {block}", reference.pool);
    roots.insert(reference.clone(), block);
    Ok(block)
}

fn check_children(
    pool: &str,
    request_index: usize,
    parent: NetworkBlock,
    request: &PoolRequest,
    children: &[NetworkBlock],
) -> Result<()> {
    if children.len() != request.child_count as usize {
        return Err(mismatch(
            pool,
            request_label(request_index),
            format!(
                "expected {} blocks, got {}",
                request.child_count,
                children.len()
            ),
        ));
    }
    if let Some(bad) = children
        .iter()
        .find(|c| c.mask() != request.child_prefix_length || !parent.contains_block(c))
    {
        return Err(mismatch(
            pool,
            request_label(request_index),
            format!(
                "block {bad} is not a /{} inside {parent}",
                request.child_prefix_length
            ),
        ));
    }
    if let Some(pair) = children
        .windows(2)
        .find(|w| w[0] >= w[1] || w[0].overlaps(&w[1]))
    {
        return Err(mismatch(
            pool,
            request_label(request_index),
            format!(
                "blocks {} and {} are not ascending and disjoint",
                pair[0], pair[1]
            ),
        ));
    }
    Ok(())
}

/// Fully resolved allocation: every tier and zone has a literal block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcreteAllocation {
    /// Root block.
    pub root: NetworkBlock,
    /// Tiers in plan order.
    pub tiers: Vec<TierAllocation<NetworkBlock>>,
}

impl ConcreteAllocation {
    /// Allocation for `tier`.
    pub fn tier(&self, tier: &str) -> Option<&TierAllocation<NetworkBlock>> {
        self.tiers.iter().find(|t| t.name == tier)
    }

    /// Block assigned to `zone` of `tier`.
    pub fn block_for(&self, tier: &str, zone: &str) -> Option<NetworkBlock> {
        self.tier(tier).and_then(|t| t.zone(zone)).copied()
    }

    /// Every `(tier, zone, block)` in tier then zone order.
    pub fn subnets(
        &self,
    ) -> impl Iterator<Item = (&TierAllocation<NetworkBlock>, &str, NetworkBlock)> {
        self.tiers
            .iter()
            .flat_map(|t| t.zones.iter().map(move |(zone, b)| (t, zone.as_str(), *b)))
    }
}

/// External address manager used to resolve pooled plans.
pub trait PoolManager {
    /// Hand out a `/prefix_length` block from `pool`.
    fn allocate(&mut self, pool: &str, prefix_length: u8) -> Result<NetworkBlock>;

    /// Split an allocated block into `count` children of `/prefix_length`.
    ///
    /// Defaults to the in-process partitioner, which matches how pool-backed
    /// subnets are laid out.
    fn divide(
        &mut self,
        parent: NetworkBlock,
        count: u32,
        prefix_length: u8,
    ) -> Result<Vec<NetworkBlock>> {
        divide(parent, count, Some(prefix_length))
    }
}

/// Pool manager for plans that must not contain pooled blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPool;

impl PoolManager for NoPool {
    fn allocate(&mut self, pool: &str, prefix_length: u8) -> Result<NetworkBlock> {
        Err(mismatch(
            pool,
            root_label(prefix_length),
            "no pool manager is available for a pooled plan",
        ))
    }
}

/// In-memory pool manager handing out consecutive aligned blocks from fixed ranges.
#[derive(Debug, Default, Clone)]
pub struct StaticPool {
    pools: HashMap<String, PoolRange>,
}

#[derive(Debug, Clone)]
struct PoolRange {
    range: NetworkBlock,
    next_candidate: u64,
}

impl StaticPool {
    /// Empty pool manager.
    pub fn new() -> StaticPool {
        StaticPool::default()
    }

    /// Register `pool` as backed by `range`.
    pub fn with_pool(mut self, pool: impl Into<String>, range: NetworkBlock) -> StaticPool {
        self.pools.insert(
            pool.into(),
            PoolRange {
                range,
                next_candidate: u64::from(range.addr()),
            },
        );
        self
    }
}

impl PoolManager for StaticPool {
    fn allocate(&mut self, pool: &str, prefix_length: u8) -> Result<NetworkBlock> {
        let entry = self
            .pools
            .get_mut(pool)
            .ok_or_else(|| mismatch(pool, root_label(prefix_length), "unknown pool"))?;
        let range = entry.range;
        if prefix_length < range.mask() {
            return Err(PlanError::MaskTooLarge {
                parent: format!("pool '{pool}' ({range})"),
                count: 1,
                requested: prefix_length,
                maximum: range.mask(),
            });
        }
        let size = crate::models::block_size(prefix_length)?;
        // Round the cursor up to the next boundary of the requested size.
        let start = entry.next_candidate.div_ceil(size) * size;
        let end = u64::from(range.addr()) + range.size();
        if start + size > end {
            return Err(PlanError::AddressSpaceExhausted {
                parent: format!("pool '{pool}' ({range})"),
                count: 1,
            });
        }
        entry.next_candidate = start + size;
        NetworkBlock::new(start as u32, prefix_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(s: &str) -> NetworkBlock {
        NetworkBlock::parse(s).unwrap()
    }

    #[test]
    fn test_direct_partition_is_eager() {
        let mut p = Partitioner::default();
        let root = AddressSpace::cidr("10.0.0.0/16").unwrap().root();
        let children = p.partition(&root, 2, None).unwrap();
        assert_eq!(
            children,
            vec![
                PlannedBlock::Concrete(block("10.0.0.0/17")),
                PlannedBlock::Concrete(block("10.0.128.0/17")),
            ]
        );
        assert!(p.into_requests().is_empty());
    }

    #[test]
    fn test_pooled_partition_records_request() {
        let mut p = Partitioner::default();
        let root = AddressSpace::pool("ipam-1", 16).unwrap().root();
        let children = p.partition(&root, 3, None).unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[2].prefix_length(), 18);
        assert_eq!(children[2].concrete(), None);

        let grandchildren = p.partition(&children[1], 2, Some(24)).unwrap();
        assert_eq!(grandchildren[0].prefix_length(), 24);

        let requests = p.into_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].child_count, 3);
        assert_eq!(
            requests[1].parent,
            ParentRef::Request {
                request: 0,
                index: 1
            }
        );
    }

    #[test]
    fn test_pooled_partition_validates_like_direct() {
        let mut p = Partitioner::default();
        let root = AddressSpace::pool("ipam-1", 16).unwrap().root();
        let err = p.partition(&root, 4, Some(17)).unwrap_err();
        assert!(matches!(
            err,
            PlanError::MaskTooLarge {
                requested: 17,
                maximum: 18,
                ..
            }
        ));
        assert!(matches!(
            p.partition(&root, 0, None),
            Err(PlanError::ZeroCount { .. })
        ));
    }

    #[test]
    fn test_pool_reference_prefix_checked() {
        assert_eq!(
            AddressSpace::pool("ipam-1", 40).unwrap_err(),
            PlanError::MaskOutOfRange { mask: 40 }
        );
    }

    #[test]
    fn test_static_pool_allocates_aligned_blocks() {
        let mut pools = StaticPool::new().with_pool("ipam-1", block("10.0.0.0/8"));
        assert_eq!(pools.allocate("ipam-1", 24).unwrap(), block("10.0.0.0/24"));
        assert_eq!(pools.allocate("ipam-1", 16).unwrap(), block("10.1.0.0/16"));
        assert_eq!(pools.allocate("ipam-1", 24).unwrap(), block("10.2.0.0/24"));
        assert!(matches!(
            pools.allocate("ipam-1", 4),
            Err(PlanError::MaskTooLarge { .. })
        ));
        assert!(matches!(
            pools.allocate("missing", 24),
            Err(PlanError::PoolMismatch { .. })
        ));
    }

    #[test]
    fn test_static_pool_exhausted() {
        let mut pools = StaticPool::new().with_pool("small", block("192.168.0.0/24"));
        pools.allocate("small", 25).unwrap();
        pools.allocate("small", 25).unwrap();
        assert!(matches!(
            pools.allocate("small", 25),
            Err(PlanError::AddressSpaceExhausted { .. })
        ));
    }

    #[test]
    fn test_no_pool_rejects_pooled_plan() {
        assert!(NoPool.allocate("ipam-1", 16).is_err());
    }

    struct WrongPool;

    impl PoolManager for WrongPool {
        fn allocate(&mut self, _pool: &str, _prefix_length: u8) -> Result<NetworkBlock> {
            Ok(NetworkBlock::parse("10.0.0.0/16").unwrap())
        }

        fn divide(
            &mut self,
            parent: NetworkBlock,
            count: u32,
            _prefix: u8,
        ) -> Result<Vec<NetworkBlock>> {
            // Ignores the requested prefix length.
            divide(parent, count, None)
        }
    }

    #[test]
    fn test_resolve_checks_pool_answers() {
        let plan = AllocationPlan {
            root: AddressSpace::pool("ipam-1", 16).unwrap().root(),
            tiers: vec![],
            requests: vec![PoolRequest {
                parent: ParentRef::Pool(PoolReference {
                    pool: "ipam-1".to_string(),
                    prefix_length: 16,
                }),
                child_count: 2,
                child_prefix_length: 20,
            }],
        };
        let err = plan.resolve(&mut WrongPool).unwrap_err();
        assert!(
            matches!(&err, PlanError::PoolMismatch { subject, .. } if subject == "request #0"),
            "{err}"
        );
    }

    /// Hands every child the first block of the parent.
    struct RepeatingPool;

    impl PoolManager for RepeatingPool {
        fn allocate(&mut self, _pool: &str, prefix_length: u8) -> Result<NetworkBlock> {
            NetworkBlock::new(0x0a00_0000, prefix_length)
        }

        fn divide(
            &mut self,
            parent: NetworkBlock,
            count: u32,
            prefix_length: u8,
        ) -> Result<Vec<NetworkBlock>> {
            Ok(vec![NetworkBlock::new(parent.addr(), prefix_length)?; count as usize])
        }
    }

    #[test]
    fn test_resolve_rejects_overlapping_children() {
        let mut p = Partitioner::default();
        let root = AddressSpace::pool("ipam-1", 16).unwrap().root();
        let tiers = p.partition(&root, 2, None).unwrap();
        let zones = p.partition(&tiers[0], 2, None).unwrap();
        let plan = AllocationPlan {
            root,
            tiers: vec![TierAllocation {
                name: "public".to_string(),
                class: AccessibilityClass::Public,
                reserved: false,
                block: tiers[0].clone(),
                zones: vec![
                    ("z1".to_string(), zones[0].clone()),
                    ("z2".to_string(), zones[1].clone()),
                ],
            }],
            requests: p.into_requests(),
        };
        let err = plan.resolve(&mut RepeatingPool).unwrap_err();
        assert!(
            matches!(&err, PlanError::PoolMismatch { subject, .. } if subject == "request #0"),
            "{err}"
        );
        assert!(err.to_string().contains("disjoint"), "{err}");
    }

    #[test]
    fn test_resolve_reports_bad_root_answer() {
        let plan = AllocationPlan {
            root: AddressSpace::pool("ipam-1", 20).unwrap().root(),
            tiers: vec![],
            requests: vec![],
        };
        // WrongPool always answers with a /16.
        let err = plan.resolve(&mut WrongPool).unwrap_err();
        assert!(
            matches!(&err, PlanError::PoolMismatch { subject, .. } if subject == "root /20"),
            "{err}"
        );
    }
}
