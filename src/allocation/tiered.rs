//! Two-level tier then zone allocation.

use super::strategy::{AddressSpace, AllocationPlan, Partitioner, TierAllocation};
use crate::error::{PlanError, Result};
use crate::models::{PlacementRequest, Tier};
use itertools::Itertools;
use std::collections::HashSet;

/// Splits a root block across tiers, then each tier across its zones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieredAllocator {
    root: AddressSpace,
    tier_mask: Option<u8>,
}

impl TieredAllocator {
    /// Allocator over `root`, tiers sized by the natural mask.
    pub fn new(root: AddressSpace) -> TieredAllocator {
        TieredAllocator {
            root,
            tier_mask: None,
        }
    }

    /// Use `mask` for every tier block instead of the natural mask.
    pub fn with_tier_mask(mut self, mask: Option<u8>) -> TieredAllocator {
        self.tier_mask = mask;
        self
    }

    /// The root this allocator divides.
    pub fn root(&self) -> &AddressSpace {
        &self.root
    }

    /// Allocate one block per tier and one per (tier, zone) placement.
    ///
    /// Tiers are laid out in the given order. Zones within a tier follow the
    /// order in which placements first name them. A tier without placements
    /// keeps its block but gets no zone partition.
    pub fn allocate(
        &self,
        tiers: &[Tier],
        requests: &[PlacementRequest],
    ) -> Result<AllocationPlan> {
        validate_tiers(tiers, requests)?;

        let mut partitioner = Partitioner::default();
        let root = self.root.root();
        let tier_blocks = partitioner.partition(&root, tiers.len() as u32, self.tier_mask)?;

        let mut allocations = Vec::with_capacity(tiers.len());
        for (tier, tier_block) in tiers.iter().zip(tier_blocks) {
            let placements: Vec<&PlacementRequest> =
                requests.iter().filter(|r| r.tier == tier.name).collect();
            let zones: Vec<String> = placements.iter().map(|r| r.zone.clone()).unique().collect();
            let mask = agreed_mask(tier, &placements)?;

            let zone_blocks = if zones.is_empty() {
                Vec::new()
            } else {
                partitioner.partition(&tier_block, zones.len() as u32, mask)?
            };
            log::debug!(
                "tier '{}' ({}) -> {tier_block}, zones [{}]",
                tier.name,
                tier.class,
                zones.iter().join(", ")
            );

            allocations.push(TierAllocation {
                name: tier.name.clone(),
                class: tier.class.clone(),
                reserved: tier.reserved,
                block: tier_block,
                zones: zones.into_iter().zip(zone_blocks).collect(),
            });
        }

        let plan = AllocationPlan {
            root,
            tiers: allocations,
            requests: partitioner.into_requests(),
        };

        for r in requests {
            if plan.block_for(&r.tier, &r.zone).is_none() {
                return Err(PlanError::UnresolvedPlacement {
                    tier: r.tier.clone(),
                    zone: r.zone.clone(),
                });
            }
        }
        log::info!(
            "allocated {} tiers and {} placements from {}",
            plan.tiers.len(),
            requests.len(),
            plan.root
        );
        Ok(plan)
    }
}

fn validate_tiers(tiers: &[Tier], requests: &[PlacementRequest]) -> Result<()> {
    let mut seen = HashSet::new();
    for tier in tiers {
        if !seen.insert(tier.name.as_str()) {
            return Err(PlanError::DuplicateTier {
                tier: tier.name.clone(),
            });
        }
    }
    for r in requests {
        match tiers.iter().find(|t| t.name == r.tier) {
            None => {
                log::warn!("placement {}/{} names an unknown tier", r.tier, r.zone);
                return Err(PlanError::UnknownTier {
                    tier: r.tier.clone(),
                    zone: r.zone.clone(),
                });
            }
            Some(t) if t.reserved => {
                return Err(PlanError::ReservedTier {
                    tier: r.tier.clone(),
                    zone: r.zone.clone(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// The single subnet mask all placements of `tier` agree on, falling back to
/// the tier default when none of them sets one.
fn agreed_mask(tier: &Tier, placements: &[&PlacementRequest]) -> Result<Option<u8>> {
    let masks: Vec<Option<u8>> = placements.iter().map(|r| r.mask).unique().collect();
    match masks.as_slice() {
        [] | [None] => Ok(tier.mask),
        [Some(mask)] => Ok(Some(*mask)),
        _ => {
            let masks = masks
                .iter()
                .map(|m| m.map_or("no mask".to_string(), |m| format!("/{m}")))
                .join(", ");
            log::warn!("tier '{}' mixes subnet masks: {masks}", tier.name);
            Err(PlanError::MaskConflict {
                tier: tier.name.clone(),
                masks,
            })
        }
    }
}
