//! Equal-size division of a block and free-space discovery.

use crate::config::MAX_LENGTH;
use crate::error::{PlanError, Result};
use crate::models::{block_size, is_valid_cidr, lo_mask, NetworkBlock};

/// Number of extra prefix bits needed for at least `count` equal children.
fn extension_bits(count: u32) -> u32 {
    u32::BITS - count.saturating_sub(1).leading_zeros()
}

/// The prefix length that yields at least `count` children of a `/parent_mask`.
///
/// May exceed 32, in which case the division is impossible.
pub fn natural_mask(parent_mask: u8, count: u32) -> u32 {
    u32::from(parent_mask) + extension_bits(count)
}

/// Validate a division request and return the prefix length of its children.
///
/// `parent` is only used to label errors, so the pooled strategy (which has no
/// literal address yet) runs exactly the same checks as the direct one.
pub fn child_prefix_length(
    parent: &str,
    parent_mask: u8,
    count: u32,
    explicit_mask: Option<u8>,
) -> Result<u8> {
    if count == 0 {
        return Err(PlanError::ZeroCount {
            parent: parent.to_string(),
        });
    }
    if let Some(mask) = explicit_mask {
        if mask > MAX_LENGTH {
            return Err(PlanError::MaskOutOfRange { mask });
        }
    }
    let natural = natural_mask(parent_mask, count);
    if natural > u32::from(MAX_LENGTH) {
        log::warn!("{parent} cannot hold {count} subnets (would need /{natural})");
        return Err(PlanError::AddressSpaceExhausted {
            parent: parent.to_string(),
            count,
        });
    }
    let natural = natural as u8;
    match explicit_mask {
        Some(requested) if requested < natural => Err(PlanError::MaskTooLarge {
            parent: parent.to_string(),
            count,
            requested,
            maximum: natural,
        }),
        Some(requested) => Ok(requested),
        None => Ok(natural),
    }
}

/// Divide `block` into `count` contiguous children in ascending address order.
///
/// Children use `explicit_mask` when given, which must not be coarser than the
/// natural mask for `count`.
///
/// # Examples
/// ```
/// use tiered_subnet_planner::allocation::divide;
/// use tiered_subnet_planner::models::NetworkBlock;
///
/// let root = NetworkBlock::parse("10.0.0.0/16").unwrap();
/// let children = divide(root, 3, None).unwrap();
/// let cidrs: Vec<String> = children.iter().map(|c| c.to_string()).collect();
/// assert_eq!(cidrs, ["10.0.0.0/18", "10.0.64.0/18", "10.0.128.0/18"]);
/// ```
pub fn divide(
    block: NetworkBlock,
    count: u32,
    explicit_mask: Option<u8>,
) -> Result<Vec<NetworkBlock>> {
    let parent = block.to_string();
    let mask = child_prefix_length(&parent, block.mask(), count, explicit_mask)?;
    let child_size = block_size(mask)?;
    log::debug!("divide {parent} into {count} x /{mask}");

    (0..u64::from(count))
        .map(|i| NetworkBlock::new((u64::from(block.addr()) + i * child_size) as u32, mask))
        .collect()
}

/// Like [`divide`], starting from a CIDR literal that is validated first.
pub fn divide_cidr(
    cidr: &str,
    count: u32,
    explicit_mask: Option<u8>,
) -> Result<Vec<NetworkBlock>> {
    if !is_valid_cidr(cidr) {
        return Err(PlanError::InvalidCidr {
            literal: cidr.to_string(),
        });
    }
    divide(cidr.parse()?, count, explicit_mask)
}

/// Largest aligned mask for a block starting at `start` that ends before `limit`.
fn find_biggest_block(start: u64, floor_mask: u8, limit: u64) -> u8 {
    let mut mask = floor_mask.max(lo_mask(start as u32));
    // `start == 0` aligns to /0 but the floor keeps us inside the parent.
    while mask < MAX_LENGTH && start + (1u64 << (MAX_LENGTH - mask)) > limit {
        mask += 1;
    }
    mask
}

/// Blocks of `parent` not covered by any of `used`, largest aligned first-fit,
/// in address order.
pub fn free_blocks(parent: NetworkBlock, used: &[NetworkBlock]) -> Vec<NetworkBlock> {
    let mut inside: Vec<NetworkBlock> = used
        .iter()
        .filter(|b| parent.overlaps(b))
        .copied()
        .collect();
    inside.sort();

    let end = u64::from(parent.addr()) + parent.size();
    let mut cursor = u64::from(parent.addr());
    let mut free = Vec::new();

    let fill = |cursor: &mut u64, limit: u64, free: &mut Vec<NetworkBlock>| {
        while *cursor < limit {
            let mask = find_biggest_block(*cursor, parent.mask(), limit);
            // Aligned by construction.
            if let Ok(gap) = NetworkBlock::new(*cursor as u32, mask) {
                free.push(gap);
            }
            *cursor += 1u64 << (MAX_LENGTH - mask);
        }
    };

    for b in inside {
        let start = u64::from(b.addr()).max(u64::from(parent.addr()));
        fill(&mut cursor, start, &mut free);
        cursor = cursor.max(u64::from(b.addr()) + b.size());
    }
    fill(&mut cursor, end, &mut free);

    log::trace!("free blocks in {parent}: {free:?}");
    free
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn block(s: &str) -> NetworkBlock {
        NetworkBlock::parse(s).unwrap()
    }

    fn cidrs(blocks: &[NetworkBlock]) -> Vec<String> {
        blocks.iter().map(|b| b.to_string()).collect()
    }

    #[test]
    fn test_natural_mask() {
        assert_eq!(natural_mask(16, 1), 16);
        assert_eq!(natural_mask(16, 2), 17);
        assert_eq!(natural_mask(16, 3), 18);
        assert_eq!(natural_mask(16, 4), 18);
        assert_eq!(natural_mask(16, 5), 19);
        assert_eq!(natural_mask(30, 8), 33);
    }

    #[test]
    fn test_divide_four() {
        let children = divide_cidr("10.0.0.0/16", 4, None).unwrap();
        assert_eq!(
            cidrs(&children),
            ["10.0.0.0/18", "10.0.64.0/18", "10.0.128.0/18", "10.0.192.0/18"]
        );
    }

    #[test]
    fn test_divide_three_leaves_fourth_unused() {
        let children = divide_cidr("10.0.0.0/16", 3, None).unwrap();
        assert_eq!(
            cidrs(&children),
            ["10.0.0.0/18", "10.0.64.0/18", "10.0.128.0/18"]
        );
    }

    #[test]
    fn test_divide_one_keeps_block() {
        let children = divide_cidr("192.168.0.0/24", 1, None).unwrap();
        assert_eq!(cidrs(&children), ["192.168.0.0/24"]);
    }

    #[test]
    fn test_divide_explicit_mask() {
        let children = divide_cidr("10.0.0.0/16", 3, Some(24)).unwrap();
        assert_eq!(
            cidrs(&children),
            ["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24"]
        );
    }

    #[test]
    fn test_divide_explicit_mask_too_large() {
        let err = divide_cidr("10.0.0.0/16", 4, Some(17)).unwrap_err();
        assert_eq!(
            err,
            PlanError::MaskTooLarge {
                parent: "10.0.0.0/16".to_string(),
                count: 4,
                requested: 17,
                maximum: 18,
            }
        );
    }

    #[test]
    fn test_divide_zero_count() {
        assert!(matches!(
            divide_cidr("10.0.0.0/16", 0, None),
            Err(PlanError::ZeroCount { .. })
        ));
    }

    #[test]
    fn test_divide_out_of_space() {
        let err = divide_cidr("10.0.0.0/30", 8, None).unwrap_err();
        assert_eq!(
            err,
            PlanError::AddressSpaceExhausted {
                parent: "10.0.0.0/30".to_string(),
                count: 8,
            }
        );
        assert!(matches!(
            divide_cidr("10.0.0.0/16", 2, Some(33)),
            Err(PlanError::MaskOutOfRange { mask: 33 })
        ));
    }

    #[test]
    fn test_divide_rejects_bad_literal() {
        assert_eq!(
            divide_cidr("10.0.0/16", 2, None).unwrap_err(),
            PlanError::InvalidCidr {
                literal: "10.0.0/16".to_string()
            }
        );
    }

    #[test]
    fn test_divide_top_of_address_space() {
        let children = divide_cidr("255.255.255.0/24", 2, None).unwrap();
        assert_eq!(cidrs(&children), ["255.255.255.0/25", "255.255.255.128/25"]);
        let all = divide_cidr("0.0.0.0/0", 2, None).unwrap();
        assert_eq!(cidrs(&all), ["0.0.0.0/1", "128.0.0.0/1"]);
    }

    #[test]
    fn test_free_blocks_after_three_way_split() {
        let root = block("10.0.0.0/16");
        let used = divide(root, 3, None).unwrap();
        assert_eq!(cidrs(&free_blocks(root, &used)), ["10.0.192.0/18"]);
    }

    #[test]
    fn test_free_blocks_irregular_gaps() {
        let root = block("10.0.0.0/24");
        let used = [block("10.0.0.16/28"), block("10.0.0.128/26")];
        assert_eq!(
            cidrs(&free_blocks(root, &used)),
            ["10.0.0.0/28", "10.0.0.32/27", "10.0.0.64/26", "10.0.0.192/26"]
        );
    }

    #[test]
    fn test_free_blocks_empty_and_full() {
        let root = block("10.0.0.0/24");
        assert_eq!(cidrs(&free_blocks(root, &[])), ["10.0.0.0/24"]);
        assert!(free_blocks(root, &[root]).is_empty());
        // Blocks outside the parent are ignored.
        assert_eq!(
            cidrs(&free_blocks(root, &[block("10.0.1.0/24")])),
            ["10.0.0.0/24"]
        );
    }

    proptest! {
        #[test]
        fn prop_children_disjoint_and_contained(
            addr in any::<u32>(),
            mask in 0u8..=32,
            count in 1u32..=64,
            extra in proptest::option::of(0u8..=4),
        ) {
            let parent = NetworkBlock::new(addr & get_mask(mask), mask).unwrap();
            let explicit = extra.map(|e| {
                (natural_mask(mask, count) as u8).saturating_add(e)
            });
            match divide(parent, count, explicit) {
                Ok(children) => {
                    prop_assert_eq!(children.len(), count as usize);
                    for (i, child) in children.iter().enumerate() {
                        prop_assert!(parent.contains_block(child));
                        for other in &children[i + 1..] {
                            prop_assert!(!child.overlaps(other));
                            prop_assert!(child < other);
                        }
                    }
                }
                Err(err) => {
                    let needed = natural_mask(mask, count) + u32::from(extra.unwrap_or(0));
                    prop_assert!(needed > 32, "unexpected {err}");
                }
            }
        }

        #[test]
        fn prop_coarser_explicit_mask_rejected(count in 2u32..=256, back in 1u8..=8) {
            let natural = natural_mask(16, count) as u8;
            let requested = natural.saturating_sub(back);
            let result = divide_cidr("10.0.0.0/16", count, Some(requested));
            prop_assert!(
                matches!(result, Err(PlanError::MaskTooLarge { .. })),
                "expected MaskTooLarge for {requested} < {natural}"
            );
        }
    }

    fn get_mask(len: u8) -> u32 {
        crate::models::get_cidr_mask(len).unwrap()
    }
}
