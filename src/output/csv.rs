//! CSV output for an allocated network.

use super::terminal::{format_field, paint_class};
use crate::allocation::{free_blocks, ConcreteAllocation};
use crate::models::NetworkBlock;
use crate::network::NetworkContainer;
use colored::Colorize;

/// One output row: a subnet, a reserved tier or unused space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetPrintRow {
    /// Row number (0 for reserved and free rows).
    pub j: usize,
    /// `-free-`, `-reserved-` or the subnet id.
    pub gap: String,
    /// Block in CIDR notation.
    pub block: NetworkBlock,
    /// Broadcast address.
    pub broadcast: String,
    /// Number of addresses.
    pub size: u64,
    /// Subnet group, or the tier owning the space.
    pub group: String,
    /// Accessibility class name.
    pub class: String,
    /// Zone, `None` for non-subnet rows.
    pub zone: String,
    /// Default route target, `None` when the subnet has no default route.
    pub route: String,
}

fn space_row(gap: &str, block: NetworkBlock, group: &str, class: &str) -> SubnetPrintRow {
    SubnetPrintRow {
        j: 0,
        gap: gap.to_string(),
        block,
        broadcast: block.broadcast().to_string(),
        size: block.size(),
        group: group.to_string(),
        class: class.to_string(),
        zone: "None".to_string(),
        route: "None".to_string(),
    }
}

/// Rows for every subnet of `network`, every reserved tier and every unused
/// block of `allocation`, sorted by address.
pub fn build_rows(
    allocation: &ConcreteAllocation,
    network: &NetworkContainer,
) -> Vec<SubnetPrintRow> {
    let mut rows: Vec<SubnetPrintRow> = network
        .subnets()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let id = s.id();
            let route = network
                .routes()
                .iter()
                .find(|r| r.subnet_id == id)
                .map_or("None".to_string(), |r| format!("{}->{}", r.destination, r.gateway_id));
            SubnetPrintRow {
                j: i + 1,
                gap: id,
                block: s.block,
                broadcast: s.block.broadcast().to_string(),
                size: s.block.size(),
                group: s.group.clone(),
                class: s.class.to_string(),
                zone: s.zone.clone(),
                route,
            }
        })
        .collect();

    let tier_blocks: Vec<NetworkBlock> = allocation.tiers.iter().map(|t| t.block).collect();
    for free in free_blocks(allocation.root, &tier_blocks) {
        rows.push(space_row("-free-", free, "None", "None"));
    }
    for tier in &allocation.tiers {
        if tier.reserved {
            rows.push(space_row("-reserved-", tier.block, &tier.name, tier.class.as_str()));
            continue;
        }
        let zone_blocks: Vec<NetworkBlock> = tier.zones.iter().map(|(_, b)| *b).collect();
        for free in free_blocks(tier.block, &zone_blocks) {
            rows.push(space_row("-free-", free, &tier.name, tier.class.as_str()));
        }
    }

    rows.sort_by_key(|r| r.block);
    rows
}

/// Print the network as CSV to stdout.
pub fn print_network(allocation: &ConcreteAllocation, network: &NetworkContainer) {
    log::info!(
        "#Start print_network() {} root={} subnets={}",
        network.name(),
        allocation.root,
        network.subnets().len()
    );
    println!(
        r#" "cnt",            "gap",          "cidr",       "broadcast",      "size",    "group",               "class",   "zone",               "route""#
    );
    for row in build_rows(allocation, network) {
        print_csv_row(&row);
    }
    println!(
        "#{}# default selection class: {}",
        "NOTE".on_blue(),
        paint_class(&network.default_class())
    );
}

fn print_csv_row(row: &SubnetPrintRow) {
    println!(
        "{j},{gap},{block},{broadcast},{size},{group},{class},{zone},{route}",
        j = format_field(row.j, 6),
        gap = format_field(&row.gap, 18),
        block = format_field(row.block, 18),
        broadcast = format_field(&row.broadcast, 18),
        size = format_field(row.size, 10),
        group = format_field(&row.group, 10),
        class = format_field(&row.class, 20),
        zone = format_field(&row.zone, 8),
        route = format_field(&row.route, 24),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{AddressSpace, TieredAllocator};
    use crate::models::{AccessibilityClass, PlacementRequest, Tier};
    use crate::network::NetworkBuilder;

    #[test]
    fn test_build_rows_with_free_and_reserved_space() {
        let root = AddressSpace::cidr("10.0.0.0/16").unwrap();
        let tiers = vec![
            Tier::new("web", AccessibilityClass::Public),
            Tier::new("spare", AccessibilityClass::Isolated).reserved(),
            Tier::new("db", AccessibilityClass::Isolated),
        ];
        let requests = vec![
            PlacementRequest::new("web", "az1"),
            PlacementRequest::new("web", "az2"),
            PlacementRequest::new("web", "az3"),
            PlacementRequest::new("db", "az1"),
        ];
        let allocation = TieredAllocator::new(root.clone())
            .allocate(&tiers, &requests)
            .unwrap()
            .resolve_direct()
            .unwrap();
        let mut builder = NetworkBuilder::new("prod", root);
        builder.add_allocation(&allocation).unwrap();
        let network = builder.build();

        let rows = build_rows(&allocation, &network);
        let summary: Vec<(String, String)> = rows
            .iter()
            .map(|r| (r.gap.clone(), r.block.to_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("web/az1".to_string(), "10.0.0.0/20".to_string()),
                ("web/az2".to_string(), "10.0.16.0/20".to_string()),
                ("web/az3".to_string(), "10.0.32.0/20".to_string()),
                ("-free-".to_string(), "10.0.48.0/20".to_string()),
                ("-reserved-".to_string(), "10.0.64.0/18".to_string()),
                ("db/az1".to_string(), "10.0.128.0/18".to_string()),
                ("-free-".to_string(), "10.0.192.0/18".to_string()),
            ]
        );
        assert_eq!(rows[0].route, "0.0.0.0/0->prod-igw");
        assert_eq!(rows[5].route, "None");
        assert_eq!(rows[5].j, 4);
    }
}
