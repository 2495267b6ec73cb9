//! IPv4 network block (CIDR) model.
//!
//! Provides [`NetworkBlock`] along with the mask helpers the partitioner
//! and free-space finder build on.

use super::address::{is_valid_cidr, to_dotted, to_integer};
use crate::config::MAX_LENGTH;
use crate::error::{PlanError, Result};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Convert a prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use tiered_subnet_planner::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32> {
    if len > MAX_LENGTH {
        Err(PlanError::MaskOutOfRange { mask: len })
    } else {
        let right_len = MAX_LENGTH - len;
        let all_bits = u32::MAX as u64;
        Ok(((all_bits >> right_len) << right_len) as u32)
    }
}

/// Number of addresses in a block with prefix length `len`.
pub fn block_size(len: u8) -> Result<u64> {
    if len > MAX_LENGTH {
        Err(PlanError::MaskOutOfRange { mask: len })
    } else {
        Ok(1u64 << (MAX_LENGTH - len))
    }
}

/// Smallest prefix length at which `addr` is still a network address.
pub fn lo_mask(addr: u32) -> u8 {
    MAX_LENGTH - addr.trailing_zeros().min(u32::from(MAX_LENGTH)) as u8
}

/// An IPv4 block: base address plus prefix length.
///
/// Ordered by address, then by prefix length.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetworkBlock {
    addr: u32,
    mask: u8,
}

impl NetworkBlock {
    /// `0.0.0.0/0`, the destination of default routes.
    pub const ANY: NetworkBlock = NetworkBlock { addr: 0, mask: 0 };

    /// Build a block from a packed address and prefix length.
    ///
    /// Host bits below the prefix are rejected rather than masked off.
    pub fn new(addr: u32, mask: u8) -> Result<NetworkBlock> {
        let netmask = get_cidr_mask(mask)?;
        if addr & !netmask != 0 {
            return Err(PlanError::InvalidCidr {
                literal: format!("{}/{mask}", to_dotted(addr)),
            });
        }
        Ok(NetworkBlock { addr, mask })
    }

    /// Parse a canonical `a.b.c.d/n` literal.
    pub fn parse(cidr: &str) -> Result<NetworkBlock> {
        cidr.parse()
    }

    /// Base address as a packed integer.
    pub fn addr(&self) -> u32 {
        self.addr
    }

    /// Prefix length.
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Base address.
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.addr)
    }

    /// Highest (broadcast) address in the block.
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.last())
    }

    /// Number of addresses covered.
    pub fn size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.mask)
    }

    fn last(&self) -> u32 {
        (u64::from(self.addr) + self.size() - 1) as u32
    }

    /// `true` if `addr` falls inside this block.
    pub fn contains_addr(&self, addr: Ipv4Addr) -> bool {
        let addr = u32::from(addr);
        self.addr <= addr && addr <= self.last()
    }

    /// `true` if `other` lies entirely inside this block.
    pub fn contains_block(&self, other: &NetworkBlock) -> bool {
        self.addr <= other.addr && other.last() <= self.last()
    }

    /// `true` if the two blocks share at least one address.
    pub fn overlaps(&self, other: &NetworkBlock) -> bool {
        self.addr <= other.last() && other.addr <= self.last()
    }
}

impl FromStr for NetworkBlock {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<NetworkBlock> {
        if !is_valid_cidr(s) {
            return Err(PlanError::InvalidCidr {
                literal: s.to_string(),
            });
        }
        let invalid = || PlanError::InvalidCidr {
            literal: s.to_string(),
        };
        let (addr, mask) = s.split_once('/').ok_or_else(invalid)?;
        let mask: u8 = mask.parse().map_err(|_| invalid())?;
        NetworkBlock::new(to_integer(addr)?, mask)
    }
}

impl fmt::Display for NetworkBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", to_dotted(self.addr), self.mask)
    }
}

impl Serialize for NetworkBlock {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NetworkBlock {
    fn deserialize<D>(deserializer: D) -> std::result::Result<NetworkBlock, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(s: &str) -> NetworkBlock {
        NetworkBlock::parse(s).unwrap()
    }

    #[test]
    fn test_get_cidr_mask() {
        assert_eq!(get_cidr_mask(0).unwrap(), 0x00000000);
        assert_eq!(get_cidr_mask(8).unwrap(), 0xFF000000);
        assert_eq!(get_cidr_mask(16).unwrap(), 0xFFFF0000);
        assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
        assert_eq!(get_cidr_mask(32).unwrap(), 0xFFFFFFFF);
        assert!(get_cidr_mask(33).is_err());
    }

    #[test]
    fn test_block_size() {
        assert_eq!(block_size(0).unwrap(), 1 << 32);
        assert_eq!(block_size(16).unwrap(), 65536);
        assert_eq!(block_size(32).unwrap(), 1);
        assert_eq!(
            block_size(40).unwrap_err(),
            PlanError::MaskOutOfRange { mask: 40 }
        );
    }

    #[test]
    fn test_lo_mask() {
        assert_eq!(lo_mask(u32::from(Ipv4Addr::new(192, 168, 1, 1))), 32);
        assert_eq!(lo_mask(u32::from(Ipv4Addr::new(10, 0, 64, 0))), 18);
        assert_eq!(lo_mask(0), 0);
    }

    #[test]
    fn test_parse_and_display() {
        let b = block("10.0.64.0/18");
        assert_eq!(b.addr(), 0x0A004000);
        assert_eq!(b.mask(), 18);
        assert_eq!(b.to_string(), "10.0.64.0/18");
        assert_eq!(b.network(), Ipv4Addr::new(10, 0, 64, 0));
        assert_eq!(b.broadcast(), Ipv4Addr::new(10, 0, 127, 255));
        assert_eq!(b.size(), 16384);
    }

    #[test]
    fn test_parse_rejects() {
        assert!(matches!(
            NetworkBlock::parse("10.0.0.0/33"),
            Err(PlanError::InvalidCidr { .. })
        ));
        assert!(matches!(
            NetworkBlock::parse("10.0.0/16"),
            Err(PlanError::InvalidCidr { .. })
        ));
        // Host bits set below the prefix.
        assert_eq!(
            NetworkBlock::parse("10.0.0.1/16").unwrap_err(),
            PlanError::InvalidCidr {
                literal: "10.0.0.1/16".to_string()
            }
        );
    }

    #[test]
    fn test_whole_address_space() {
        let b = block("0.0.0.0/0");
        assert_eq!(b.size(), 1 << 32);
        assert_eq!(b.broadcast(), Ipv4Addr::new(255, 255, 255, 255));
        assert!(b.contains_block(&block("255.255.255.255/32")));
    }

    #[test]
    fn test_contains_and_overlaps() {
        let parent = block("10.0.0.0/16");
        let child = block("10.0.10.64/26");
        let other = block("10.1.0.0/16");

        assert!(parent.contains_block(&child));
        assert!(!child.contains_block(&parent));
        assert!(parent.overlaps(&child));
        assert!(child.overlaps(&parent));
        assert!(!parent.overlaps(&other));
        assert!(parent.contains_addr(Ipv4Addr::new(10, 0, 255, 255)));
        assert!(!parent.contains_addr(Ipv4Addr::new(10, 1, 0, 0)));
    }

    #[test]
    fn test_ordering() {
        let b1 = block("10.0.0.0/8");
        let b2 = block("10.0.10.0/24");
        let b3 = block("10.0.10.64/26");
        assert!(b1 < b2);
        assert!(b2 < b3);
        assert!(block("10.0.0.0/16") < block("10.0.0.0/24"));
    }

    #[test]
    fn test_serde_as_cidr_string() {
        let b = block("172.16.0.0/12");
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "\"172.16.0.0/12\"");
        let back: NetworkBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
        assert!(serde_json::from_str::<NetworkBlock>("\"172.16.0.0\"").is_err());
    }
}
