//! Domain models for subnet planning.
//!
//! - [`NetworkBlock`] - IPv4 block in CIDR notation
//! - [`Tier`], [`PlacementRequest`], [`AccessibilityClass`] - what to allocate
//! - [`SubnetRecord`] - a subnet registered in a network

mod address;
mod block;
mod subnet;
mod tier;

pub use address::{is_valid_cidr, to_dotted, to_integer};
pub use block::{block_size, get_cidr_mask, lo_mask, NetworkBlock};
pub use subnet::SubnetRecord;
pub use tier::{AccessibilityClass, PlacementRequest, Tier};
