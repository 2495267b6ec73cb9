//! Output formatting for allocated networks.
//!
//! - [`csv`] - CSV rows for subnets and free space
//! - [`terminal`] - field formatting and colours

mod csv;
mod terminal;

pub use csv::{build_rows, print_network, SubnetPrintRow};
pub use terminal::{format_field, paint_class};
