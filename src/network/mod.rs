//! Network container lifecycle and subnet queries.
//!
//! - [`builder`] - registration phase ([`NetworkBuilder`])
//! - [`container`] - locked, read-only phase ([`NetworkContainer`])
//! - [`lifecycle`] - [`Network`], which locks itself on first read
//! - [`selector`] - [`SubnetSelection`] queries

mod builder;
mod container;
mod lifecycle;
mod selector;

pub use builder::NetworkBuilder;
pub use container::{Gateway, NetworkContainer, Route};
pub use lifecycle::Network;
pub use selector::{select, SubnetSelection};
