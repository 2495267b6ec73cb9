//! Error types for subnet planning.
//!
//! Every failure carries the values that caused it. [`PlanError::kind`]
//! groups the variants into the four failure classes callers usually branch on.

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Broad failure class of a [`PlanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed dotted-decimal or CIDR literal.
    Format,
    /// Not enough address space, or an explicit mask coarser than allowed.
    Capacity,
    /// Inputs that contradict each other or name things that do not exist.
    Consistency,
    /// Mutation of a network that is already locked.
    Lifecycle,
}

/// Errors raised while planning, allocating or querying subnets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// Not a dotted-decimal IPv4 address.
    #[error("invalid IPv4 address '{literal}': expected four octets 0-255 without leading zeros")]
    InvalidAddress {
        /// The rejected literal.
        literal: String,
    },
    /// Not a canonical `a.b.c.d/n` literal.
    #[error("invalid CIDR block '{literal}': expected a.b.c.d/n with octets 0-255 and n in 0-32")]
    InvalidCidr {
        /// The rejected literal.
        literal: String,
    },
    /// A prefix length outside 0..=32.
    #[error("prefix length /{mask} is out of range, the maximum is /32")]
    MaskOutOfRange {
        /// The rejected prefix length.
        mask: u8,
    },
    /// A block may not be divided into zero children.
    #[error("cannot divide {parent} into zero subnets")]
    ZeroCount {
        /// The parent that was to be divided (CIDR or pool reference).
        parent: String,
    },
    /// The explicit mask asks for children larger than the natural partition allows.
    #[error(
        "mask /{requested} is too large for {count} subnets in {parent}: \
         the maximum supported mask is /{maximum}"
    )]
    MaskTooLarge {
        /// The parent being divided.
        parent: String,
        /// Number of children requested.
        count: u32,
        /// The explicit mask the caller asked for.
        requested: u8,
        /// The smallest prefix length (largest child) that still fits `count` children.
        maximum: u8,
    },
    /// Dividing would need a prefix length beyond /32.
    #[error("not enough address space in {parent} for {count} subnets")]
    AddressSpaceExhausted {
        /// The parent being divided.
        parent: String,
        /// Number of children requested.
        count: u32,
    },
    /// Placements of one tier disagree on the subnet mask.
    #[error("all subnets in a tier must share the same mask: tier '{tier}' declares {masks}")]
    MaskConflict {
        /// Tier whose placements disagree.
        tier: String,
        /// The distinct masks found, rendered for display.
        masks: String,
    },
    /// Two tiers with the same name in one plan.
    #[error("tier '{tier}' is declared more than once")]
    DuplicateTier {
        /// The repeated tier name.
        tier: String,
    },
    /// A placement names a tier that is not in the plan.
    #[error("placement for zone '{zone}' names unknown tier '{tier}'")]
    UnknownTier {
        /// The unknown tier name.
        tier: String,
        /// Zone of the offending placement.
        zone: String,
    },
    /// A placement targets a tier that only reserves address space.
    #[error("tier '{tier}' is reserved and cannot hold subnets (zone '{zone}')")]
    ReservedTier {
        /// The reserved tier.
        tier: String,
        /// Zone of the offending placement.
        zone: String,
    },
    /// A selection names a group that no subnet belongs to.
    #[error("there are no subnet groups with name '{group}', found: {}", .available.join(", "))]
    UnknownGroup {
        /// The requested group name.
        group: String,
        /// Every registered group name, in registration order.
        available: Vec<String>,
    },
    /// The same tier/zone combination registered twice.
    #[error("a subnet for group '{group}' in zone '{zone}' is already registered")]
    DuplicateSubnet {
        /// Group of the duplicate.
        group: String,
        /// Zone of the duplicate.
        zone: String,
    },
    /// A placement that the allocator did not produce a block for.
    #[error("no block was allocated for tier '{tier}' zone '{zone}'")]
    UnresolvedPlacement {
        /// Tier of the placement.
        tier: String,
        /// Zone of the placement.
        zone: String,
    },
    /// A pool manager answered a request with the wrong blocks.
    #[error("pool '{pool}' answered {subject} incorrectly: {reason}")]
    PoolMismatch {
        /// The pool that answered.
        pool: String,
        /// What was asked for: `root /n` or `request #i`.
        subject: String,
        /// What was wrong with the answer.
        reason: String,
    },
    /// Subnets can only be registered before the network is locked.
    #[error(
        "cannot add {addition} to locked network '{network}': \
         register all subnets before reading any derived state"
    )]
    NetworkLocked {
        /// Name of the locked network.
        network: String,
        /// What the caller tried to add.
        addition: String,
    },
}

impl PlanError {
    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanError::InvalidAddress { .. } | PlanError::InvalidCidr { .. } => ErrorKind::Format,
            PlanError::MaskOutOfRange { .. }
            | PlanError::ZeroCount { .. }
            | PlanError::MaskTooLarge { .. }
            | PlanError::AddressSpaceExhausted { .. } => ErrorKind::Capacity,
            PlanError::MaskConflict { .. }
            | PlanError::DuplicateTier { .. }
            | PlanError::UnknownTier { .. }
            | PlanError::ReservedTier { .. }
            | PlanError::UnknownGroup { .. }
            | PlanError::DuplicateSubnet { .. }
            | PlanError::UnresolvedPlacement { .. }
            | PlanError::PoolMismatch { .. } => ErrorKind::Consistency,
            PlanError::NetworkLocked { .. } => ErrorKind::Lifecycle,
        }
    }
}
