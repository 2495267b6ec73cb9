//! Dotted-decimal and CIDR literal conversions.
//!
//! Literals are checked against the canonical syntax before any arithmetic:
//! four octets 0-255 with no leading zeros, and a prefix length 0-32.

use crate::error::{PlanError, Result};
use regex::Regex;
use std::sync::OnceLock;

const OCTET: &str = r"(25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])";

static ADDRESS_REGEX: OnceLock<Regex> = OnceLock::new();
static CIDR_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_address_regex() -> &'static Regex {
    ADDRESS_REGEX.get_or_init(|| {
        Regex::new(&format!(r"^{OCTET}\.{OCTET}\.{OCTET}\.{OCTET}$")).expect("Invalid Regex")
    })
}

fn get_cidr_regex() -> &'static Regex {
    CIDR_REGEX.get_or_init(|| {
        Regex::new(&format!(
            r"^{OCTET}\.{OCTET}\.{OCTET}\.{OCTET}/(3[0-2]|[12]?[0-9])$"
        ))
        .expect("Invalid Regex")
    })
}

/// Parse a dotted-decimal address and pack it big-endian into a `u32`.
///
/// # Examples
/// ```
/// use tiered_subnet_planner::models::to_integer;
/// assert_eq!(to_integer("10.0.1.2").unwrap(), 0x0A000102);
/// assert!(to_integer("10.0.256.1").is_err());
/// ```
pub fn to_integer(dotted: &str) -> Result<u32> {
    if !get_address_regex().is_match(dotted) {
        return Err(PlanError::InvalidAddress {
            literal: dotted.to_string(),
        });
    }
    // The regex guarantees four in-range octets.
    let packed = dotted
        .split('.')
        .filter_map(|octet| octet.parse::<u8>().ok())
        .fold(0u32, |acc, octet| (acc << 8) | u32::from(octet));
    Ok(packed)
}

/// Render a packed address as four dot-separated octets.
pub fn to_dotted(addr: u32) -> String {
    let [a, b, c, d] = addr.to_be_bytes();
    format!("{a}.{b}.{c}.{d}")
}

/// `true` if `s` is a canonical `a.b.c.d/n` literal.
pub fn is_valid_cidr(s: &str) -> bool {
    get_cidr_regex().is_match(s)
}
