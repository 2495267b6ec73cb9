//! Terminal output utilities.

use crate::models::AccessibilityClass;
use colored::{ColoredString, Colorize};

/// Format a value as a quoted, right-aligned field.
///
/// Values longer than `width` are never truncated.
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let quoted = format!("\"{}\"", value.to_string());
    if quoted.len() >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Class name coloured by how exposed the subnet is.
pub fn paint_class(class: &AccessibilityClass) -> ColoredString {
    match class {
        AccessibilityClass::Public => class.as_str().red(),
        AccessibilityClass::PrivateWithEgress => class.as_str().yellow(),
        AccessibilityClass::Isolated => class.as_str().green(),
        AccessibilityClass::Custom(name) => name.as_str().cyan(),
    }
}
