//! XML name validation and utilities
//!
//! Validation for NCNames and QNames as they appear in XSD `name`, `type`
//! and `ref` attributes, plus helpers for splitting prefixed names.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

// Simplified NCName pattern, ASCII plus the common Latin ranges
static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\-\.0-9]*$")
        .unwrap()
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    !name.is_empty() && !name.contains(':') && NCNAME.is_match(name)
}

/// Check if a string is a valid QName (qualified name)
pub fn is_valid_qname(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    // QName can be "prefix:localName" or just "localName"
    if let Some((prefix, local)) = name.split_once(':') {
        is_valid_ncname(prefix) && is_valid_ncname(local)
    } else {
        is_valid_ncname(name)
    }
}

/// Validate an NCName and return an error if invalid
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("Invalid NCName: '{}'", name)))
    }
}

/// Validate a QName and return an error if invalid
pub fn validate_qname(name: &str) -> Result<()> {
    if is_valid_qname(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("Invalid QName: '{}'", name)))
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}
