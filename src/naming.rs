//! Deterministic names and numbers for synthesized schema entities.
//!
//! JSON has no named record types, so every nested object and every wrapper
//! for an array of containers gets a synthetic name `<context>_<suffix>`.
//! The suffix sequence must be identical in the synthesis walk and in the
//! population walk; both walks therefore take a `NameGenerator` that starts
//! from the same state and is asked for names in the same order.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ConvertError, Result};

/// Largest field number protobuf accepts (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;

/// Field numbers protobuf reserves for its own implementation.
pub const RESERVED_FIELD_NUMBERS: std::ops::RangeInclusive<u32> = 19_000..=19_999;

/// Name of the record type synthesized for the document root.
pub const ROOT_TYPE_NAME: &str = "ROOT";

static NON_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

// ————————————————————————————————————————————————————————————————————————————
// GENERATOR
// ————————————————————————————————————————————————————————————————————————————

/// Caller-owned counters. One generator per walk; never shared between
/// concurrent conversions.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    next_suffix: u32,
    next_field: u32,
}

/// A synthetic name in both of its spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticName {
    /// Uppercased, used for the record type.
    pub type_name: String,
    /// Lowercased, used for the field that refers to the record type.
    pub field_name: String,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self { next_suffix: 1, next_field: 1 }
    }

    pub fn next_type_suffix(&mut self) -> u32 {
        let suffix = self.next_suffix;
        self.next_suffix += 1;
        suffix
    }

    /// Strictly increasing, skipping the reserved block.
    pub fn next_field_number(&mut self) -> Result<u32> {
        if RESERVED_FIELD_NUMBERS.contains(&self.next_field) {
            self.next_field = RESERVED_FIELD_NUMBERS.end() + 1;
        }
        let number = self.next_field;
        if number > MAX_FIELD_NUMBER {
            return Err(ConvertError::FieldNumberOverflow);
        }
        self.next_field += 1;
        Ok(number)
    }

    /// `<context>_<suffix>`, consuming one type suffix.
    pub fn next_name(&mut self, context: &str) -> SyntheticName {
        let raw = format!("{context}_{}", self.next_type_suffix());
        SyntheticName {
            type_name: raw.to_ascii_uppercase(),
            field_name: raw.to_ascii_lowercase(),
        }
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IDENTIFIERS & PATHS
// ————————————————————————————————————————————————————————————————————————————

/// Turn an arbitrary JSON key into a protobuf identifier.
pub fn sanitize_key(key: &str) -> String {
    let mut out = NON_IDENT.replace_all(key, "_").into_owned();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Field name for a scalar or repeated scalar keyed by `key`.
pub fn field_name(key: &str) -> String {
    sanitize_key(key).to_ascii_lowercase()
}

/// Extend a `#`-anchored JSON pointer by one reference token.
pub fn pointer_child(path: &str, token: &str) -> String {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    format!("{path}/{escaped}")
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
