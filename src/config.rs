//! Index and parse configuration
//!
//! Code generators usually keep their compiler invocation in a JSON file next
//! to the headers they bind, so both option types deserialize with serde.

use crate::constants::ParseFlag;
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};

/// Session-wide settings passed to `clang_createIndex`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// Skip declarations that come from a precompiled header
    pub exclude_declarations_from_pch: bool,
    /// Let libclang print diagnostics to stderr while parsing
    pub display_diagnostics: bool,
}

/// Compiler invocation for one translation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Passed to libclang verbatim as argv
    pub args: Vec<String>,
    /// `CXTranslationUnit_*` bit mask
    pub flags: u32,
}

impl ParseOptions {
    pub fn new<I, S>(args: I, flags: &[ParseFlag]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParseOptions {
            args: args.into_iter().map(Into::into).collect(),
            flags: ParseFlag::mask(flags),
        }
    }

    /// Load options from JSON such as `{"args": ["-x", "c"], "flags": 1}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| BridgeError::InvalidArgument(format!("invalid parse options: {}", e)))
    }

    pub fn has_flag(&self, flag: ParseFlag) -> bool {
        let bits = flag.as_raw() as u32;
        bits != 0 && self.flags & bits == bits
    }
}
