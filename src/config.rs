//! Library-wide configuration.
//!
//! Where libclang itself is found is controlled by `LIBCLANG_PATH`; everything
//! else the entry point needs can come from a JSON document:
//!
//! ```json
//! {
//!   "exclude_declarations_from_pch": false,
//!   "display_diagnostics": true,
//!   "crash_recovery": false,
//!   "parse_options": 64
//! }
//! ```

use crate::error::{ClangError, Result};
use crate::options::ParseOptions;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Settings applied by [`Clang::with_config`](crate::Clang::with_config).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClangConfig {
    /// Index flag: skip declarations that come from a precompiled header.
    pub exclude_declarations_from_pch: bool,
    /// Index flag: have libclang print diagnostics to stderr.
    pub display_diagnostics: bool,
    /// Toggle libclang's crash recovery once at startup; left alone when unset.
    pub crash_recovery: Option<bool>,
    /// Options used when a parse call passes `None`. Unset means libclang's
    /// default editing options.
    pub parse_options: Option<ParseOptions>,
}

impl ClangConfig {
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(ClangError::Config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }
}
