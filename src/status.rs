//! Value types for native status codes and kind enumerations.
//!
//! libclang reports outcomes as small integer enumerations. Each enumeration is
//! a [`CodeDomain`]; [`NativeCode`] wraps a raw value of that domain and renders
//! it from the domain's static table. Values the table does not know about are
//! kept as-is and rendered with the domain's "unknown" text, so newer libclang
//! releases that grow an enumeration never fail translation.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A closed set of native codes with a static description table.
pub trait CodeDomain: 'static {
    /// Description used for codes missing from the table.
    const UNKNOWN: &'static str;

    /// Look up the description of a known code.
    fn describe(code: i32) -> Option<&'static str>;
}

/// An immutable native code tagged with its domain.
///
/// Equality, ordering and hashing use the underlying integer only.
pub struct NativeCode<D: CodeDomain> {
    code: i32,
    domain: PhantomData<fn() -> D>,
}

impl<D: CodeDomain> NativeCode<D> {
    /// Translate a raw native value. Total over `i32`.
    pub const fn from_raw(code: i32) -> Self {
        Self {
            code,
            domain: PhantomData,
        }
    }

    /// The raw native value.
    pub const fn code(self) -> i32 {
        self.code
    }

    /// Whether the domain's table knows this code.
    pub fn is_known(self) -> bool {
        D::describe(self.code).is_some()
    }

    /// The static description for this code, or the domain's unknown text.
    pub fn description(self) -> &'static str {
        D::describe(self.code).unwrap_or(D::UNKNOWN)
    }
}

impl<D: CodeDomain> Clone for NativeCode<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: CodeDomain> Copy for NativeCode<D> {}

impl<D: CodeDomain> PartialEq for NativeCode<D> {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl<D: CodeDomain> Eq for NativeCode<D> {}

impl<D: CodeDomain> PartialOrd for NativeCode<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<D: CodeDomain> Ord for NativeCode<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code.cmp(&other.code)
    }
}

impl<D: CodeDomain> Hash for NativeCode<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl<D: CodeDomain> fmt::Debug for NativeCode<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", short_type_name::<D>(), self.code)
    }
}

impl<D: CodeDomain> fmt::Display for NativeCode<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl<D: CodeDomain> From<NativeCode<D>> for i32 {
    fn from(code: NativeCode<D>) -> Self {
        code.code
    }
}

fn short_type_name<D>() -> &'static str {
    let full = std::any::type_name::<D>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Generic libclang error codes (`CXErrorCode`).
#[derive(Debug, Clone, Copy)]
pub enum Generic {}

impl CodeDomain for Generic {
    const UNKNOWN: &'static str = "Unknown libclang error";

    fn describe(code: i32) -> Option<&'static str> {
        match code {
            0 => Some("No error"),
            1 => Some("General failure. No further details are available"),
            2 => Some("libclang crashed while performing the requested operation"),
            3 => Some("The function detected that the arguments violate the function contract"),
            4 => Some("An AST deserialization error has occurred"),
            _ => None,
        }
    }
}

/// Compilation database load errors (`CXCompilationDatabase_Error`).
#[derive(Debug, Clone, Copy)]
pub enum CompilationDatabaseLoad {}

impl CodeDomain for CompilationDatabaseLoad {
    const UNKNOWN: &'static str = "Unknown compilation database error";

    fn describe(code: i32) -> Option<&'static str> {
        match code {
            0 => Some("No error"),
            1 => Some("Compilation database cannot be loaded"),
            _ => None,
        }
    }
}

/// Serialized diagnostics load errors (`CXLoadDiag_Error`).
#[derive(Debug, Clone, Copy)]
pub enum DiagnosticLoad {}

impl CodeDomain for DiagnosticLoad {
    const UNKNOWN: &'static str = "Unknown diagnostic load error";

    fn describe(code: i32) -> Option<&'static str> {
        match code {
            0 => Some("No error"),
            1 => Some("An unknown error occurred while loading the diagnostics"),
            2 => Some("The diagnostics file could not be loaded"),
            3 => Some("The diagnostics file is invalid or corrupt"),
            _ => None,
        }
    }
}

/// Translation unit save errors (`CXSaveError`).
#[derive(Debug, Clone, Copy)]
pub enum TranslationUnitSave {}

impl CodeDomain for TranslationUnitSave {
    const UNKNOWN: &'static str = "Unknown translation unit save error";

    fn describe(code: i32) -> Option<&'static str> {
        match code {
            0 => Some("No error"),
            1 => Some("An unknown error occurred while attempting to save the file"),
            2 => Some(
                "Errors during translation prevented this attempt to save the translation unit",
            ),
            3 => Some("The translation unit is invalid"),
            _ => None,
        }
    }
}

/// Translation unit memory usage categories (`CXTUResourceUsageKind`).
///
/// Descriptions match the names libclang reports from
/// `clang_getTUResourceUsageName`.
#[derive(Debug, Clone, Copy)]
pub enum ResourceUsage {}

impl CodeDomain for ResourceUsage {
    const UNKNOWN: &'static str = "Unknown resource usage kind";

    fn describe(code: i32) -> Option<&'static str> {
        match code {
            1 => Some("AST"),
            2 => Some("Identifiers"),
            3 => Some("Selectors"),
            4 => Some("GlobalCompletionResults"),
            5 => Some("SourceManager_ContentCache"),
            6 => Some("AST_SideTables"),
            7 => Some("SourceManager_Membuffer_Malloc"),
            8 => Some("SourceManager_Membuffer_MMap"),
            9 => Some("ExternalASTSource_Membuffer_Malloc"),
            10 => Some("ExternalASTSource_Membuffer_MMap"),
            11 => Some("Preprocessor"),
            12 => Some("PreprocessingRecord"),
            13 => Some("SourceManager_DataStructures"),
            14 => Some("Preprocessor_HeaderSearch"),
            _ => None,
        }
    }
}

/// Diagnostic severities (`CXDiagnosticSeverity`).
#[derive(Debug, Clone, Copy)]
pub enum Severity {}

impl CodeDomain for Severity {
    const UNKNOWN: &'static str = "unknown";

    fn describe(code: i32) -> Option<&'static str> {
        match code {
            0 => Some("ignored"),
            1 => Some("note"),
            2 => Some("warning"),
            3 => Some("error"),
            4 => Some("fatal"),
            _ => None,
        }
    }
}

pub type ClangErrorCode = NativeCode<Generic>;
pub type CompilationDatabaseLoadErrorCode = NativeCode<CompilationDatabaseLoad>;
pub type DiagnosticLoadErrorCode = NativeCode<DiagnosticLoad>;
pub type TranslationUnitSaveErrorCode = NativeCode<TranslationUnitSave>;
pub type ResourceUsageKind = NativeCode<ResourceUsage>;
pub type DiagnosticSeverity = NativeCode<Severity>;

impl ClangErrorCode {
    pub const SUCCESS: Self = Self::from_raw(0);
    pub const FAILURE: Self = Self::from_raw(1);
    pub const CRASHED: Self = Self::from_raw(2);
    pub const INVALID_ARGUMENTS: Self = Self::from_raw(3);
    pub const AST_READ_ERROR: Self = Self::from_raw(4);
}

impl CompilationDatabaseLoadErrorCode {
    pub const NO_ERROR: Self = Self::from_raw(0);
    pub const CAN_NOT_LOAD_DATABASE: Self = Self::from_raw(1);
}

impl DiagnosticLoadErrorCode {
    pub const NONE: Self = Self::from_raw(0);
    pub const UNKNOWN: Self = Self::from_raw(1);
    pub const CANNOT_LOAD: Self = Self::from_raw(2);
    pub const INVALID_FILE: Self = Self::from_raw(3);
}

impl TranslationUnitSaveErrorCode {
    pub const NONE: Self = Self::from_raw(0);
    pub const UNKNOWN: Self = Self::from_raw(1);
    pub const TRANSLATION_ERRORS: Self = Self::from_raw(2);
    pub const INVALID_TRANSLATION_UNIT: Self = Self::from_raw(3);
}

impl DiagnosticSeverity {
    pub const IGNORED: Self = Self::from_raw(0);
    pub const NOTE: Self = Self::from_raw(1);
    pub const WARNING: Self = Self::from_raw(2);
    pub const ERROR: Self = Self::from_raw(3);
    pub const FATAL: Self = Self::from_raw(4);
}
