//! Error handling for the binding layer.
//!
//! Every native failure is turned into a [`ClangError`] at the call site. Raw
//! native integers never reach callers; they are wrapped in the matching
//! [`NativeCode`](crate::status::NativeCode) domain.

use crate::status::{
    ClangErrorCode, CompilationDatabaseLoadErrorCode, DiagnosticLoadErrorCode,
    TranslationUnitSaveErrorCode,
};
use libc::c_int;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClangError>;

/// Errors raised by wrapper objects.
#[derive(Debug, Error)]
pub enum ClangError {
    /// A required input was absent or structurally invalid.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// A native call returned a non-success `CXErrorCode`.
    #[error("{0}")]
    Native(ClangErrorCode),

    /// The compilation database could not be loaded.
    #[error("{message}")]
    CompilationDatabaseLoad {
        code: CompilationDatabaseLoadErrorCode,
        message: String,
    },

    /// A serialized diagnostics file could not be loaded.
    #[error("{message}")]
    DiagnosticLoad {
        code: DiagnosticLoadErrorCode,
        message: String,
    },

    /// A translation unit could not be saved.
    #[error("{0}")]
    TranslationUnitSave(TranslationUnitSaveErrorCode),

    /// The wrapper's native resource has already been released.
    #[error("cannot access a disposed {0}")]
    Disposed(&'static str),

    /// A collection index was outside `[0, len)`.
    #[error("index {index} is out of range for a collection of {len} elements")]
    OutOfRange { index: usize, len: usize },

    /// libclang could not be located or loaded.
    #[error("failed to load libclang: {0}")]
    Library(String),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[source] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClangError {
    /// Create an invalid argument error.
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Check a `CXErrorCode` returned by a native call.
    pub fn check(code: c_int) -> Result<()> {
        let code = ClangErrorCode::from_raw(code);
        if code == ClangErrorCode::SUCCESS {
            Ok(())
        } else {
            Err(Self::Native(code))
        }
    }

    /// Build a compilation database load error with the code's static text.
    pub fn compilation_database_load(code: CompilationDatabaseLoadErrorCode) -> Self {
        Self::CompilationDatabaseLoad {
            code,
            message: code.to_string(),
        }
    }

    /// Build a diagnostics load error.
    ///
    /// libclang usually supplies its own message; an empty one falls back to the
    /// code's static text.
    pub fn diagnostic_load(code: DiagnosticLoadErrorCode, message: String) -> Self {
        let message = if message.is_empty() {
            code.to_string()
        } else {
            message
        };
        Self::DiagnosticLoad { code, message }
    }

    /// Check a `CXSaveError` returned by `clang_saveTranslationUnit`.
    pub fn check_save(code: c_int) -> Result<()> {
        let code = TranslationUnitSaveErrorCode::from_raw(code);
        if code == TranslationUnitSaveErrorCode::NONE {
            Ok(())
        } else {
            Err(Self::TranslationUnitSave(code))
        }
    }
}
