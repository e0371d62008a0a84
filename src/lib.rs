//! Safe bindings over the libclang C API.
//!
//! Every libclang object is owned by a Rust value that releases it exactly once,
//! either through an explicit `dispose()` or when the value is dropped. Strings
//! and buffers allocated by libclang are copied into Rust memory and freed before
//! the call that produced them returns. Native status codes are turned into
//! [`ClangError`] values at the call site.
//!
//! # Thread Safety
//!
//! No wrapper is `Send` or `Sync`. libclang is loaded per thread, and every
//! object must stay on the thread that created it.
//!
//! # Lifetimes
//!
//! - A [`TranslationUnit`] keeps its [`Index`] alive.
//! - A [`CompileCommand`] keeps its [`CompileCommandCollection`] alive.
//! - A [`CompileCommandCollection`] does not depend on its [`CompilationDatabase`].
//!
//! # Example
//!
//! ```no_run
//! use clang_ffi::{Clang, NativeDocument};
//!
//! let clang = Clang::load()?;
//! let unit = clang.parse_translation_unit("main.c")?;
//! for diagnostic in unit.diagnostics()?.iter() {
//!     println!("{}", diagnostic?);
//! }
//!
//! let map = clang.create_module_map_descriptor_with("Widgets", "Widgets.h")?;
//! map.save("module.modulemap")?;
//! # Ok::<(), clang_ffi::ClangError>(())
//! ```

mod collection;
mod compilation_database;
mod config;
mod diagnostic;
mod document;
mod error;
mod handle;
mod index;
mod libclang;
mod lifecycle;
mod module_map;
mod native;
mod options;
mod overlay;
mod remapping;
mod resource_usage;
mod status;
mod translation_unit;
mod unsaved_file;
mod util;

#[cfg(test)]
mod fake;

pub use compilation_database::{
    CompilationDatabase, CompileCommand, CompileCommandCollection, SourceMapping,
};
pub use config::ClangConfig;
pub use diagnostic::{Diagnostic, DiagnosticCategory, DiagnosticCollection};
pub use document::NativeDocument;
pub use error::{ClangError, Result};
pub use index::Index;
pub use libclang::Libclang;
pub use lifecycle::Clang;
pub use module_map::ModuleMapDescriptor;
pub use native::{Native, RawHandle};
pub use options::{DiagnosticDisplayOptions, GlobalOptions, ParseOptions, SaveOptions};
pub use overlay::VirtualFileOverlay;
pub use remapping::{Remapping, RemappingCollection};
pub use resource_usage::ResourceUsage;
pub use status::{
    ClangErrorCode, CodeDomain, CompilationDatabaseLoadErrorCode, DiagnosticLoadErrorCode,
    DiagnosticSeverity, NativeCode, ResourceUsageKind, TranslationUnitSaveErrorCode,
};
pub use translation_unit::TranslationUnit;
pub use unsaved_file::UnsavedFile;

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
