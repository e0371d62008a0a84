//! Bit-flag option sets passed through to libclang.

use serde::Deserialize;
use std::ops::{BitAnd, BitOr, BitOrAssign};

macro_rules! option_set {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn from_bits(bits: u32) -> Self {
                Self(bits)
            }

            pub const fn bits(self) -> u32 {
                self.0
            }

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// `self` with every flag of `other` cleared.
            pub const fn without(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }
    };
}

option_set! {
    /// `CXTranslationUnit_Flags`, plus a flag selecting the full-argv parse entry
    /// point.
    ParseOptions
}

impl ParseOptions {
    pub const NONE: Self = Self(0x00);
    pub const DETAILED_PREPROCESSING_RECORD: Self = Self(0x01);
    pub const INCOMPLETE: Self = Self(0x02);
    pub const PRECOMPILED_PREAMBLE: Self = Self(0x04);
    pub const CACHE_COMPLETION_RESULTS: Self = Self(0x08);
    pub const FOR_SERIALIZATION: Self = Self(0x10);
    pub const SKIP_FUNCTION_BODIES: Self = Self(0x40);
    pub const INCLUDE_BRIEF_COMMENTS_IN_CODE_COMPLETION: Self = Self(0x80);
    pub const CREATE_PREAMBLE_ON_FIRST_PARSE: Self = Self(0x100);

    /// The argument list already starts with the compiler executable.
    ///
    /// Never forwarded to libclang; it selects
    /// `clang_parseTranslationUnit2FullArgv` instead.
    pub const ARGUMENTS_ARE_FULL_COMMAND_LINE: Self = Self(0x4000_0000);
}

option_set! {
    /// `CXGlobalOptFlags`
    GlobalOptions
}

impl GlobalOptions {
    pub const NONE: Self = Self(0x0);
    pub const THREAD_BACKGROUND_PRIORITY_FOR_INDEXING: Self = Self(0x1);
    pub const THREAD_BACKGROUND_PRIORITY_FOR_EDITING: Self = Self(0x2);
    pub const THREAD_BACKGROUND_PRIORITY_FOR_ALL: Self = Self(0x3);
}

option_set! {
    /// `CXSaveTranslationUnit_Flags`
    SaveOptions
}

impl SaveOptions {
    pub const NONE: Self = Self(0);
}

option_set! {
    /// `CXDiagnosticDisplayOptions`
    DiagnosticDisplayOptions
}

impl DiagnosticDisplayOptions {
    pub const NONE: Self = Self(0x00);
    pub const SOURCE_LOCATION: Self = Self(0x01);
    pub const COLUMN: Self = Self(0x02);
    pub const SOURCE_RANGES: Self = Self(0x04);
    pub const OPTION: Self = Self(0x08);
    pub const CATEGORY_ID: Self = Self(0x10);
    pub const CATEGORY_NAME: Self = Self(0x20);
}
