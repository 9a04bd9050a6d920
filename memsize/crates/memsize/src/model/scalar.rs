//! Scalar kinds and their default widths.

use crate::error::MemsizeError;
use serde::Serialize;
use static_assertions::const_assert_eq;
use std::fmt;
use std::str::FromStr;

/// Kind of a scalar (non-reference) field or array element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Byte,
    Short,
    Char,
    Int,
    Float,
    Long,
    Double,
    /// Pointer-sized integer (`usize`/`isize`)
    Word,
}

const_assert_eq!(ScalarKind::Word as usize + 1, ScalarKind::COUNT);

impl ScalarKind {
    /// Number of scalar kinds
    pub const COUNT: usize = 9;

    /// Every kind, in table order
    pub const ALL: [ScalarKind; ScalarKind::COUNT] = [
        ScalarKind::Bool,
        ScalarKind::Byte,
        ScalarKind::Short,
        ScalarKind::Char,
        ScalarKind::Int,
        ScalarKind::Float,
        ScalarKind::Long,
        ScalarKind::Double,
        ScalarKind::Word,
    ];

    /// Position in the width table
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical lowercase name
    pub const fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Byte => "byte",
            ScalarKind::Short => "short",
            ScalarKind::Char => "char",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Long => "long",
            ScalarKind::Double => "double",
            ScalarKind::Word => "word",
        }
    }

    /// Width used when the configuration does not override it
    ///
    /// A [`SizeModel`](crate::SizeModel) replaces the `Word` entry with its
    /// pointer width.
    pub const fn default_width(self) -> usize {
        match self {
            ScalarKind::Bool | ScalarKind::Byte => 1,
            ScalarKind::Short | ScalarKind::Char => 2,
            ScalarKind::Int | ScalarKind::Float => 4,
            ScalarKind::Long | ScalarKind::Double | ScalarKind::Word => 8,
        }
    }
}

impl FromStr for ScalarKind {
    type Err = MemsizeError;

    /// Accepts the canonical names and the matching Rust primitive names.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let kind = match name.trim() {
            "bool" | "boolean" => ScalarKind::Bool,
            "byte" | "i8" | "u8" => ScalarKind::Byte,
            "short" | "i16" | "u16" => ScalarKind::Short,
            "char" => ScalarKind::Char,
            "int" | "i32" | "u32" => ScalarKind::Int,
            "float" | "f32" => ScalarKind::Float,
            "long" | "i64" | "u64" => ScalarKind::Long,
            "double" | "f64" => ScalarKind::Double,
            "word" | "usize" | "isize" => ScalarKind::Word,
            other => {
                return Err(MemsizeError::UnknownScalar {
                    name: other.to_string(),
                })
            },
        };
        Ok(kind)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
