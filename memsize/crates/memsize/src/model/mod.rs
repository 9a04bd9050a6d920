//! Size Model - byte widths used by the estimator
//!
//! Node layout as charged by the walker:
//!
//! ```text
//! Record node:                         Array node:
//! ┌──────────────────────────────┐     ┌──────────────────────────────┐
//! │ object header (fixed)        │     │ array header (fixed)         │
//! ├──────────────────────────────┤     ├──────────────────────────────┤
//! │ scalar field: scalar width   │     │ scalar elements: len × width │
//! │ reference field: pointer     │     │   or                         │
//! │ embedded record: its fields  │     │ other slots: as fields       │
//! ├──────────────────────────────┤     ├──────────────────────────────┤
//! │ padding up to alignment      │     │ padding up to alignment      │
//! └──────────────────────────────┘     └──────────────────────────────┘
//! ```
//!
//! The model is immutable once built and holds no per-walk state, so one
//! instance can be shared by any number of counters.

pub mod scalar;

pub use scalar::ScalarKind;

use crate::config::EstimatorConfig;
use crate::error::Result;
use memsize_util::Alignment;
use serde::Serialize;

/// Immutable byte-width table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeModel {
    widths: [usize; ScalarKind::COUNT],
    pointer_width: usize,
    object_header_width: usize,
    array_header_width: usize,
    #[serde(serialize_with = "serialize_alignment")]
    alignment: Alignment,
}

fn serialize_alignment<S: serde::Serializer>(
    alignment: &Alignment,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(alignment.get() as u64)
}

impl SizeModel {
    /// Build a model from configuration
    ///
    /// # Errors
    ///
    /// - `Config` if the configuration does not validate
    /// - `UnknownScalar` if a `scalar_widths` key is not a scalar name
    ///
    /// # Examples
    ///
    /// ```rust
    /// use memsize::{EstimatorConfig, ScalarKind, SizeModel};
    ///
    /// let model = SizeModel::from_config(&EstimatorConfig::wide())?;
    /// assert_eq!(model.pointer_width(), 8);
    /// assert_eq!(model.scalar_width(ScalarKind::Char), 4);
    /// # Ok::<(), memsize::MemsizeError>(())
    /// ```
    pub fn from_config(config: &EstimatorConfig) -> Result<Self> {
        config.validate()?;

        let mut widths = default_widths(config.pointer_width);
        for (name, width) in &config.scalar_widths {
            let kind: ScalarKind = name.parse()?;
            widths[kind.index()] = *width;
        }

        let alignment = Alignment::new(config.alignment).map_err(|err| {
            crate::config::ConfigError::InvalidAlignment(err.to_string())
        })?;

        Ok(Self {
            widths,
            pointer_width: config.pointer_width,
            object_header_width: config.object_header_width,
            array_header_width: config.array_header_width,
            alignment,
        })
    }

    /// Width of one scalar of `kind`
    #[inline]
    pub fn scalar_width(&self, kind: ScalarKind) -> usize {
        self.widths[kind.index()]
    }

    /// Width of a scalar looked up by name
    ///
    /// Fails with `UnknownScalar` for anything that is not a scalar name,
    /// including reference types: callers must decide "scalar or reference"
    /// before asking for a width.
    pub fn width_of(&self, name: &str) -> Result<usize> {
        let kind: ScalarKind = name.parse()?;
        Ok(self.scalar_width(kind))
    }

    /// Bytes per reference field or reference array slot
    #[inline]
    pub fn pointer_width(&self) -> usize {
        self.pointer_width
    }

    /// Fixed bytes per record node
    #[inline]
    pub fn object_header_width(&self) -> usize {
        self.object_header_width
    }

    /// Fixed bytes per array node
    #[inline]
    pub fn array_header_width(&self) -> usize {
        self.array_header_width
    }

    /// Rounding granularity
    #[inline]
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Round a node subtotal up to the alignment boundary
    #[inline]
    pub fn align(&self, bytes: usize) -> usize {
        self.alignment.align_up(bytes)
    }
}

/// Default width table; `Word` follows the pointer width
fn default_widths(pointer_width: usize) -> [usize; ScalarKind::COUNT] {
    let mut widths = ScalarKind::ALL.map(ScalarKind::default_width);
    widths[ScalarKind::Word.index()] = pointer_width;
    widths
}

impl Default for SizeModel {
    fn default() -> Self {
        Self {
            widths: default_widths(4),
            pointer_width: 4,
            object_header_width: 8,
            array_header_width: 16,
            alignment: Alignment::DEFAULT,
        }
    }
}
