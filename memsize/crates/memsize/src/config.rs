//! Configuration Module - Layout Model and Skip Rules
//!
//! Every constant the estimator uses comes from here. The defaults describe
//! a compact 32-bit object layout (4-byte references, 8-byte object headers,
//! 16-byte array headers, 8-byte alignment). They are guesses about a
//! typical allocator, not measurements, so all of them can be overridden.

use indexmap::IndexMap;
use memsize_util::Alignment;

/// Main configuration for a [`MemoryCounter`](crate::MemoryCounter)
///
/// # Examples
///
/// ```rust
/// use memsize::EstimatorConfig;
///
/// // Compact layout
/// let config = EstimatorConfig::default();
/// assert_eq!(config.pointer_width, 4);
///
/// // 64-bit layout with an opaque toolkit type
/// let config = EstimatorConfig {
///     opaque_types: vec!["toolkit::Resources".to_string()],
///     ..EstimatorConfig::wide()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// Bytes charged for one reference field or reference array slot
    ///
    /// Default: 4
    pub pointer_width: usize,

    /// Fixed bookkeeping bytes charged once per record node
    ///
    /// Default: 8
    pub object_header_width: usize,

    /// Fixed bytes charged once per array node, before its elements
    ///
    /// Default: 16
    pub array_header_width: usize,

    /// Granularity every node subtotal is rounded up to
    ///
    /// Must be a power of two. Default: 8
    pub alignment: usize,

    /// Per-kind width overrides keyed by scalar name (`"char"`, `"i64"`, ...)
    ///
    /// Unknown names are rejected when the size model is built.
    /// Default: empty
    pub scalar_widths: IndexMap<String, usize>,

    /// Exact type names whose internals are never charged
    ///
    /// Default: empty
    pub opaque_types: Vec<String>,

    /// Type-name prefixes whose internals are never charged
    ///
    /// Useful for excluding a whole library namespace.
    /// Default: empty
    pub opaque_prefixes: Vec<String>,

    /// Exclude values that are their own canonical (interned) form
    ///
    /// Default: true
    pub skip_canonical: bool,

    /// Emit walk events to the global logger
    ///
    /// Default: false
    pub verbose: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            pointer_width: 4,
            object_header_width: 8,
            array_header_width: 16,
            alignment: 8,
            scalar_widths: IndexMap::new(),
            opaque_types: Vec::new(),
            opaque_prefixes: Vec::new(),
            skip_canonical: true,
            verbose: false,
        }
    }
}

impl EstimatorConfig {
    /// Compact layout, identical to `Default`
    pub fn compact() -> Self {
        Self::default()
    }

    /// 64-bit layout without reference compression
    pub fn wide() -> Self {
        let mut scalar_widths = IndexMap::new();
        scalar_widths.insert("char".to_string(), 4);

        EstimatorConfig {
            pointer_width: 8,
            object_header_width: 16,
            array_header_width: 24,
            scalar_widths,
            ..Self::default()
        }
    }

    /// Validate configuration
    ///
    /// Scalar override names are checked later, by
    /// [`SizeModel::from_config`](crate::SizeModel::from_config), which knows
    /// the scalar kinds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use memsize::EstimatorConfig;
    ///
    /// let config = EstimatorConfig {
    ///     alignment: 12,
    ///     ..Default::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pointer_width == 0 {
            return Err(ConfigError::InvalidPointerWidth(
                "pointer_width must be > 0".to_string(),
            ));
        }

        if let Err(err) = Alignment::new(self.alignment) {
            return Err(ConfigError::InvalidAlignment(err.to_string()));
        }

        if let Some((name, _)) = self.scalar_widths.iter().find(|(_, width)| **width == 0) {
            return Err(ConfigError::InvalidScalarWidth(format!(
                "width for {} must be > 0",
                name
            )));
        }

        if self.opaque_types.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidOpaqueType(
                "opaque type names must not be empty".to_string(),
            ));
        }

        if self.opaque_prefixes.iter().any(|prefix| prefix.trim().is_empty()) {
            return Err(ConfigError::InvalidOpaqueType(
                "an empty prefix would make every type opaque".to_string(),
            ));
        }

        Ok(())
    }

    /// Build configuration from environment variables
    ///
    /// Overrides defaults with environment variables:
    /// - MEMSIZE_POINTER_WIDTH
    /// - MEMSIZE_OBJECT_HEADER
    /// - MEMSIZE_ARRAY_HEADER
    /// - MEMSIZE_ALIGNMENT
    /// - MEMSIZE_OPAQUE (comma-separated type names)
    /// - MEMSIZE_VERBOSE
    ///
    /// Unparseable values are ignored.
    ///
    /// # Examples
    ///
    /// ```bash
    /// export MEMSIZE_POINTER_WIDTH=8
    /// export MEMSIZE_OPAQUE=toolkit::Resources,toolkit::UiBuilder
    /// ```
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(width) = env_usize("MEMSIZE_POINTER_WIDTH") {
            config.pointer_width = width;
        }

        if let Some(width) = env_usize("MEMSIZE_OBJECT_HEADER") {
            config.object_header_width = width;
        }

        if let Some(width) = env_usize("MEMSIZE_ARRAY_HEADER") {
            config.array_header_width = width;
        }

        if let Some(alignment) = env_usize("MEMSIZE_ALIGNMENT") {
            config.alignment = alignment;
        }

        if let Ok(val) = std::env::var("MEMSIZE_OPAQUE") {
            config.opaque_types = split_list(&val);
        }

        if let Ok(val) = std::env::var("MEMSIZE_VERBOSE") {
            config.verbose = val == "1" || val.eq_ignore_ascii_case("true");
        }

        config
    }
}

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pointer width: {0}")]
    InvalidPointerWidth(String),

    #[error("Invalid alignment: {0}")]
    InvalidAlignment(String),

    #[error("Invalid scalar width: {0}")]
    InvalidScalarWidth(String),

    #[error("Invalid opaque type: {0}")]
    InvalidOpaqueType(String),
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.trim().parse().ok()
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
