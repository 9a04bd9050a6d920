//! Alignment Utilities
//!
//! Rounding helpers for approximating allocator padding. The granularity is
//! validated once, so the hot helpers never have to re-check it.

use thiserror::Error;

/// Rejected alignment granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlignmentError {
    #[error("alignment must be non-zero")]
    Zero,

    #[error("alignment {0} is not a power of two")]
    NotPowerOfTwo(usize),
}

/// Alignment - a power-of-two rounding granularity
///
/// # Examples
/// ```
/// use memsize_util::Alignment;
///
/// let align = Alignment::new(8).unwrap();
/// assert_eq!(align.align_up(100), 104);
/// assert_eq!(align.align_up(64), 64);
/// assert!(Alignment::new(12).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alignment(usize);

impl Alignment {
    /// Default object alignment (8 bytes)
    pub const DEFAULT: Alignment = Alignment(8);

    /// Validate a granularity
    pub fn new(granularity: usize) -> Result<Self, AlignmentError> {
        if granularity == 0 {
            return Err(AlignmentError::Zero);
        }
        if !granularity.is_power_of_two() {
            return Err(AlignmentError::NotPowerOfTwo(granularity));
        }
        Ok(Self(granularity))
    }

    /// Granularity in bytes
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    #[inline]
    fn mask(self) -> usize {
        self.0 - 1
    }

    /// Round `value` up to the next boundary.
    ///
    /// Saturates at the largest aligned `usize` instead of wrapping.
    #[inline]
    pub fn align_up(self, value: usize) -> usize {
        match value.checked_add(self.mask()) {
            Some(bumped) => bumped & !self.mask(),
            None => usize::MAX & !self.mask(),
        }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for Alignment {
    type Error = AlignmentError;

    fn try_from(granularity: usize) -> Result<Self, Self::Error> {
        Self::new(granularity)
    }
}
