//! # memsize-util
//!
//! Small building blocks shared by the memsize crates:
//!
//! - [`alignment`]: validated power-of-two rounding used to approximate
//!   allocator padding
//! - [`symbol`]: the global atom table, whose atoms are the canonical
//!   (interned) values the estimator refuses to charge to any one graph
//!
//! # Examples
//!
//! ```
//! use memsize_util::{Alignment, Atom};
//!
//! let eight = Alignment::new(8).unwrap();
//! assert_eq!(eight.align_up(13), 16);
//!
//! let a = Atom::intern("Button.fgColor");
//! let b = Atom::intern("Button.fgColor");
//! assert!(std::ptr::eq(a, b));
//! ```

pub mod alignment;
pub mod symbol;

pub use alignment::{Alignment, AlignmentError};
pub use symbol::{Atom, InternerStats};
