//! Reflect Module - type descriptors for the graph walker
//!
//! Rust has no runtime field enumeration, so every type the estimator can
//! look into describes itself:
//!
//! - [`Reflect`] is implemented by anything that can be a node of the graph
//!   (records, arrays, strings, shared cells). It reports a type name, an
//!   identity and a [`Shape`].
//! - [`FieldType`] is implemented by anything that can be stored in a field
//!   or array slot. It decides how that storage is charged: as a scalar, as
//!   a reference to another node, as a weak reference, or as a record
//!   embedded in place.
//! - [`Borrowed`] carries a value read through a `RefCell` together with
//!   the borrow that makes reading it sound.
//!
//! # Shapes
//!
//! ```text
//! Shape::Record                         Shape::Array
//! ┌───────────┬──────────────────┐      ┌──────────────────────────────┐
//! │ field     │ slot             │      │ Elements::Scalars { kind, n }│
//! ├───────────┼──────────────────┤      │   or                         │
//! │ width     │ Scalar(Int)      │      │ Elements::Slots([slot, ...]) │
//! │ font      │ Ref(Some(&Font)) │      └──────────────────────────────┘
//! │ parent    │ Weak             │
//! │ base      │ Embedded(&Base)  │
//! │ cache     │ Inaccessible     │
//! └───────────┴──────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust
//! use memsize::reflect::{Record, Reflect, Shape};
//!
//! struct Insets {
//!     top: u16,
//!     left: u16,
//! }
//!
//! impl Reflect for Insets {
//!     fn type_name(&self) -> &'static str {
//!         std::any::type_name::<Self>()
//!     }
//!
//!     fn shape(&self) -> Shape<'_> {
//!         Record::new().field("top", &self.top).field("left", &self.left).build()
//!     }
//! }
//! ```

pub mod impls;

use crate::model::ScalarKind;
use std::cell::{Ref, RefCell};
use std::fmt;

/// Identity of a node: where it lives and what it is
///
/// Two distinct objects with equal contents have different identities. The
/// type name is part of the key so that a record and a container stored at
/// offset 0 inside it are not mistaken for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    addr: usize,
    type_name: &'static str,
}

impl Identity {
    /// Identity of a live value
    pub fn of<T: Reflect + ?Sized>(value: &T) -> Self {
        Self {
            addr: value as *const T as *const () as usize,
            type_name: value.type_name(),
        }
    }

    /// Identity from raw parts
    pub const fn from_parts(addr: usize, type_name: &'static str) -> Self {
        Self { addr, type_name }
    }

    /// Storage address
    #[inline]
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Concrete type name
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.type_name, self.addr)
    }
}

/// A node of the object graph
///
/// Implementations must be side-effect free: the walker may call `shape`
/// exactly once per node and assumes the graph does not change meanwhile.
pub trait Reflect {
    /// Concrete type name, normally `std::any::type_name::<Self>()`
    fn type_name(&self) -> &'static str;

    /// Describe the fields or elements of this node
    fn shape(&self) -> Shape<'_>;

    /// Key used by the visited set
    fn identity(&self) -> Identity {
        Identity::of(self)
    }

    /// Identity of the canonical (interned) instance equal to this value
    ///
    /// A node whose canonical form is itself is shared program-wide and is
    /// not charged to any graph. Most types have no canonical form.
    fn canonical_form(&self) -> Option<Identity> {
        None
    }
}

/// Layout of one node
#[derive(Debug)]
pub enum Shape<'g> {
    /// Record with named fields
    Record(Vec<Field<'g>>),
    /// Homogeneous sequence
    Array(Elements<'g>),
}

impl<'g> Shape<'g> {
    /// Empty record
    pub fn empty() -> Self {
        Shape::Record(Vec::new())
    }
}

/// Whether a field belongs to each instance or to the type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Instance,
    /// Shared by all instances; never charged
    Static,
}

/// One field of a record
#[derive(Debug)]
pub struct Field<'g> {
    pub name: &'static str,
    pub storage: Storage,
    pub slot: Slot<'g>,
}

impl<'g> Field<'g> {
    /// Per-instance field
    pub fn instance(name: &'static str, slot: Slot<'g>) -> Self {
        Self {
            name,
            storage: Storage::Instance,
            slot,
        }
    }
}

/// How the storage of one field is charged
pub enum Slot<'g> {
    /// Inline scalar, charged its width
    Scalar(ScalarKind),
    /// Owning or shared reference, charged one pointer; the target is walked
    Ref(Option<&'g dyn Reflect>),
    /// Non-owning reference, charged one pointer; never walked
    Weak,
    /// Record or array stored by value; its own fields are charged in place
    Embedded(&'g dyn Reflect),
    /// Storage that cannot be read right now; charged nothing
    Inaccessible,
    /// Value behind a shared `RefCell` borrow, charged as its inner slot
    Borrowed(Borrowed<'g>),
}

impl<'g> Slot<'g> {
    /// Check if this slot is a scalar
    pub fn is_scalar(&self) -> bool {
        matches!(self, Slot::Scalar(_))
    }
}

impl fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Scalar(kind) => write!(f, "Scalar({})", kind),
            Slot::Ref(Some(target)) => write!(f, "Ref({})", target.type_name()),
            Slot::Ref(None) => f.write_str("Ref(null)"),
            Slot::Weak => f.write_str("Weak"),
            Slot::Embedded(inner) => write!(f, "Embedded({})", inner.type_name()),
            Slot::Inaccessible => f.write_str("Inaccessible"),
            Slot::Borrowed(borrowed) => write!(f, "{:?}", borrowed),
        }
    }
}

trait Guard {}

impl<T: ?Sized> Guard for Ref<'_, T> {}

/// A live shared borrow of a `RefCell`
///
/// Dropping it releases the borrow.
pub(crate) struct BorrowGuard<'g> {
    _borrow: Box<dyn Guard + 'g>,
}

/// Slot of a value stored in a `RefCell`, paired with the shared borrow
/// that keeps it readable
///
/// The inner slot is only handed to the walker, which holds the borrow
/// until the walk ends. While it is held, `borrow_mut` on the cell fails.
pub struct Borrowed<'g> {
    slot: Box<Slot<'g>>,
    guard: BorrowGuard<'g>,
}

impl<'g> Borrowed<'g> {
    /// Borrow `cell` for reading; `None` while it is mutably borrowed
    pub fn try_new<T: FieldType>(cell: &'g RefCell<T>) -> Option<Self> {
        let guard = cell.try_borrow().ok()?;
        let value: *const T = &*guard;
        // SAFETY: `value` points into `cell`, not into `guard`, so moving the
        // guard does not move it. The shared borrow held by `guard` keeps
        // the value from being replaced or dropped, and the guard is
        // released only after the last use of `slot`.
        let value: &'g T = unsafe { &*value };
        Some(Self {
            slot: Box::new(value.slot()),
            guard: BorrowGuard {
                _borrow: Box::new(guard),
            },
        })
    }

    /// Split into the inner slot and the borrow that must outlive it
    pub(crate) fn into_parts(self) -> (Slot<'g>, BorrowGuard<'g>) {
        (*self.slot, self.guard)
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Slot<'g> {
        &self.slot
    }
}

impl fmt::Debug for Borrowed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Borrowed({:?})", self.slot)
    }
}

/// Elements of an array node
pub enum Elements<'g> {
    /// `len` scalars of one kind
    Scalars { kind: ScalarKind, len: usize },
    /// One slot per element, charged the way a field holding it would be
    Slots(Vec<Slot<'g>>),
}

impl<'g> Elements<'g> {
    /// Describe a slice of stored values
    ///
    /// Scalar element types produce `Scalars`; anything else produces one
    /// slot per element. Records stored by value stay embedded, so they are
    /// charged in place without a header of their own.
    pub fn of<T: FieldType>(items: &'g [T]) -> Self {
        match T::SCALAR {
            Some(kind) => Elements::Scalars {
                kind,
                len: items.len(),
            },
            None => Elements::Slots(items.iter().map(FieldType::slot).collect()),
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Elements::Scalars { len, .. } => *len,
            Elements::Slots(items) => items.len(),
        }
    }

    /// Check if there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Elements<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Elements::Scalars { kind, len } => write!(f, "Scalars({} x {})", len, kind),
            Elements::Slots(items) => write!(f, "Slots(len={})", items.len()),
        }
    }
}

/// How a stored value is charged
///
/// `SCALAR` is `Some` for scalar types so arrays of them can be priced
/// without visiting each element.
pub trait FieldType {
    const SCALAR: Option<ScalarKind> = None;

    fn slot(&self) -> Slot<'_>;
}

/// Builder for [`Shape::Record`]
#[derive(Debug, Default)]
pub struct Record<'g> {
    fields: Vec<Field<'g>>,
}

impl<'g> Record<'g> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Add an instance field charged by its `FieldType`
    pub fn field<T: FieldType>(self, name: &'static str, value: &'g T) -> Self {
        self.slot(name, value.slot())
    }

    /// Add an instance field with an explicit slot
    pub fn slot(mut self, name: &'static str, slot: Slot<'g>) -> Self {
        self.fields.push(Field::instance(name, slot));
        self
    }

    /// Add a type-level field; listed for completeness, never charged
    pub fn static_field(mut self, name: &'static str, slot: Slot<'g>) -> Self {
        self.fields.push(Field {
            name,
            storage: Storage::Static,
            slot,
        });
        self
    }

    /// Flatten a base record's fields into this one
    pub fn extends(self, base: &'g dyn Reflect) -> Self {
        self.slot("super", Slot::Embedded(base))
    }

    pub fn build(self) -> Shape<'g> {
        Shape::Record(self.fields)
    }
}

impl<'g> From<Record<'g>> for Shape<'g> {
    fn from(record: Record<'g>) -> Self {
        record.build()
    }
}

/// Implement [`Reflect`] and [`FieldType`] for a plain record type.
///
/// Every listed field must implement [`FieldType`]. Stored by value inside
/// another record, the type is embedded; behind `Box`, `Rc` or `Arc` it is a
/// node of its own.
///
/// ```rust
/// use std::rc::Rc;
///
/// struct Font {
///     size: u8,
///     bold: bool,
/// }
///
/// struct Style {
///     fg_color: u32,
///     bg_color: u32,
///     font: Option<Rc<Font>>,
/// }
///
/// memsize::reflect_record!(Font { size, bold });
/// memsize::reflect_record!(Style { fg_color, bg_color, font });
/// ```
#[macro_export]
macro_rules! reflect_record {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::reflect::Reflect for $ty {
            fn type_name(&self) -> &'static str {
                ::std::any::type_name::<$ty>()
            }

            fn shape(&self) -> $crate::reflect::Shape<'_> {
                $crate::reflect::Record::new()
                    $(.field(stringify!($field), &self.$field))*
                    .build()
            }
        }

        impl $crate::reflect::FieldType for $ty {
            fn slot(&self) -> $crate::reflect::Slot<'_> {
                $crate::reflect::Slot::Embedded(self)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i32,
        y: i32,
    }

    crate::reflect_record!(Point { x, y });

    struct Labelled {
        origin: Point,
        tag: Option<Box<Point>>,
    }

    crate::reflect_record!(Labelled { origin, tag });

    #[test]
    fn test_macro_lists_fields_in_order() {
        let point = Point { x: 1, y: 2 };
        let Shape::Record(fields) = point.shape() else {
            panic!("expected a record");
        };
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["x", "y"]);
        assert!(fields.iter().all(|f| f.slot.is_scalar()));
    }

    #[test]
    fn test_by_value_record_is_embedded() {
        let labelled = Labelled {
            origin: Point { x: 0, y: 0 },
            tag: None,
        };
        let Shape::Record(fields) = labelled.shape() else {
            panic!("expected a record");
        };
        assert!(matches!(fields[0].slot, Slot::Embedded(_)));
        assert!(matches!(fields[1].slot, Slot::Ref(None)));
    }

    #[test]
    fn test_identity_distinguishes_type_at_same_address() {
        let labelled = Labelled {
            origin: Point { x: 0, y: 0 },
            tag: None,
        };
        let outer = Identity::of(&labelled);
        let inner = Identity::from_parts(outer.addr(), labelled.origin.type_name());
        assert_ne!(outer, inner);
    }

    #[test]
    fn test_elements_of_scalars_and_refs() {
        let numbers = [1u32, 2, 3];
        assert!(matches!(
            Elements::of(&numbers[..]),
            Elements::Scalars { kind: ScalarKind::Int, len: 3 }
        ));

        let boxes = vec![Some(Box::new(Point { x: 1, y: 1 })), None];
        let Elements::Slots(items) = Elements::of(&boxes[..]) else {
            panic!("expected slot elements");
        };
        assert!(matches!(items[0], Slot::Ref(Some(_))));
        assert!(matches!(items[1], Slot::Ref(None)));
    }

    #[test]
    fn test_elements_of_records_stay_embedded() {
        let points = [Point { x: 1, y: 2 }, Point { x: 3, y: 4 }];
        let Elements::Slots(items) = Elements::of(&points[..]) else {
            panic!("expected slot elements");
        };
        assert!(items.iter().all(|slot| matches!(slot, Slot::Embedded(_))));
    }

    #[test]
    fn test_borrowed_holds_shared_borrow() {
        let cell = RefCell::new(Point { x: 0, y: 0 });
        let borrowed = Borrowed::try_new(&cell).expect("cell is not borrowed");

        assert!(cell.try_borrow_mut().is_err());
        assert!(matches!(borrowed.inner(), Slot::Embedded(_)));

        drop(borrowed);
        assert!(cell.try_borrow_mut().is_ok());
    }

    #[test]
    fn test_borrowed_refused_while_mutably_borrowed() {
        let cell = RefCell::new(Point { x: 0, y: 0 });
        let _guard = cell.borrow_mut();
        assert!(Borrowed::try_new(&cell).is_none());
    }

    #[test]
    fn test_static_field_storage() {
        let point = Point { x: 0, y: 0 };
        let Shape::Record(fields) = Record::new()
            .field("x", &point.x)
            .static_field("ORIGIN", Slot::Embedded(&point))
            .build()
        else {
            panic!("expected a record");
        };
        assert_eq!(fields[1].storage, Storage::Static);
    }
}
