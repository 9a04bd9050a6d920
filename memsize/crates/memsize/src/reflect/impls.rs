//! Descriptors for standard library and memsize-util types.

use super::{Borrowed, Elements, FieldType, Record, Reflect, Shape, Slot};
use crate::model::ScalarKind;
use memsize_util::Atom;
use std::cell::{Cell, RefCell};
use std::rc::{self, Rc};
use std::sync::{self, Arc};

macro_rules! scalar_field {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FieldType for $ty {
                const SCALAR: Option<ScalarKind> = Some(ScalarKind::$kind);

                #[inline]
                fn slot(&self) -> Slot<'_> {
                    Slot::Scalar(ScalarKind::$kind)
                }
            }

            impl FieldType for Cell<$ty> {
                const SCALAR: Option<ScalarKind> = Some(ScalarKind::$kind);

                #[inline]
                fn slot(&self) -> Slot<'_> {
                    Slot::Scalar(ScalarKind::$kind)
                }
            }
        )*
    };
}

scalar_field! {
    bool => Bool,
    u8 => Byte,
    i8 => Byte,
    u16 => Short,
    i16 => Short,
    char => Char,
    u32 => Int,
    i32 => Int,
    f32 => Float,
    u64 => Long,
    i64 => Long,
    f64 => Double,
    usize => Word,
    isize => Word,
}

/// `None` of a scalar is still a scalar; `None` of anything else is a null
/// reference slot.
impl<T: FieldType> FieldType for Option<T> {
    const SCALAR: Option<ScalarKind> = T::SCALAR;

    fn slot(&self) -> Slot<'_> {
        match (self, T::SCALAR) {
            (Some(value), _) => value.slot(),
            (None, Some(kind)) => Slot::Scalar(kind),
            (None, None) => Slot::Ref(None),
        }
    }
}

impl<T: Reflect> FieldType for Box<T> {
    fn slot(&self) -> Slot<'_> {
        Slot::Ref(Some(&**self))
    }
}

impl<T: Reflect> FieldType for Rc<T> {
    fn slot(&self) -> Slot<'_> {
        Slot::Ref(Some(&**self))
    }
}

impl<T: Reflect> FieldType for Arc<T> {
    fn slot(&self) -> Slot<'_> {
        Slot::Ref(Some(&**self))
    }
}

impl<T> FieldType for rc::Weak<T> {
    fn slot(&self) -> Slot<'_> {
        Slot::Weak
    }
}

impl<T> FieldType for sync::Weak<T> {
    fn slot(&self) -> Slot<'_> {
        Slot::Weak
    }
}

impl<'a, T: Reflect> FieldType for &'a T {
    fn slot(&self) -> Slot<'_> {
        Slot::Ref(Some(*self))
    }
}

// Strings are byte arrays of their current length; spare capacity is not
// charged.

impl Reflect for String {
    fn type_name(&self) -> &'static str {
        "alloc::string::String"
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Array(Elements::Scalars {
            kind: ScalarKind::Byte,
            len: self.len(),
        })
    }
}

impl FieldType for String {
    fn slot(&self) -> Slot<'_> {
        Slot::Ref(Some(self))
    }
}

impl<T: FieldType> Reflect for Vec<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Array(Elements::of(self.as_slice()))
    }
}

impl<T: FieldType> FieldType for Vec<T> {
    fn slot(&self) -> Slot<'_> {
        Slot::Ref(Some(self))
    }
}

/// Fixed-size arrays live inside their owner: elements are charged in place
/// with no array header. Record elements are flattened the same way.
impl<T: FieldType, const N: usize> Reflect for [T; N] {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Array(Elements::of(&self[..]))
    }
}

impl<T: FieldType, const N: usize> FieldType for [T; N] {
    fn slot(&self) -> Slot<'_> {
        Slot::Embedded(self)
    }
}

/// A `RefCell` is its borrow flag followed by the value, charged the way the
/// value would be charged as a field. The value is read under a shared
/// borrow held until the walk ends. While the value is mutably borrowed it
/// cannot be read and contributes nothing.
impl<T: FieldType> Reflect for RefCell<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn shape(&self) -> Shape<'_> {
        let value = match Borrowed::try_new(self) {
            Some(borrowed) => Slot::Borrowed(borrowed),
            None => Slot::Inaccessible,
        };

        Record::with_capacity(2)
            .slot("borrow", Slot::Scalar(ScalarKind::Word))
            .slot("value", value)
            .build()
    }
}

impl<T: FieldType> FieldType for RefCell<T> {
    fn slot(&self) -> Slot<'_> {
        Slot::Embedded(self)
    }
}

impl Reflect for Atom {
    fn type_name(&self) -> &'static str {
        "memsize_util::symbol::Atom"
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Array(Elements::Scalars {
            kind: ScalarKind::Byte,
            len: self.len(),
        })
    }

    fn canonical_form(&self) -> Option<super::Identity> {
        self.is_canonical().then(|| self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_constants() {
        assert_eq!(<u16 as FieldType>::SCALAR, Some(ScalarKind::Short));
        assert_eq!(<Cell<f64> as FieldType>::SCALAR, Some(ScalarKind::Double));
        assert_eq!(<Option<i64> as FieldType>::SCALAR, Some(ScalarKind::Long));
        assert_eq!(<String as FieldType>::SCALAR, None);
    }

    #[test]
    fn test_none_scalar_still_charged() {
        let missing: Option<u32> = None;
        assert!(matches!(missing.slot(), Slot::Scalar(ScalarKind::Int)));

        let missing: Option<Box<String>> = None;
        assert!(matches!(missing.slot(), Slot::Ref(None)));
    }

    #[test]
    fn test_string_is_byte_array() {
        let text = String::from("hello");
        match text.shape() {
            Shape::Array(Elements::Scalars { kind, len }) => {
                assert_eq!(kind, ScalarKind::Byte);
                assert_eq!(len, 5);
            },
            other => panic!("unexpected shape {:?}", other),
        };
    }

    #[test]
    fn test_weak_is_not_followed() {
        let strong = Rc::new(String::from("target"));
        let weak = Rc::downgrade(&strong);
        assert!(matches!(weak.slot(), Slot::Weak));
    }

    #[test]
    fn test_refcell_mutably_borrowed_is_inaccessible() {
        let cell = RefCell::new(String::from("busy"));
        let _guard = cell.borrow_mut();
        let Shape::Record(fields) = cell.shape() else {
            panic!("expected a record");
        };
        assert!(matches!(fields[1].slot, Slot::Inaccessible));
    }

    #[test]
    fn test_refcell_shared_borrow_is_readable() {
        let cell = RefCell::new(String::from("idle"));
        let _guard = cell.borrow();
        let Shape::Record(fields) = cell.shape() else {
            panic!("expected a record");
        };
        let Slot::Borrowed(borrowed) = &fields[1].slot else {
            panic!("expected a borrowed slot");
        };
        assert!(matches!(borrowed.inner(), Slot::Ref(Some(_))));
    }

    #[test]
    fn test_refcell_shape_blocks_mutation_while_alive() {
        let cell = RefCell::new(String::from("held"));
        let shape = cell.shape();
        assert!(cell.try_borrow_mut().is_err());
        drop(shape);
        assert!(cell.try_borrow_mut().is_ok());
    }

    #[test]
    fn test_atom_is_canonical() {
        let atom = Atom::intern("reflect.impls.test");
        assert_eq!(atom.canonical_form(), Some(atom.identity()));
    }
}
