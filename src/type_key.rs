use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a concrete type, used to index segments
///
/// Equality and hashing only look at the [`TypeId`]; the type name is carried
/// along for error messages and debug output.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key for `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The name of the type, as reported by [`std::any::type_name`]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check if this key identifies `T`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Runtime access to the concrete type behind a trait object
///
/// Implemented for every sized `'static` type. Make it a supertrait of your
/// shared interface to allow type-erased insertion:
///
/// ```
/// use sovran_polystore::{Concrete, TypeKey};
///
/// trait Shape: Concrete {
///     fn area(&self) -> f64;
/// }
///
/// struct Square(f64);
///
/// impl Shape for Square {
///     fn area(&self) -> f64 { self.0 * self.0 }
/// }
///
/// let shape: Box<dyn Shape> = Box::new(Square(2.0));
/// assert_eq!((*shape).concrete_type(), TypeKey::of::<Square>());
/// ```
pub trait Concrete: Any {
    /// The key of the value's most-derived type
    fn concrete_type(&self) -> TypeKey;

    /// Converts the boxed value into `Box<dyn Any>` so it can be downcast
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> Concrete for T {
    fn concrete_type(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Views a concrete `T` through the shared interface `Self`
///
/// `Self` is the interface type, usually `dyn Trait`. Rust cannot express the
/// unsizing coercion `T -> dyn Trait` for a generic trait, so each interface
/// implements this once for all of its implementors, normally through
/// [`impl_upcast!`](crate::impl_upcast).
pub trait UpcastFrom<T> {
    /// Borrows `value` as the interface type
    fn upcast(value: &T) -> &Self;

    /// Mutably borrows `value` as the interface type
    fn upcast_mut(value: &mut T) -> &mut Self;

    /// Converts an owning handle into a handle to the interface type
    fn upcast_box(value: Box<T>) -> Box<Self>;
}

/// Implements [`UpcastFrom`] for a trait object type and every implementor of
/// the trait
///
/// ```
/// use sovran_polystore::{impl_upcast, UpcastFrom};
///
/// trait Greeter {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String { "Hello".to_string() }
/// }
///
/// impl_upcast!(dyn Greeter);
///
/// let english = English;
/// let greeter: &dyn Greeter = <dyn Greeter as UpcastFrom<English>>::upcast(&english);
/// assert_eq!(greeter.greet(), "Hello");
/// ```
#[macro_export]
macro_rules! impl_upcast {
    ($(dyn $interface:path),+ $(,)?) => {
        $(
            impl<T: $interface + 'static> $crate::UpcastFrom<T> for dyn $interface {
                fn upcast(value: &T) -> &Self {
                    value
                }

                fn upcast_mut(value: &mut T) -> &mut Self {
                    value
                }

                fn upcast_box(value: ::std::boxed::Box<T>) -> ::std::boxed::Box<Self> {
                    value
                }
            }
        )+
    };
}

impl<T: Any> UpcastFrom<T> for dyn Any {
    fn upcast(value: &T) -> &Self {
        value
    }

    fn upcast_mut(value: &mut T) -> &mut Self {
        value
    }

    fn upcast_box(value: Box<T>) -> Box<Self> {
        value
    }
}

impl_upcast!(dyn fmt::Debug);
