//! Static types described at runtime
//!
//! [`Reflect`] connects a Rust type to its [`TypeDescriptor`] and converts
//! between typed values and [`Value`]s. It is implemented here for the
//! primitives, `String`, `Vec<T>`, [`ErrorValue`] and the interface wrappers
//! [`AnyValue`] and [`DisplayValue`]. User types opt in with
//! [`impl_reflect!`](crate::impl_reflect).

use crate::types::{DISPLAY_CAPABILITY, ERROR_CAPABILITY, Type, TypeDescriptor};
use crate::value::{ErrorValue, Value};
use std::sync::OnceLock;

/// A Rust type with a runtime type descriptor
pub trait Reflect: Clone + Send + Sync + 'static {
    /// Whether this type, in last parameter position, marks a variadic tail
    const VARIADIC: bool = false;

    /// Runtime descriptor of the type
    fn descriptor() -> Type;

    /// Convert into a dynamic value typed by [`Reflect::descriptor`]
    fn into_value(self) -> Value;

    /// Convert back from a dynamic value, `None` if the payload does not match
    fn from_value(value: Value) -> Option<Self>;
}

/// Implement [`Reflect`] and [`Returns`](crate::Returns) for a concrete
/// type with a `Default` value.
///
/// ```rust,ignore
/// #[derive(Clone, Default)]
/// struct UserId(u64);
///
/// funconv::impl_reflect!(UserId, "UserId", funconv::DISPLAY_CAPABILITY);
/// ```
#[macro_export]
macro_rules! impl_reflect {
    ($ty:ty, $name:expr $(, $capability:expr)* $(,)?) => {
        impl $crate::Reflect for $ty {
            fn descriptor() -> $crate::Type {
                static DESCRIPTOR: ::std::sync::OnceLock<$crate::Type> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR
                    .get_or_init(|| {
                        $crate::TypeDescriptor::concrete::<$ty>($name)
                            $(.with_capability($capability))*
                            .shared()
                    })
                    .clone()
            }

            fn into_value(self) -> $crate::Value {
                $crate::Value::of(<Self as $crate::Reflect>::descriptor(), self)
            }

            fn from_value(value: $crate::Value) -> ::std::option::Option<Self> {
                value.into_inner::<Self>()
            }
        }

        $crate::impl_single_return!($ty);
    };
}

/// Implement [`Returns`](crate::Returns) for a single [`Reflect`] type.
#[doc(hidden)]
#[macro_export]
macro_rules! impl_single_return {
    ($ty:ty) => {
        impl $crate::Returns for $ty {
            fn descriptors() -> ::std::vec::Vec<$crate::Type> {
                ::std::vec![<$ty as $crate::Reflect>::descriptor()]
            }

            fn into_values(self) -> ::std::vec::Vec<$crate::Value> {
                ::std::vec![$crate::Reflect::into_value(self)]
            }

            fn from_values(
                values: ::std::vec::Vec<$crate::Value>,
            ) -> ::std::result::Result<Self, $crate::ConversionFailure> {
                $crate::function::decode_single::<$ty>(values)
            }
        }
    };
}

impl_reflect!(bool, "bool", DISPLAY_CAPABILITY);
impl_reflect!(i8, "i8", DISPLAY_CAPABILITY);
impl_reflect!(i16, "i16", DISPLAY_CAPABILITY);
impl_reflect!(i32, "i32", DISPLAY_CAPABILITY);
impl_reflect!(i64, "i64", DISPLAY_CAPABILITY);
impl_reflect!(isize, "isize", DISPLAY_CAPABILITY);
impl_reflect!(u8, "u8", DISPLAY_CAPABILITY);
impl_reflect!(u16, "u16", DISPLAY_CAPABILITY);
impl_reflect!(u32, "u32", DISPLAY_CAPABILITY);
impl_reflect!(u64, "u64", DISPLAY_CAPABILITY);
impl_reflect!(usize, "usize", DISPLAY_CAPABILITY);
impl_reflect!(f32, "f32", DISPLAY_CAPABILITY);
impl_reflect!(f64, "f64", DISPLAY_CAPABILITY);
impl_reflect!(String, "String", DISPLAY_CAPABILITY);

fn list_descriptor<T: Reflect>() -> Type {
    TypeDescriptor::literal::<Vec<T>>(format!("[]{}", T::descriptor().name())).shared()
}

/// Lists are literal types named `[]T`.
impl<T: Reflect> Reflect for Vec<T> {
    fn descriptor() -> Type {
        list_descriptor::<T>()
    }

    fn into_value(self) -> Value {
        Value::of(Self::descriptor(), self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.into_inner::<Self>()
    }
}

/// Variadic tail of a parameter list.
///
/// As the last parameter of a closure or signature it marks the callable
/// variadic; the tail travels as a single `[]T` list value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variadic<T>(pub Vec<T>);

impl<T: Reflect> Reflect for Variadic<T> {
    const VARIADIC: bool = true;

    fn descriptor() -> Type {
        list_descriptor::<T>()
    }

    fn into_value(self) -> Value {
        Value::of(Self::descriptor(), self.0)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.into_inner::<Vec<T>>().map(Variadic)
    }
}

impl<T> std::ops::Deref for Variadic<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl Reflect for ErrorValue {
    fn descriptor() -> Type {
        static DESCRIPTOR: OnceLock<Type> = OnceLock::new();
        DESCRIPTOR
            .get_or_init(|| {
                TypeDescriptor::opaque::<ErrorValue>("ErrorValue")
                    .with_capability(DISPLAY_CAPABILITY)
                    .with_capability(ERROR_CAPABILITY)
                    .shared()
            })
            .clone()
    }

    fn into_value(self) -> Value {
        Value::of(Self::descriptor(), self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.into_inner::<Self>()
    }
}

/// A value of the empty interface: any value, or nil.
#[derive(Debug, Clone, Default)]
pub struct AnyValue(Option<Value>);

impl AnyValue {
    /// Box a typed value
    pub fn new<T: Reflect>(value: T) -> Self {
        Self(Some(value.into_value()))
    }

    /// The nil interface
    pub fn nil() -> Self {
        Self(None)
    }

    /// The held concrete value
    pub fn get(&self) -> Option<&Value> {
        self.0.as_ref()
    }

    /// Borrow the held payload as `T`
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_ref().and_then(Value::downcast_ref::<T>)
    }

    /// Returns true when nothing is held
    pub fn is_nil(&self) -> bool {
        self.0.is_none()
    }
}

impl Reflect for AnyValue {
    fn descriptor() -> Type {
        static DESCRIPTOR: OnceLock<Type> = OnceLock::new();
        DESCRIPTOR.get_or_init(TypeDescriptor::any).clone()
    }

    fn into_value(self) -> Value {
        match self.0 {
            Some(inner) => Value::interface(Self::descriptor(), inner),
            None => Value::nil(Self::descriptor()),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        if value.ty().is_interface() {
            Some(Self(value.into_elem()))
        } else {
            Some(Self(Some(value)))
        }
    }
}

/// A value of the `Display` capability interface.
#[derive(Debug, Clone, Default)]
pub struct DisplayValue(Option<Value>);

impl DisplayValue {
    /// Box a value, `None` if its type lacks the `Display` capability
    pub fn new(value: Value) -> Option<Self> {
        let held = if value.ty().is_interface() {
            value.into_elem()
        } else {
            Some(value)
        };
        match held {
            Some(inner) if !inner.ty().implements(&Self::descriptor()) => None,
            held => Some(Self(held)),
        }
    }

    /// The held concrete value
    pub fn get(&self) -> Option<&Value> {
        self.0.as_ref()
    }

    /// Borrow the held payload as `T`
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_ref().and_then(Value::downcast_ref::<T>)
    }
}

impl Reflect for DisplayValue {
    fn descriptor() -> Type {
        static DESCRIPTOR: OnceLock<Type> = OnceLock::new();
        DESCRIPTOR.get_or_init(TypeDescriptor::display).clone()
    }

    fn into_value(self) -> Value {
        match self.0 {
            Some(inner) => Value::interface(Self::descriptor(), inner),
            None => Value::nil(Self::descriptor()),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        Self::new(value)
    }
}

impl_single_return!(ErrorValue);
impl_single_return!(AnyValue);
impl_single_return!(DisplayValue);

impl<T: Reflect> crate::Returns for Vec<T> {
    fn descriptors() -> Vec<Type> {
        vec![Self::descriptor()]
    }

    fn into_values(self) -> Vec<Value> {
        vec![self.into_value()]
    }

    fn from_values(values: Vec<Value>) -> Result<Self, crate::ConversionFailure> {
        crate::function::decode_single::<Self>(values)
    }
}
