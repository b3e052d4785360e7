//! Dynamically typed values
//!
//! A [`Value`] pairs a payload with the static [`Type`] it is held as.
//! Interface-typed values box a concrete dynamic value (or nothing, for nil).

use crate::error::SignatureAdapterError;
use crate::function::Function;
use crate::reflect::Reflect;
use crate::types::{Type, TypeDescriptor, TypeKind};
use std::any::{Any, TypeId};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone)]
enum Payload {
    Concrete(Arc<dyn Any + Send + Sync>),
    /// Zero value of a concrete type without a default constructor
    Empty,
    Interface(Option<Box<Value>>),
    Func(Option<Function>),
}

/// A runtime value tagged with its static type.
#[derive(Clone)]
pub struct Value {
    ty: Type,
    payload: Payload,
}

impl Value {
    /// Create a concrete value of type `ty`.
    ///
    /// `ty` must be a concrete type whose representation is `T`.
    pub fn of<T: Any + Send + Sync>(ty: Type, value: T) -> Self {
        debug_assert!(
            ty.as_concrete()
                .is_some_and(|c| c.repr() == TypeId::of::<T>()),
            "value representation does not match {}",
            ty
        );
        Self {
            ty,
            payload: Payload::Concrete(Arc::new(value)),
        }
    }

    /// Box `inner` into the interface type `ty`.
    ///
    /// An interface-typed `inner` is unwrapped first, so interface values
    /// never nest.
    pub fn interface(ty: Type, inner: Value) -> Self {
        debug_assert!(ty.is_interface(), "{} is not an interface", ty);
        let held = match inner.payload {
            Payload::Interface(held) => held,
            _ => Some(Box::new(inner)),
        };
        Self {
            ty,
            payload: Payload::Interface(held),
        }
    }

    /// The nil value of an interface or function type.
    ///
    /// For concrete types this is the zero value.
    pub fn nil(ty: Type) -> Self {
        Self::zero(&ty)
    }

    /// The zero value of any type.
    pub fn zero(ty: &Type) -> Self {
        let payload = match ty.kind() {
            TypeKind::Interface(_) => Payload::Interface(None),
            TypeKind::Func(_) => Payload::Func(None),
            TypeKind::Concrete(_) => match ty.zero_payload() {
                Some(zero) => Payload::Concrete(zero),
                None => Payload::Empty,
            },
        };
        Self {
            ty: ty.clone(),
            payload,
        }
    }

    /// Wrap a callable as a function-typed value.
    pub fn function(function: Function) -> Self {
        Self {
            ty: function.ty().clone(),
            payload: Payload::Func(Some(function)),
        }
    }

    /// Box an error into the error interface.
    pub fn error(error: ErrorValue) -> Self {
        Self::interface(TypeDescriptor::error(), error.into_value())
    }

    /// The nil error.
    pub fn nil_error() -> Self {
        Self::zero(&TypeDescriptor::error())
    }

    /// Static type of the value
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Type of the value actually held: the boxed value's type for
    /// non-nil interfaces, the static type otherwise.
    pub fn dynamic_type(&self) -> &Type {
        match &self.payload {
            Payload::Interface(Some(inner)) => inner.ty(),
            _ => &self.ty,
        }
    }

    /// Returns true for nil interfaces and nil functions
    pub fn is_nil(&self) -> bool {
        matches!(
            self.payload,
            Payload::Interface(None) | Payload::Func(None)
        )
    }

    /// The concrete value boxed in an interface
    pub fn elem(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Interface(inner) => inner.as_deref(),
            _ => None,
        }
    }

    /// Consume an interface value, returning its boxed concrete value
    pub fn into_elem(self) -> Option<Value> {
        match self.payload {
            Payload::Interface(inner) => inner.map(|boxed| *boxed),
            _ => None,
        }
    }

    /// Borrow the payload as `T`, looking through interfaces.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match &self.payload {
            Payload::Concrete(any) => any.downcast_ref::<T>(),
            Payload::Interface(Some(inner)) => inner.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Clone the payload out as `T`, looking through interfaces.
    pub fn extract<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Move the payload out as `T`, cloning only if it is shared.
    pub fn into_inner<T: Any + Clone + Send + Sync>(self) -> Option<T> {
        match self.payload {
            Payload::Concrete(any) => {
                let typed = any.downcast::<T>().ok()?;
                Some(Arc::try_unwrap(typed).unwrap_or_else(|shared| (*shared).clone()))
            }
            Payload::Interface(Some(inner)) => inner.into_inner::<T>(),
            _ => None,
        }
    }

    /// The callable held by a function value
    pub fn as_function(&self) -> Option<&Function> {
        match &self.payload {
            Payload::Func(function) => function.as_ref(),
            _ => None,
        }
    }

    /// The error held by an error value
    pub fn as_error(&self) -> Option<&ErrorValue> {
        self.downcast_ref::<ErrorValue>()
    }

    /// Re-type this value as `to`.
    ///
    /// Concrete and function values are retagged; interface targets box (or
    /// rebox) the value. Callers must have checked assignability.
    pub(crate) fn assign(self, to: &Type) -> Value {
        if to.is_interface() {
            return Value::interface(to.clone(), self);
        }
        Value {
            ty: to.clone(),
            payload: self.payload,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Value");
        out.field("ty", &self.ty.name());
        match &self.payload {
            Payload::Concrete(_) => out.field("payload", &"<concrete>"),
            Payload::Empty => out.field("payload", &"<empty>"),
            Payload::Interface(inner) => out.field("elem", inner),
            Payload::Func(function) => out.field("func", &function.is_some()),
        };
        out.finish()
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct MessageError(String);

/// Shared error payload carried through error slots.
#[derive(Clone)]
pub struct ErrorValue(Arc<dyn StdError + Send + Sync>);

impl ErrorValue {
    /// Wrap any error
    pub fn new<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        Self(Arc::new(error))
    }

    /// Create an error from a message
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    /// The wrapped error
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    /// Downcast the wrapped error
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl From<SignatureAdapterError> for ErrorValue {
    fn from(err: SignatureAdapterError) -> Self {
        Self::new(err)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorValue").field(&self.0).finish()
    }
}

impl StdError for ErrorValue {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_values_do_not_nest() {
        let any = TypeDescriptor::any();
        let display = TypeDescriptor::display();
        let inner = "hello".to_string().into_value();

        let boxed = Value::interface(display, inner);
        let reboxed = Value::interface(any.clone(), boxed);

        assert_eq!(reboxed.ty(), &any);
        assert_eq!(reboxed.dynamic_type(), &String::descriptor());
        assert_eq!(reboxed.extract::<String>().as_deref(), Some("hello"));
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(Value::zero(&i64::descriptor()).extract::<i64>(), Some(0));
        assert!(Value::zero(&TypeDescriptor::any()).is_nil());
        assert!(Value::nil_error().is_nil());

        let opaque = TypeDescriptor::opaque::<std::fs::File>("File").shared();
        let zero = Value::zero(&opaque);
        assert!(!zero.is_nil());
        assert!(zero.downcast_ref::<std::fs::File>().is_none());
    }

    #[test]
    fn test_into_inner_clones_shared_payload() {
        let value = "shared".to_string().into_value();
        let copy = value.clone();
        assert_eq!(value.into_inner::<String>().as_deref(), Some("shared"));
        assert_eq!(copy.into_inner::<String>().as_deref(), Some("shared"));
    }

    #[test]
    fn test_error_value_roundtrip() {
        let err = SignatureAdapterError::argument(0, "boom");
        let value = Value::error(err.clone().into());

        assert!(!value.is_nil());
        let carried = value.as_error().expect("error is carried");
        assert_eq!(carried.to_string(), "argument 1, boom");
        assert_eq!(carried.downcast_ref::<SignatureAdapterError>(), Some(&err));
    }

    #[test]
    fn test_assign_retags_concrete() {
        let names = TypeDescriptor::concrete::<Vec<String>>("Names").shared();
        let literal = vec!["a".to_string()].into_value();
        let assigned = literal.assign(&names);
        assert_eq!(assigned.ty(), &names);
        assert_eq!(assigned.extract::<Vec<String>>(), Some(vec!["a".to_string()]));
    }
}
