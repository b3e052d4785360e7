//! Type compatibility resolution
//!
//! For one position, [`resolve`] picks the conversion strategy from the type
//! values arrive in (`outer`) to the type they must become (`inner`). The
//! first matching strategy wins:
//!
//! 1. [`Strategy::Identity`]: same type, pass through.
//! 2. [`Strategy::Assign`]: `outer` is assignable to `inner`, retag or box.
//! 3. [`Strategy::Unwrap`]: `outer` is an interface that `inner` satisfies,
//!    unwrap the dynamic value and check it at call time.
//!
//! Anything else is [`Incompatible`].

use crate::error::Incompatible;
use crate::types::Type;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Conversion function of a single position
pub(crate) type ConvertFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Conversion strategy chosen for a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Values pass through unchanged
    Identity,
    /// Values are retagged, or boxed into an interface
    Assign,
    /// Interface values are unwrapped and checked against the target
    Unwrap,
    /// Caller-supplied conversion
    Custom,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Identity => "identity",
            Strategy::Assign => "assign",
            Strategy::Unwrap => "unwrap",
            Strategy::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Conversion logic bound to one argument or result position.
#[derive(Clone)]
pub struct PositionalConverter {
    position: usize,
    strategy: Strategy,
    from: Type,
    to: Type,
    convert: ConvertFn,
}

impl PositionalConverter {
    /// Create a converter from a custom conversion function.
    pub fn custom<F>(position: usize, from: Type, to: Type, convert: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            position,
            strategy: Strategy::Custom,
            from,
            to,
            convert: Arc::new(convert),
        }
    }

    /// Convert one value; the error is the bare cause.
    pub fn convert(&self, value: Value) -> Result<Value, String> {
        (self.convert)(value)
    }

    /// Zero-based position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Strategy in use
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Type values arrive in
    pub fn from(&self) -> &Type {
        &self.from
    }

    /// Type values are converted into
    pub fn to(&self) -> &Type {
        &self.to
    }
}

impl fmt::Debug for PositionalConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionalConverter")
            .field("position", &self.position)
            .field("strategy", &self.strategy)
            .field("from", &self.from.name())
            .field("to", &self.to.name())
            .finish()
    }
}

/// Resolve the converter for `position`, from `outer` into `inner`.
pub fn resolve(position: usize, outer: &Type, inner: &Type) -> Result<PositionalConverter, Incompatible> {
    let (strategy, convert): (Strategy, ConvertFn) = if outer == inner {
        (Strategy::Identity, Arc::new(|value: Value| Ok(value)))
    } else if outer.assignable_to(inner) {
        let to = inner.clone();
        (Strategy::Assign, Arc::new(move |value: Value| Ok(value.assign(&to))))
    } else if outer.is_interface() && inner.implements(outer) {
        (Strategy::Unwrap, unwrap_into(inner.clone()))
    } else {
        trace!(position, from = %outer, to = %inner, "No conversion strategy");
        return Err(Incompatible {
            position,
            from: outer.clone(),
            to: inner.clone(),
        });
    };

    trace!(position, from = %outer, to = %inner, strategy = %strategy, "Resolved converter");
    Ok(PositionalConverter {
        position,
        strategy,
        from: outer.clone(),
        to: inner.clone(),
        convert,
    })
}

fn unwrap_into(to: Type) -> ConvertFn {
    Arc::new(move |value: Value| {
        let held = if value.ty().is_interface() {
            value.into_elem()
        } else {
            Some(value)
        };
        let Some(held) = held else {
            if to.is_interface() {
                return Ok(Value::nil(to.clone()));
            }
            return Err(format!("nil cannot be converted to {}", to));
        };

        if held.ty() == &to {
            Ok(held)
        } else if held.ty().assignable_to(&to) {
            Ok(held.assign(&to))
        } else {
            Err(format!("{} cannot be converted to {}", held.ty(), to))
        }
    })
}

/// Resolve converters for two parallel type lists.
///
/// Stops at the first incompatible position.
pub fn map_converters(outer: &[Type], inner: &[Type]) -> Result<Vec<PositionalConverter>, Incompatible> {
    debug_assert_eq!(outer.len(), inner.len(), "type lists differ in length");
    outer
        .iter()
        .zip(inner)
        .enumerate()
        .map(|(position, (outer, inner))| resolve(position, outer, inner))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{AnyValue, Reflect};
    use crate::types::TypeDescriptor;

    #[test]
    fn test_priority_identity_first() {
        let any = TypeDescriptor::any();
        let conv = resolve(0, &any, &any).expect("identity");
        assert_eq!(conv.strategy(), Strategy::Identity);
    }

    #[test]
    fn test_concrete_into_interface_assigns() {
        let conv = resolve(0, &String::descriptor(), &AnyValue::descriptor()).expect("assign");
        assert_eq!(conv.strategy(), Strategy::Assign);

        let out = conv.convert("hi".to_string().into_value()).expect("never fails");
        assert_eq!(out.ty(), &AnyValue::descriptor());
        assert_eq!(out.dynamic_type(), &String::descriptor());
    }

    #[test]
    fn test_interface_into_concrete_unwraps() {
        let conv = resolve(3, &AnyValue::descriptor(), &i64::descriptor()).expect("unwrap");
        assert_eq!(conv.strategy(), Strategy::Unwrap);
        assert_eq!(conv.position(), 3);
    }

    #[test]
    fn test_unrelated_concrete_types_are_incompatible() {
        let err = resolve(1, &i64::descriptor(), &String::descriptor()).unwrap_err();
        assert_eq!(err.to_string(), "at 1, i64 cannot be converted to String");
    }

    #[test]
    fn test_nil_interface_into_concrete_fails() {
        let conv = resolve(0, &AnyValue::descriptor(), &String::descriptor()).expect("unwrap");
        let err = conv.convert(AnyValue::nil().into_value()).unwrap_err();
        assert_eq!(err, "nil cannot be converted to String");
    }

    #[test]
    fn test_nil_interface_into_interface_stays_nil() {
        let display = TypeDescriptor::display();
        let conv = resolve(0, &AnyValue::descriptor(), &display).expect("unwrap");
        let out = conv.convert(AnyValue::nil().into_value()).expect("nil passes");
        assert!(out.is_nil());
        assert_eq!(out.ty(), &display);
    }

    #[test]
    fn test_map_converters_stops_at_first_incompatible() {
        let outer = vec![String::descriptor(), i64::descriptor(), bool::descriptor()];
        let inner = vec![String::descriptor(), String::descriptor(), String::descriptor()];
        let err = map_converters(&outer, &inner).unwrap_err();
        assert_eq!(err.position, 1);
    }
}
