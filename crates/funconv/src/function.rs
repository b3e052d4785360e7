//! Dynamically typed callables
//!
//! A [`Function`] is a signature plus a boxed body over [`Value`]s. Closures
//! become functions through [`IntoFunction`]; fn-pointer types describe
//! target signatures through [`Signature`].

use crate::error::{CallError, ConversionFailure};
use crate::reflect::Reflect;
use crate::types::{FuncSignature, Type, TypeDescriptor};
use crate::value::{ErrorValue, Value};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Boxed function body for type erasure
pub(crate) type Body = Arc<dyn Fn(Vec<Value>) -> Result<Vec<Value>, CallError> + Send + Sync>;

/// A callable with a runtime signature
#[derive(Clone)]
pub struct Function {
    signature: Arc<FuncSignature>,
    ty: Type,
    body: Body,
}

impl Function {
    /// Create a function from a body that always honours `signature`.
    pub fn new<F>(signature: FuncSignature, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
    {
        Self::from_fallible(signature, move |args| Ok(body(args)))
    }

    pub(crate) fn from_fallible<F>(signature: FuncSignature, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Vec<Value>, CallError> + Send + Sync + 'static,
    {
        Self {
            ty: TypeDescriptor::func(signature.clone()).shared(),
            signature: Arc::new(signature),
            body: Arc::new(body),
        }
    }

    /// Convert a closure into a function.
    pub fn from_fn<M, F: IntoFunction<M>>(f: F) -> Self {
        f.into_function()
    }

    /// The function type
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// The signature
    pub fn signature(&self) -> &FuncSignature {
        &self.signature
    }

    /// Call with arguments typed per the signature.
    ///
    /// Arguments and results are checked against the signature.
    pub fn call(&self, args: Vec<Value>) -> Result<Vec<Value>, CallError> {
        let signature = self.signature();
        check_arguments(signature, &args)?;

        trace!(arity = args.len(), "Calling function");
        let results = (self.body)(args)?;

        check_values(signature.results(), &results).map_err(|mismatch| match mismatch {
            Mismatch::Count { expected, found } => CallError::ResultArity { expected, found },
            Mismatch::Type {
                position,
                expected,
                found,
            } => CallError::ResultType {
                position,
                expected,
                found,
            },
        })?;
        Ok(results)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.ty.name()).finish()
    }
}

/// Check argument count and types against a signature.
pub(crate) fn check_arguments(signature: &FuncSignature, args: &[Value]) -> Result<(), CallError> {
    check_values(signature.params(), args).map_err(|mismatch| match mismatch {
        Mismatch::Count { expected, found } => CallError::Arity { expected, found },
        Mismatch::Type {
            position,
            expected,
            found,
        } => CallError::ArgumentType {
            position,
            expected,
            found,
        },
    })
}

enum Mismatch {
    Count {
        expected: usize,
        found: usize,
    },
    Type {
        position: usize,
        expected: String,
        found: String,
    },
}

fn check_values(types: &[Type], values: &[Value]) -> Result<(), Mismatch> {
    if types.len() != values.len() {
        return Err(Mismatch::Count {
            expected: types.len(),
            found: values.len(),
        });
    }
    for (position, (ty, value)) in types.iter().zip(values).enumerate() {
        if !Arc::ptr_eq(ty, value.ty()) && ty != value.ty() {
            return Err(Mismatch::Type {
                position,
                expected: ty.name().to_string(),
                found: value.ty().name().to_string(),
            });
        }
    }
    Ok(())
}

/// Decode a single result value.
#[doc(hidden)]
pub fn decode_single<T: Reflect>(values: Vec<Value>) -> Result<T, ConversionFailure> {
    let found = values.len();
    let value = values
        .into_iter()
        .next()
        .filter(|_| found == 1)
        .ok_or_else(|| ConversionFailure::new(0, format!("expected 1 value, got {found}")))?;
    decode_at(0, value)
}

fn decode_at<T: Reflect>(position: usize, value: Value) -> Result<T, ConversionFailure> {
    let found = value.dynamic_type().name().to_string();
    T::from_value(value).ok_or_else(|| {
        ConversionFailure::new(
            position,
            format!("{} cannot be converted to {}", found, T::descriptor()),
        )
    })
}

fn decode_error(position: usize, value: Value) -> Option<ErrorValue> {
    if value.is_nil() {
        return None;
    }
    match value.as_error() {
        Some(err) => Some(err.clone()),
        None => Some(ErrorValue::msg(format!(
            "return variable {}, {} error",
            position + 1,
            value.dynamic_type()
        ))),
    }
}

/// Result list of a typed callable.
///
/// `Result<T, ErrorValue>` maps onto a `(T, error)` result list, with the
/// error in the last position.
pub trait Returns: Sized + Send + 'static {
    /// Result types in order
    fn descriptors() -> Vec<Type>;

    /// Encode into result values
    fn into_values(self) -> Vec<Value>;

    /// Decode from result values
    fn from_values(values: Vec<Value>) -> Result<Self, ConversionFailure>;
}

impl Returns for () {
    fn descriptors() -> Vec<Type> {
        Vec::new()
    }

    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }

    fn from_values(values: Vec<Value>) -> Result<Self, ConversionFailure> {
        match values.len() {
            0 => Ok(()),
            n => Err(ConversionFailure::new(0, format!("expected 0 values, got {n}"))),
        }
    }
}

impl<T: Reflect> Returns for Result<T, ErrorValue> {
    fn descriptors() -> Vec<Type> {
        vec![T::descriptor(), TypeDescriptor::error()]
    }

    fn into_values(self) -> Vec<Value> {
        match self {
            Ok(value) => vec![value.into_value(), Value::nil_error()],
            Err(err) => vec![Value::zero(&T::descriptor()), Value::error(err)],
        }
    }

    fn from_values(values: Vec<Value>) -> Result<Self, ConversionFailure> {
        let [value, err]: [Value; 2] = values.try_into().map_err(|values: Vec<Value>| {
            ConversionFailure::new(0, format!("expected 2 values, got {}", values.len()))
        })?;
        match decode_error(1, err) {
            Some(err) => Ok(Err(err)),
            None => decode_at(0, value).map(Ok),
        }
    }
}

impl Returns for Result<(), ErrorValue> {
    fn descriptors() -> Vec<Type> {
        vec![TypeDescriptor::error()]
    }

    fn into_values(self) -> Vec<Value> {
        match self {
            Ok(()) => vec![Value::nil_error()],
            Err(err) => vec![Value::error(err)],
        }
    }

    fn from_values(values: Vec<Value>) -> Result<Self, ConversionFailure> {
        let [err]: [Value; 1] = values.try_into().map_err(|values: Vec<Value>| {
            ConversionFailure::new(0, format!("expected 1 value, got {}", values.len()))
        })?;
        Ok(match decode_error(0, err) {
            Some(err) => Err(err),
            None => Ok(()),
        })
    }
}

macro_rules! impl_returns_tuple {
    ($count:literal; $($ty:ident $pos:tt),+) => {
        impl<$($ty: Reflect),+> Returns for ($($ty,)+) {
            fn descriptors() -> Vec<Type> {
                vec![$($ty::descriptor()),+]
            }

            fn into_values(self) -> Vec<Value> {
                vec![$(self.$pos.into_value()),+]
            }

            #[allow(non_snake_case)]
            fn from_values(values: Vec<Value>) -> Result<Self, ConversionFailure> {
                let [$($ty),+]: [Value; $count] = values.try_into().map_err(|values: Vec<Value>| {
                    ConversionFailure::new(
                        0,
                        format!("expected {} values, got {}", $count, values.len()),
                    )
                })?;
                Ok(($(decode_at::<$ty>($pos, $ty)?,)+))
            }
        }
    };
}

impl_returns_tuple!(2; A 0, B 1);
impl_returns_tuple!(3; A 0, B 1, C 2);

/// Conversion of a typed closure into a [`Function`].
///
/// Implemented for `Fn(A1, ..., An) -> R` with up to four [`Reflect`]
/// arguments and `R: Returns`. A [`Variadic`](crate::Variadic) last argument
/// makes the function variadic.
pub trait IntoFunction<Marker> {
    /// Perform the conversion
    fn into_function(self) -> Function;
}

impl IntoFunction<Function> for Function {
    fn into_function(self) -> Function {
        self
    }
}

fn decode_arg<T: Reflect>(position: usize, value: Value) -> Result<T, CallError> {
    let found = value.ty().name().to_string();
    T::from_value(value).ok_or_else(|| CallError::ArgumentType {
        position,
        expected: T::descriptor().name().to_string(),
        found,
    })
}

macro_rules! impl_into_function {
    ($count:literal; $($arg:ident $pos:tt),*) => {
        impl<F, R, $($arg,)*> IntoFunction<(R, $($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Returns,
            $($arg: Reflect,)*
        {
            #[allow(unused_mut, unused_variables, non_snake_case)]
            fn into_function(self) -> Function {
                let params: Vec<Type> = vec![$($arg::descriptor()),*];
                let flags: &[bool] = &[$($arg::VARIADIC),*];
                let variadic = flags.last().copied().unwrap_or(false);
                let signature = FuncSignature::new(params, R::descriptors()).with_variadic(variadic);
                Function::from_fallible(signature, move |args| {
                    let mut args = args.into_iter();
                    $(
                        let $arg = match args.next() {
                            Some(value) => decode_arg::<$arg>($pos, value)?,
                            None => {
                                return Err(CallError::Arity { expected: $count, found: $pos });
                            }
                        };
                    )*
                    Ok((self)($($arg),*).into_values())
                })
            }
        }
    };
}

impl_into_function!(0;);
impl_into_function!(1; A1 0);
impl_into_function!(2; A1 0, A2 1);
impl_into_function!(3; A1 0, A2 1, A3 2);
impl_into_function!(4; A1 0, A2 1, A3 2, A4 3);

/// A target signature described by a function-pointer type.
///
/// `fn(String, AnyValue) -> Result<i64, ErrorValue>` describes
/// `func(String, any) (i64, error)`.
pub trait Signature: 'static {
    /// Argument tuple
    type Args;
    /// Typed result
    type Output: Returns;

    /// Runtime signature
    fn signature() -> FuncSignature;

    /// Encode an argument tuple
    fn encode_args(args: Self::Args) -> Vec<Value>;

    /// Decode the result values
    fn decode_output(values: Vec<Value>) -> Result<Self::Output, ConversionFailure> {
        Self::Output::from_values(values)
    }
}

macro_rules! impl_signature {
    ($($arg:ident $pos:tt),*) => {
        impl<R: Returns, $($arg: Reflect,)*> Signature for fn($($arg),*) -> R {
            type Args = ($($arg,)*);
            type Output = R;

            fn signature() -> FuncSignature {
                let params: Vec<Type> = vec![$($arg::descriptor()),*];
                let flags: &[bool] = &[$($arg::VARIADIC),*];
                let variadic = flags.last().copied().unwrap_or(false);
                FuncSignature::new(params, R::descriptors()).with_variadic(variadic)
            }

            #[allow(unused_variables)]
            fn encode_args(args: Self::Args) -> Vec<Value> {
                vec![$(args.$pos.into_value()),*]
            }
        }
    };
}

impl_signature!();
impl_signature!(A1 0);
impl_signature!(A1 0, A2 1);
impl_signature!(A1 0, A2 1, A3 2);
impl_signature!(A1 0, A2 1, A3 2, A4 3);
