//! Signature adapter
//!
//! [`build`] takes a source [`Function`] and a target [`FuncSignature`] and
//! produces an [`AdaptedFunction`] that accepts arguments in the target's
//! types, converts them into the source's parameter types, calls the source
//! once and converts its results into the target's result types.
//!
//! Validation happens at build time, first failure wins:
//!
//! 1. argument counts match
//! 2. result counts match
//! 3. both or neither side is variadic
//! 4. every argument position resolves from target into source type
//! 5. every result position resolves from source into target type
//!
//! Conversion failures at call time go to the target's error slot, the last
//! result position typed as the `error` interface. Without an error slot
//! they are unrecoverable: [`AdaptedFunction::try_call`] returns them and
//! [`AdaptedFunction::call`] applies the configured [`FaultPolicy`].
//!
//! # Example
//! ```rust,ignore
//! use funconv::prelude::*;
//!
//! let length = Function::from_fn(|name: String| name.len() as i64);
//! let endpoint = wrap::<fn(AnyValue) -> i64, _>(length)?;
//! assert_eq!(endpoint.call((AnyValue::new("hello".to_string()),)), 5);
//! ```

use crate::config::{AdapterConfig, FaultPolicy};
use crate::error::{AdapterResult, SignatureAdapterError};
use crate::function::{Function, IntoFunction, Signature, check_arguments};
use crate::pipeline::Pipeline;
use crate::resolve::map_converters;
use crate::types::{FuncSignature, Type};
use crate::value::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// A callable of the target signature wrapping a source function
#[derive(Clone)]
pub struct AdaptedFunction {
    signature: Arc<FuncSignature>,
    source: Function,
    inputs: Pipeline,
    outputs: Pipeline,
    error_slot: Option<usize>,
    fault_policy: FaultPolicy,
}

/// Build an adapter with the default configuration.
pub fn build(source: &Function, target: &FuncSignature) -> AdapterResult<AdaptedFunction> {
    build_with_config(source, target, &AdapterConfig::default())
}

/// Build an adapter.
pub fn build_with_config(
    source: &Function,
    target: &FuncSignature,
    config: &AdapterConfig,
) -> AdapterResult<AdaptedFunction> {
    build_checked(source, target, config).inspect_err(|e| {
        warn!(
            source = %source.ty(),
            target = %target,
            error = %e,
            "Failed to build adapted function"
        );
    })
}

/// Build an adapter from dynamically supplied values.
///
/// `source` must be a non-nil function value and `target` a function type.
pub fn build_value(source: Option<&Value>, target: Option<&Type>) -> AdapterResult<AdaptedFunction> {
    let source = source.ok_or_else(|| SignatureAdapterError::structural("srcFunc cannot be nil"))?;
    let target = target.ok_or_else(|| SignatureAdapterError::structural("destFunc cannot be nil"))?;

    if !source.ty().is_func() {
        return Err(SignatureAdapterError::structural(format!(
            "srcFunc needs to be a function, got {}",
            source.ty()
        )));
    }
    let function = source
        .as_function()
        .ok_or_else(|| SignatureAdapterError::structural("srcFunc cannot be nil"))?;
    let signature = target.as_func().ok_or_else(|| {
        SignatureAdapterError::structural(format!(
            "destFunc needs to be a pointer of function variable, got {}",
            target
        ))
    })?;

    build(function, signature)
}

fn build_checked(
    source: &Function,
    target: &FuncSignature,
    config: &AdapterConfig,
) -> AdapterResult<AdaptedFunction> {
    let inner = source.signature();

    if inner.arity() != target.arity() {
        return Err(SignatureAdapterError::structural(format!(
            "argument mismatch, srcFunc({}) != destFunc({})",
            inner.arity(),
            target.arity()
        )));
    }
    if inner.result_count() != target.result_count() {
        return Err(SignatureAdapterError::structural(format!(
            "return mismatch, srcFunc({}) != destFunc({})",
            inner.result_count(),
            target.result_count()
        )));
    }
    match (inner.is_variadic(), target.is_variadic()) {
        (true, false) => {
            return Err(SignatureAdapterError::structural(
                "srcFunc is variadic function while destFunc is not",
            ));
        }
        (false, true) => {
            return Err(SignatureAdapterError::structural(
                "destFunc is variadic function while srcFunc is not",
            ));
        }
        _ => {}
    }

    // Arguments arrive in the target's types, results in the source's.
    let inputs = map_converters(target.params(), inner.params()).map_err(|e| {
        SignatureAdapterError::argument(e.position, format!("{} cannot be converted {}", e.from, e.to))
    })?;
    let outputs = map_converters(inner.results(), target.results()).map_err(|e| {
        SignatureAdapterError::returned(e.position, format!("{} cannot be converted {}", e.from, e.to))
    })?;

    let error_slot = find_last_error(target.results());
    debug!(
        source = %source.ty(),
        target = %target,
        error_slot = ?error_slot,
        "Built adapted function"
    );

    Ok(AdaptedFunction {
        signature: Arc::new(target.clone()),
        source: source.clone(),
        inputs: Pipeline::new(inputs).with_trace(config.trace_conversions),
        outputs: Pipeline::new(outputs).with_trace(config.trace_conversions),
        error_slot,
        fault_policy: config.fault_policy,
    })
}

/// Position of the last error-typed entry.
pub(crate) fn find_last_error(types: &[Type]) -> Option<usize> {
    types.iter().rposition(|ty| ty.is_error_capability())
}

impl AdaptedFunction {
    /// The target signature
    pub fn signature(&self) -> &FuncSignature {
        &self.signature
    }

    /// The wrapped source function
    pub fn source(&self) -> &Function {
        &self.source
    }

    /// Result position receiving conversion failures, if any
    pub fn error_slot(&self) -> Option<usize> {
        self.error_slot
    }

    /// The fault policy applied by [`call`](Self::call)
    pub fn fault_policy(&self) -> FaultPolicy {
        self.fault_policy
    }

    /// Call with arguments typed per the target signature.
    ///
    /// Arguments assignable to their declared parameter type are retagged or
    /// boxed into it first, so a `String` may be passed where the target
    /// declares `any`. Conversion failures are returned in the error slot
    /// when there is one, and as `Err` otherwise. Argument lists that still
    /// do not match the target signature are rejected as `Err` before any
    /// conversion runs, error slot or not.
    pub fn try_call(&self, args: Vec<Value>) -> AdapterResult<Vec<Value>> {
        let args = assign_arguments(self.signature.params(), args);
        check_arguments(&self.signature, &args)?;

        let converted = match self.inputs.apply(args) {
            Ok(converted) => converted,
            Err(failure) => {
                let err = SignatureAdapterError::argument(failure.position, failure.cause);
                return self.route(err, Vec::new());
            }
        };

        let results = self.source.call(converted)?;

        let mut out = Vec::with_capacity(self.signature.result_count());
        if let Err(failure) = self.outputs.apply_into(results, &mut out) {
            let err = SignatureAdapterError::returned(failure.position, failure.cause);
            return self.route(err, out);
        }
        Ok(out)
    }

    /// Call with arguments typed per the target signature.
    ///
    /// A failure [`try_call`](Self::try_call) would return as `Err` is
    /// handled per the [`FaultPolicy`].
    pub fn call(&self, args: Vec<Value>) -> Vec<Value> {
        match self.try_call(args) {
            Ok(out) => out,
            Err(err) => self.fault(err),
        }
    }

    /// Convert into a [`Function`] of the target signature.
    ///
    /// Unrecoverable failures surface as [`CallError::Adapter`](crate::CallError::Adapter).
    pub fn into_function(self) -> Function {
        let signature = (*self.signature).clone();
        Function::from_fallible(signature, move |args| Ok(self.try_call(args)?))
    }

    fn route(&self, err: SignatureAdapterError, mut out: Vec<Value>) -> AdapterResult<Vec<Value>> {
        let side = if matches!(err, SignatureAdapterError::Argument { .. }) {
            "argument"
        } else {
            "return"
        };
        let Some(slot) = self.error_slot else {
            warn!(position = ?err.position(), side, error = %err, "Conversion failed without error slot");
            return Err(err);
        };
        warn!(position = ?err.position(), side, slot, error = %err, "Conversion failed");

        let results = self.signature.results();
        out.extend(results[out.len()..].iter().map(Value::zero));
        out[slot] = Value::error(err.into()).assign(&results[slot]);
        Ok(out)
    }

    fn fault(&self, err: SignatureAdapterError) -> ! {
        match self.fault_policy {
            FaultPolicy::Panic => std::panic::panic_any(err),
            FaultPolicy::Abort => {
                error!(error = %err, "Unrecoverable conversion failure, aborting");
                std::process::abort()
            }
        }
    }
}

fn assign_arguments(params: &[Type], args: Vec<Value>) -> Vec<Value> {
    if params.len() != args.len() {
        return args;
    }
    args.into_iter()
        .zip(params)
        .map(|(arg, param)| {
            if arg.ty() != param && arg.ty().assignable_to(param) {
                arg.assign(param)
            } else {
                arg
            }
        })
        .collect()
}

impl fmt::Debug for AdaptedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptedFunction")
            .field("signature", &self.signature.to_string())
            .field("source", &self.source)
            .field("error_slot", &self.error_slot)
            .field("fault_policy", &self.fault_policy)
            .finish()
    }
}

/// An adapted function with a statically known signature `S`.
pub struct Wrapped<S> {
    adapted: AdaptedFunction,
    _signature: PhantomData<fn() -> S>,
}

impl<S: Signature> Wrapped<S> {
    /// Adapt `source` to the signature described by `S`
    pub fn new<M>(source: impl IntoFunction<M>) -> AdapterResult<Self> {
        Self::with_config(source, &AdapterConfig::default())
    }

    /// Adapt `source` to `S` with a configuration
    pub fn with_config<M>(source: impl IntoFunction<M>, config: &AdapterConfig) -> AdapterResult<Self> {
        let source = source.into_function();
        let adapted = build_with_config(&source, &S::signature(), config)?;
        Ok(Self {
            adapted,
            _signature: PhantomData,
        })
    }

    /// Call, returning unrecoverable failures as `Err`
    pub fn try_call(&self, args: S::Args) -> AdapterResult<S::Output> {
        let out = self.adapted.try_call(S::encode_args(args))?;
        S::decode_output(out).map_err(|f| SignatureAdapterError::returned(f.position, f.cause))
    }

    /// Call, applying the fault policy to unrecoverable failures
    pub fn call(&self, args: S::Args) -> S::Output {
        match self.try_call(args) {
            Ok(out) => out,
            Err(err) => self.adapted.fault(err),
        }
    }

    /// The underlying dynamic adapter
    pub fn adapted(&self) -> &AdaptedFunction {
        &self.adapted
    }

    /// Consume into the underlying dynamic adapter
    pub fn into_adapted(self) -> AdaptedFunction {
        self.adapted
    }
}

impl<S> Clone for Wrapped<S> {
    fn clone(&self) -> Self {
        Self {
            adapted: self.adapted.clone(),
            _signature: PhantomData,
        }
    }
}

impl<S> fmt::Debug for Wrapped<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Wrapped").field(&self.adapted).finish()
    }
}

/// Adapt `source` to the signature described by `S`.
pub fn wrap<S: Signature, M>(source: impl IntoFunction<M>) -> AdapterResult<Wrapped<S>> {
    Wrapped::new(source)
}

/// Adapt `source` to the signature of the destination slot and store it there.
///
/// `dest` is left untouched on failure.
pub fn wrap_as<S: Signature, M>(source: impl IntoFunction<M>, dest: &mut Option<Wrapped<S>>) -> AdapterResult<()> {
    *dest = Some(Wrapped::new(source)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{AnyValue, Reflect};
    use crate::types::TypeDescriptor;
    use crate::value::ErrorValue;

    #[test]
    fn test_find_last_error() {
        let err = TypeDescriptor::error();
        let int = i64::descriptor();

        assert_eq!(find_last_error(&[err.clone(), int.clone()]), Some(0));
        assert_eq!(find_last_error(&[err.clone(), err.clone(), int.clone()]), Some(1));
        assert_eq!(
            find_last_error(&[err.clone(), err.clone(), err.clone(), int.clone()]),
            Some(2)
        );
        assert_eq!(find_last_error(&[int]), None);
        assert_eq!(find_last_error(&[]), None);
    }

    #[test]
    fn test_error_value_type_is_not_an_error_slot() {
        assert_eq!(find_last_error(&[ErrorValue::descriptor()]), None);
        assert_eq!(find_last_error(&[AnyValue::descriptor()]), None);
    }

    #[test]
    fn test_wrap_as_leaves_dest_on_failure() {
        let source = Function::from_fn(|a: i64, b: i64| a + b);
        let mut dest: Option<Wrapped<fn(i64) -> i64>> = None;
        let err = wrap_as(source, &mut dest).unwrap_err();
        assert!(err.is_structural());
        assert!(dest.is_none());
    }

    #[test]
    fn test_adapted_function_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<AdaptedFunction>();
        assert_send_sync::<Wrapped<fn(String) -> i64>>();
    }
}
