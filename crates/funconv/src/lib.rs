#![warn(missing_docs)]
//! # funconv
//!
//! Runtime function-signature adaptation.
//!
//! Given a source callable and a target signature, [`build`] produces a new
//! callable of the target signature. Each argument is converted from the
//! target's parameter type into the source's, and each result from the
//! source's result type into the target's.
//!
//! ## Layers
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ adapter    build / wrap / wrap_as             │
//! │   validates arity and variadic-ness,          │
//! │   picks the error slot, routes failures       │
//! ├───────────────────────────────────────────────┤
//! │ pipeline   ordered converters, first failure  │
//! │            aborts                             │
//! ├───────────────────────────────────────────────┤
//! │ resolve    identity > assign > unwrap         │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Types are described at runtime by [`TypeDescriptor`]s. Concrete types
//! carry a set of capabilities; interface types require one. The `error`
//! interface marks a result position as the error slot.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use funconv::prelude::*;
//!
//! // Source: takes a String, may fail
//! let length = |name: String| -> Result<i64, ErrorValue> { Ok(name.len() as i64) };
//!
//! // Target: takes anything
//! let mut endpoint: Option<Wrapped<fn(AnyValue) -> Result<i64, ErrorValue>>> = None;
//! wrap_as(length, &mut endpoint)?;
//!
//! let endpoint = endpoint.expect("set by wrap_as");
//! assert_eq!(endpoint.call((AnyValue::new("hello".to_string()),)).ok(), Some(5));
//!
//! // A wrong dynamic type is reported through the error slot
//! let err = endpoint.call((AnyValue::new(123i64),)).unwrap_err();
//! assert_eq!(err.to_string(), "argument 1, i64 cannot be converted to String");
//! ```

pub mod adapter;
mod config;
mod error;
pub mod function;
pub mod pipeline;
pub mod reflect;
pub mod resolve;
pub mod types;
pub mod value;

#[cfg(test)]
mod tests;

pub use adapter::{AdaptedFunction, Wrapped, build, build_value, build_with_config, wrap, wrap_as};
pub use config::{AdapterConfig, FaultPolicy};
pub use error::{AdapterResult, CallError, ConversionFailure, Incompatible, SignatureAdapterError};
pub use function::{Function, IntoFunction, Returns, Signature};
pub use pipeline::Pipeline;
pub use reflect::{AnyValue, DisplayValue, Reflect, Variadic};
pub use resolve::{PositionalConverter, Strategy, map_converters, resolve};
pub use types::{
    ANY_TYPE_NAME, CapabilitySet, ConcreteType, DISPLAY_CAPABILITY, ERROR_CAPABILITY,
    ERROR_TYPE_NAME, FuncSignature, Type, TypeDescriptor, TypeKind,
};
pub use value::{ErrorValue, Value};

/// Prelude for convenient imports
///
/// ```rust,ignore
/// use funconv::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AdaptedFunction, AdapterConfig, AdapterResult, AnyValue, DisplayValue, ErrorValue,
        FaultPolicy, FuncSignature, Function, Reflect, SignatureAdapterError, Type,
        TypeDescriptor, Value, Variadic, Wrapped, build, wrap, wrap_as,
    };
}
