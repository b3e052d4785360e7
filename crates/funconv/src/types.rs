//! Type descriptors
//!
//! A [`TypeDescriptor`] is the runtime stand-in for a type: its display name
//! and its kind. Descriptors are immutable and shared as [`Type`]
//! (`Arc<TypeDescriptor>`). Equality is structural, so two descriptors built
//! independently for the same type compare equal.
//!
//! Three kinds exist:
//!
//! - **Concrete**: a Rust representation (`TypeId`), whether the type is
//!   *named* (a defined type) or a *literal* (structural) type, the set of
//!   capabilities it implements, and an optional zero-value factory.
//! - **Interface**: a set of required capabilities. A value of an interface
//!   type boxes a concrete dynamic value.
//! - **Func**: a [`FuncSignature`].
//!
//! # Example
//! ```rust,ignore
//! use funconv::{TypeDescriptor, DISPLAY_CAPABILITY};
//!
//! let user_id = TypeDescriptor::concrete::<u64>("UserId")
//!     .with_capability(DISPLAY_CAPABILITY)
//!     .shared();
//! assert!(user_id.implements(&TypeDescriptor::display()));
//! ```

use std::any::{Any, TypeId};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Shared, immutable type handle.
pub type Type = Arc<TypeDescriptor>;

/// Factory for the zero value of a concrete type.
pub(crate) type ZeroFn = fn() -> Arc<dyn Any + Send + Sync>;

/// Name of the error capability interface
pub const ERROR_TYPE_NAME: &str = "error";

/// Capability required by the error interface
pub const ERROR_CAPABILITY: &str = "Error";

/// Capability of types that render themselves as text
pub const DISPLAY_CAPABILITY: &str = "Display";

/// Name of the empty interface
pub const ANY_TYPE_NAME: &str = "any";

fn zero_of<T: Any + Send + Sync + Default>() -> Arc<dyn Any + Send + Sync> {
    Arc::new(T::default())
}

/// Set of capability names (the operations a type provides or requires)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(BTreeSet<String>);

impl CapabilitySet {
    /// Create an empty capability set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capability
    pub fn insert(&mut self, capability: impl Into<String>) {
        self.0.insert(capability.into());
    }

    /// Check whether the set contains a capability
    pub fn contains(&self, capability: &str) -> bool {
        self.0.contains(capability)
    }

    /// Returns true if every capability of `required` is in this set
    pub fn covers(&self, required: &CapabilitySet) -> bool {
        required.0.is_subset(&self.0)
    }

    /// Returns true if the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate capabilities in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Concrete type details
#[derive(Clone)]
pub struct ConcreteType {
    repr: TypeId,
    named: bool,
    capabilities: CapabilitySet,
    zero: Option<ZeroFn>,
}

impl ConcreteType {
    /// The Rust representation backing values of this type
    pub fn repr(&self) -> TypeId {
        self.repr
    }

    /// Whether this is a named (defined) type rather than a literal one
    pub fn is_named(&self) -> bool {
        self.named
    }

    /// Capabilities implemented by this type
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Whether a zero value can be constructed
    pub fn has_zero(&self) -> bool {
        self.zero.is_some()
    }
}

impl fmt::Debug for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcreteType")
            .field("repr", &self.repr)
            .field("named", &self.named)
            .field("capabilities", &self.capabilities)
            .field("has_zero", &self.zero.is_some())
            .finish()
    }
}

impl PartialEq for ConcreteType {
    fn eq(&self, other: &Self) -> bool {
        self.repr == other.repr
            && self.named == other.named
            && self.capabilities == other.capabilities
    }
}

impl Eq for ConcreteType {}

/// Parameter list, result list and variadic flag of a callable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncSignature {
    params: Vec<Type>,
    results: Vec<Type>,
    variadic: bool,
}

impl FuncSignature {
    /// Create a non-variadic signature
    pub fn new(params: Vec<Type>, results: Vec<Type>) -> Self {
        Self {
            params,
            results,
            variadic: false,
        }
    }

    /// Mark the last parameter as variadic
    #[must_use = "This method returns a new FuncSignature and does not modify self"]
    pub fn with_variadic(mut self, variadic: bool) -> Self {
        self.variadic = variadic && !self.params.is_empty();
        self
    }

    /// Parameter types in order
    pub fn params(&self) -> &[Type] {
        &self.params
    }

    /// Result types in order
    pub fn results(&self) -> &[Type] {
        &self.results
    }

    /// Whether the last parameter is variadic
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Number of results
    pub fn result_count(&self) -> usize {
        self.results.len()
    }
}

impl fmt::Display for FuncSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func(")?;
        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if self.variadic && i == last {
                let name = param.name();
                write!(f, "...{}", name.strip_prefix("[]").unwrap_or(name))?;
            } else {
                write!(f, "{}", param)?;
            }
        }
        write!(f, ")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {}", single),
            many => {
                write!(f, " (")?;
                for (i, result) in many.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", result)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Kind of a described type
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TypeKind {
    /// A concrete representation
    Concrete(ConcreteType),
    /// A capability interface with its required capabilities
    Interface(CapabilitySet),
    /// A function type
    Func(FuncSignature),
}

/// Runtime description of a type
#[derive(Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
}

impl TypeDescriptor {
    /// Describe a named concrete type represented by `T`.
    ///
    /// Several named descriptors may share one representation (defined types).
    pub fn concrete<T: Any + Send + Sync + Default>(name: impl Into<String>) -> Self {
        Self::concrete_with(name, TypeId::of::<T>(), true, Some(zero_of::<T>))
    }

    /// Describe a literal (unnamed, structural) concrete type represented by `T`.
    ///
    /// Literal types are assignable to named types of the same representation.
    pub fn literal<T: Any + Send + Sync + Default>(name: impl Into<String>) -> Self {
        Self::concrete_with(name, TypeId::of::<T>(), false, Some(zero_of::<T>))
    }

    /// Describe a named concrete type with no default constructor.
    ///
    /// Its zero value is an empty placeholder that yields no payload.
    pub fn opaque<T: Any + Send + Sync>(name: impl Into<String>) -> Self {
        Self::concrete_with(name, TypeId::of::<T>(), true, None)
    }

    fn concrete_with(
        name: impl Into<String>,
        repr: TypeId,
        named: bool,
        zero: Option<ZeroFn>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Concrete(ConcreteType {
                repr,
                named,
                capabilities: CapabilitySet::new(),
                zero,
            }),
        }
    }

    /// Describe an interface requiring `capabilities`.
    pub fn interface<I, S>(name: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: TypeKind::Interface(capabilities.into_iter().collect()),
        }
    }

    /// Describe a function type.
    pub fn func(signature: FuncSignature) -> Self {
        Self {
            name: signature.to_string(),
            kind: TypeKind::Func(signature),
        }
    }

    /// The empty interface, satisfied by every type.
    pub fn any() -> Type {
        Arc::new(Self::interface(ANY_TYPE_NAME, std::iter::empty::<String>()))
    }

    /// The error capability interface.
    pub fn error() -> Type {
        Arc::new(Self::interface(ERROR_TYPE_NAME, [ERROR_CAPABILITY]))
    }

    /// The text rendering capability interface.
    pub fn display() -> Type {
        Arc::new(Self::interface(DISPLAY_CAPABILITY, [DISPLAY_CAPABILITY]))
    }

    /// Add an implemented (concrete) or required (interface) capability.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        match &mut self.kind {
            TypeKind::Concrete(concrete) => concrete.capabilities.insert(capability),
            TypeKind::Interface(required) => required.insert(capability),
            TypeKind::Func(_) => {}
        }
        self
    }

    /// Wrap into a shared [`Type`].
    pub fn shared(self) -> Type {
        Arc::new(self)
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the type
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Returns true for interface types
    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface(_))
    }

    /// Returns true for function types
    pub fn is_func(&self) -> bool {
        matches!(self.kind, TypeKind::Func(_))
    }

    /// The signature of a function type
    pub fn as_func(&self) -> Option<&FuncSignature> {
        match &self.kind {
            TypeKind::Func(signature) => Some(signature),
            _ => None,
        }
    }

    /// The concrete details of a concrete type
    pub fn as_concrete(&self) -> Option<&ConcreteType> {
        match &self.kind {
            TypeKind::Concrete(concrete) => Some(concrete),
            _ => None,
        }
    }

    /// Returns true if this type denotes "operation may fail".
    pub fn is_error_capability(&self) -> bool {
        self.is_interface() && self.name == ERROR_TYPE_NAME
    }

    /// Capabilities implemented (concrete) or required (interface)
    pub fn capabilities(&self) -> Option<&CapabilitySet> {
        match &self.kind {
            TypeKind::Concrete(concrete) => Some(&concrete.capabilities),
            TypeKind::Interface(required) => Some(required),
            TypeKind::Func(_) => None,
        }
    }

    /// Check whether values of this type satisfy the interface `iface`.
    ///
    /// Always false when `iface` is not an interface.
    pub fn implements(&self, iface: &TypeDescriptor) -> bool {
        let TypeKind::Interface(required) = &iface.kind else {
            return false;
        };
        match self.capabilities() {
            Some(provided) => provided.covers(required),
            None => required.is_empty(),
        }
    }

    /// Check whether a value of this type may be used where `target` is expected.
    ///
    /// Holds for identical types, for concrete types sharing a representation
    /// when at least one of them is a literal type, and for any type that
    /// implements the interface `target`.
    pub fn assignable_to(&self, target: &TypeDescriptor) -> bool {
        if self == target {
            return true;
        }
        match (&self.kind, &target.kind) {
            (TypeKind::Concrete(from), TypeKind::Concrete(to)) => {
                from.repr == to.repr && (!from.named || !to.named)
            }
            (_, TypeKind::Interface(_)) => self.implements(target),
            _ => false,
        }
    }

    pub(crate) fn zero_payload(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        match &self.kind {
            TypeKind::Concrete(concrete) => concrete.zero.map(|zero| zero()),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_type() -> Type {
        TypeDescriptor::concrete::<String>("String")
            .with_capability(DISPLAY_CAPABILITY)
            .shared()
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(string_type(), string_type());
        assert_ne!(
            string_type(),
            TypeDescriptor::concrete::<String>("Name").shared()
        );
    }

    #[test]
    fn test_named_types_are_not_mutually_assignable() {
        let user_id = TypeDescriptor::concrete::<u64>("UserId");
        let raw = TypeDescriptor::concrete::<u64>("u64");
        assert!(!raw.assignable_to(&user_id));
        assert!(!user_id.assignable_to(&raw));
    }

    #[test]
    fn test_literal_assignable_to_named_of_same_repr() {
        let names = TypeDescriptor::concrete::<Vec<String>>("Names");
        let literal = TypeDescriptor::literal::<Vec<String>>("[]String");
        assert!(literal.assignable_to(&names));
        assert!(names.assignable_to(&literal));

        let other = TypeDescriptor::literal::<Vec<u8>>("[]u8");
        assert!(!other.assignable_to(&names));
    }

    #[test]
    fn test_interface_satisfaction() {
        let display = TypeDescriptor::display();
        let any = TypeDescriptor::any();
        let error = TypeDescriptor::error();

        assert!(string_type().implements(&display));
        assert!(string_type().implements(&any));
        assert!(!string_type().implements(&error));
        assert!(display.implements(&any));
        assert!(!any.implements(&display));
        assert!(!string_type().implements(&string_type()));
    }

    #[test]
    fn test_concrete_assignable_to_interface() {
        assert!(string_type().assignable_to(&TypeDescriptor::any()));
        assert!(string_type().assignable_to(&TypeDescriptor::display()));
        assert!(!TypeDescriptor::any().assignable_to(&string_type()));
    }

    #[test]
    fn test_error_capability_detection() {
        assert!(TypeDescriptor::error().is_error_capability());
        assert!(!TypeDescriptor::any().is_error_capability());
        assert!(!string_type().is_error_capability());
    }

    #[test]
    fn test_func_signature_display() {
        let int = TypeDescriptor::concrete::<i64>("i64").shared();
        let list = TypeDescriptor::literal::<Vec<String>>("[]String").shared();

        let sig = FuncSignature::new(vec![string_type(), int.clone()], vec![int.clone()]);
        assert_eq!(sig.to_string(), "func(String, i64) i64");

        let sig = FuncSignature::new(
            vec![string_type(), list],
            vec![int, TypeDescriptor::error()],
        )
        .with_variadic(true);
        assert_eq!(sig.to_string(), "func(String, ...String) (i64, error)");

        let sig = FuncSignature::new(vec![], vec![]);
        assert_eq!(sig.to_string(), "func()");
    }

    #[test]
    fn test_variadic_requires_a_parameter() {
        let sig = FuncSignature::new(vec![], vec![]).with_variadic(true);
        assert!(!sig.is_variadic());
    }

    #[test]
    fn test_zero_payload() {
        let zero = string_type().zero_payload().expect("String has a zero");
        assert_eq!(zero.downcast_ref::<String>(), Some(&String::new()));

        let opaque = TypeDescriptor::opaque::<std::fs::File>("File");
        assert!(opaque.zero_payload().is_none());
        assert!(TypeDescriptor::any().zero_payload().is_none());
    }
}
