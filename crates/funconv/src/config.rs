//! Adapter configuration
//!
//! # Example
//! ```rust,ignore
//! use funconv::{AdapterConfig, FaultPolicy};
//!
//! let config = AdapterConfig::new()
//!     .with_fault_policy(FaultPolicy::Abort)
//!     .with_trace_conversions(true);
//! ```

use serde::{Deserialize, Serialize};

/// What [`AdaptedFunction::call`](crate::AdaptedFunction::call) does with a
/// conversion failure that has no error slot to go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FaultPolicy {
    /// Unwind with the [`SignatureAdapterError`](crate::SignatureAdapterError)
    /// as the panic payload.
    #[default]
    Panic,
    /// Log the failure and abort the process.
    Abort,
}

/// Configuration for building adapted functions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Handling of unrecoverable invocation failures
    pub fault_policy: FaultPolicy,
    /// Emit a trace event for every converted value
    pub trace_conversions: bool,
}

impl AdapterConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fault policy
    #[must_use = "This method returns a new AdapterConfig and does not modify self"]
    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    /// Enable or disable per-value conversion tracing
    #[must_use = "This method returns a new AdapterConfig and does not modify self"]
    pub fn with_trace_conversions(mut self, enabled: bool) -> Self {
        self.trace_conversions = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdapterConfig::new();
        assert_eq!(config.fault_policy, FaultPolicy::Panic);
        assert!(!config.trace_conversions);
    }

    #[test]
    fn test_builders() {
        let config = AdapterConfig::new()
            .with_fault_policy(FaultPolicy::Abort)
            .with_trace_conversions(true);
        assert_eq!(config.fault_policy, FaultPolicy::Abort);
        assert!(config.trace_conversions);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&AdapterConfig::new().with_fault_policy(FaultPolicy::Abort))
            .expect("serializes");
        assert_eq!(json, r#"{"fault_policy":"abort","trace_conversions":false}"#);

        let config: AdapterConfig = serde_json::from_str("{}").expect("defaults fill in");
        assert_eq!(config, AdapterConfig::default());
    }
}
