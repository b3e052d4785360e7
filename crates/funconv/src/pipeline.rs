//! Converter pipeline
//!
//! Applies positional converters left to right and aborts at the first
//! failure. Later converters are never evaluated.

use crate::error::ConversionFailure;
use crate::resolve::PositionalConverter;
use crate::value::Value;
use std::sync::Arc;
use tracing::trace;

/// Ordered list of positional converters
#[derive(Debug, Clone)]
pub struct Pipeline {
    converters: Arc<[PositionalConverter]>,
    trace: bool,
}

impl Pipeline {
    /// Create a pipeline
    pub fn new(converters: Vec<PositionalConverter>) -> Self {
        Self {
            converters: converters.into(),
            trace: false,
        }
    }

    /// Emit a trace event per converted position
    #[must_use = "This method returns a new Pipeline and does not modify self"]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Number of positions
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Returns true if there are no positions
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// The converters in position order
    pub fn converters(&self) -> &[PositionalConverter] {
        &self.converters
    }

    /// Convert `values` position by position.
    ///
    /// `values` must have one entry per converter.
    pub fn apply(&self, values: Vec<Value>) -> Result<Vec<Value>, ConversionFailure> {
        let mut out = Vec::with_capacity(values.len());
        self.apply_into(values, &mut out)?;
        Ok(out)
    }

    /// Like [`apply`](Self::apply), appending to `out`.
    ///
    /// On failure `out` keeps the values converted before the failing
    /// position.
    pub fn apply_into(&self, values: Vec<Value>, out: &mut Vec<Value>) -> Result<(), ConversionFailure> {
        debug_assert_eq!(values.len(), self.converters.len(), "pipeline length mismatch");
        for (converter, value) in self.converters.iter().zip(values) {
            let converted = converter
                .convert(value)
                .map_err(|cause| ConversionFailure::new(converter.position(), cause))?;
            if self.trace {
                trace!(
                    position = converter.position(),
                    strategy = %converter.strategy(),
                    to = %converted.ty(),
                    "Converted value"
                );
            }
            out.push(converted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Reflect;
    use crate::resolve::map_converters;

    #[test]
    fn test_empty_pipeline() {
        let pipeline = Pipeline::new(Vec::new());
        assert!(pipeline.is_empty());
        assert!(pipeline.apply(Vec::new()).expect("nothing to convert").is_empty());
    }

    #[test]
    fn test_preserves_order() {
        let types = vec![String::descriptor(), i64::descriptor()];
        let pipeline = Pipeline::new(map_converters(&types, &types).expect("identity"));
        let out = pipeline
            .apply(vec!["a".to_string().into_value(), 7i64.into_value()])
            .expect("identity never fails");
        assert_eq!(out[0].extract::<String>().as_deref(), Some("a"));
        assert_eq!(out[1].extract::<i64>(), Some(7));
    }
}
