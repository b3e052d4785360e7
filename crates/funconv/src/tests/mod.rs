//! Test module for funconv
//!
//! Property-based tests using proptest for the resolver, the converter
//! pipeline and the signature adapter.
