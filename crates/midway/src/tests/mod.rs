//! Test module for midway
//!
//! Async middleware tests driving handlers end to end, plus shared helpers.

#[cfg(test)]
pub mod support;
