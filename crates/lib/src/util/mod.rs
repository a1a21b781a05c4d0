//! Shared utilities.
//!
//! Test helpers for spawning stand-in engines live here.

#[cfg(test)]
pub mod testutil;
