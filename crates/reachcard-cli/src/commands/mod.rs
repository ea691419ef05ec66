//! CLI command implementations.

pub mod common;
pub mod resolve;
pub mod simulate;
pub mod validate;
