//! CLI command implementations.

pub mod analyze;
pub mod common;
pub mod dtmf;
pub mod extract;
