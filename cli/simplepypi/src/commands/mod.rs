//! CLI command implementations.

pub mod audit;
pub mod packages;
pub mod releases;
pub mod serve;
