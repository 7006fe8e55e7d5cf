//! Subcommand implementations.

pub mod clean;
pub mod describe;
pub mod extract;
pub mod load;
