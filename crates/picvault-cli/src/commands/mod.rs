//! CLI command implementations.

pub mod clear;
pub mod config;
pub mod extract;
pub mod history;
pub mod list;
pub mod load;
pub mod star;
pub mod sweep;
pub mod usage;
