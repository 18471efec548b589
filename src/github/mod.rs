//! GitHub issue tracker integration.

pub mod client;
