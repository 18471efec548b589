#![forbid(unsafe_code)]

//! Files GitHub issues for Slack messages tagged with configured reactions.

pub mod config;
pub mod errors;
pub mod github;
pub mod models;
pub mod pipeline;
pub mod slack;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
