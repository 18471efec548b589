//! Domain model module declarations.

pub mod event;
pub mod metadata;
pub mod rule;
