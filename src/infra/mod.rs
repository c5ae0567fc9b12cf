//! Adapters for external systems.

pub mod git;
pub mod yunxiao;
