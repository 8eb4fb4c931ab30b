//! CLI command implementations.

pub mod collect;
pub mod reset;
pub mod run;
pub mod subscription;
