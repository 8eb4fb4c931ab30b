//! Domain layer: models, ports and errors of the launch notification pipeline.

pub mod errors;
pub mod models;
pub mod ports;
