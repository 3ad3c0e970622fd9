//! Backend worker: owns the tokio runtime and the interaction controller.

pub mod commands;
pub mod runtime;
