//! Application logic for the cartoon pool runner.

pub mod app;
pub mod config;
pub mod errors;
pub mod version;
