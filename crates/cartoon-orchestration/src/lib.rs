//! # cartoon-orchestration
//!
//! Bulk lifecycle of a cartoon pool: all-or-nothing startup with rollback,
//! waiting for cartoons to retire, and synchronous teardown.

pub mod controller;
pub mod interfaces;

pub use controller::PoolController;
pub use interfaces::{NullObserver, PoolObserver, ReportPresenter, StopReport};
