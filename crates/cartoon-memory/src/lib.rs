//! # cartoon-memory
//!
//! Pooled storage for the cartoon workspace.
//!
//! Provides a fixed-capacity slab of reusable slots with a constructor that
//! runs on every acquisition, an [`Allocator`] trait so callers can swap in
//! instrumented pools, and lock-free usage statistics.
#![warn(missing_docs)]

pub mod error;
pub mod slab;
pub mod stats;

pub use error::AllocError;
pub use slab::{Allocator, SlabCache, Slot};
pub use stats::{AtomicPoolStats, PoolStats};
