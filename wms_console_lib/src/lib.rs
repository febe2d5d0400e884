//! # Warehouse Console Library
//!
//! Shared types and utilities for the warehouse robot operations console.
//! This library is used by every client binary in the workspace.

pub mod projector;
pub mod tracker;
pub mod types;
pub mod utils;

// Re-export everything for convenience
pub use projector::*;
pub use tracker::*;
pub use types::*;
pub use utils::*;
