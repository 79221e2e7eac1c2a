//! # Reactor Core
//!
//! Core primitives shared by the Reactor crates.
//!
//! This crate provides:
//! - [`Mode`] - How a plan node schedules its work
//! - [`ReactorConfig`] - Read-only process configuration
//! - [`ReactorError`] - Error types

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::{Deployment, ReactorConfig};
pub use error::{ReactorError, Result};
pub use types::Mode;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{Deployment, ReactorConfig};
    pub use crate::error::{ReactorError, Result};
    pub use crate::types::Mode;
}
