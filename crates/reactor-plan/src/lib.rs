//! # Reactor Plan
//!
//! Executable call trees. A [`Plan`] is either a [`Block`], which repeats one
//! outbound call, or an [`Operator`], which combines two sub-plans. Leaves
//! reach other services through a [`Dispatcher`].

pub mod context;
pub mod dispatch;
pub mod plan;

pub use context::ExecContext;
pub use dispatch::{Dispatcher, HttpTransport, ResolvedTarget, Transport};
pub use plan::{Block, Operator, Plan, TargetKind};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::context::ExecContext;
    pub use crate::dispatch::{Dispatcher, HttpTransport, Transport};
    pub use crate::plan::{Block, Operator, Plan, TargetKind};
    pub use reactor_core::prelude::*;
}
