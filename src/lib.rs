//! # spark-fiber
//!
//! Incremental fiber reconciler for declarative UI trees.
//!
//! Describe the UI as an immutable [`Element`] tree, hand it to a
//! [`Renderer`], and the renderer keeps a host display tree in sync with it
//! across re-renders, applying only the mutations the diff calls for.
//!
//! ## Architecture
//!
//! Rendering is split in two phases:
//!
//! ```text
//! Element tree → render phase (interruptible) → work-in-progress fibers → commit (atomic) → host
//! ```
//!
//! - **Render phase**: one fiber per unit of work, processed in depth-first
//!   order by a cooperative loop that yields whenever the host's
//!   [`Deadline`] runs low. Each unit diffs its children against the last
//!   committed tree and tags them CREATE, UPDATE or REMOVE. Nothing attached
//!   to the display tree changes here.
//! - **Commit phase**: one uninterrupted walk applies the tags, then the new
//!   tree becomes the baseline for the next pass.
//!
//! ## Logging
//!
//! spark-fiber reports through [tracing]: spans around every work slice and
//! commit, `debug` events on yields, discarded passes and commit totals.
//!
//! ## Modules
//!
//! - [`types`] - Node descriptions, prop values, listeners, effect tags
//! - [`element`] - `create_element` and the element builder
//! - [`fiber`] - Fibers and the arena that owns them
//! - [`host`] - The display-tree contract and the in-memory host
//! - [`scheduler`] - Work loop, deadlines and the `Renderer`

pub mod commit;
pub mod config;
pub mod element;
pub mod error;
pub mod fiber;
pub mod host;
mod reconciler;
pub mod scheduler;
pub mod session;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use element::{Child, create_element, text_element};

pub use commit::CommitReport;
pub use config::SchedulerConfig;
pub use error::{HostError, RenderError, Result};
pub use fiber::{Fiber, FiberArena, FiberId};
pub use host::{DirtyFlags, Host, MemoryHost, MutationCounts, NodeId};
pub use scheduler::{
    Deadline, Renderer, RunSummary, SliceDeadline, StepDeadline, Unbounded, WorkStatus,
};
pub use session::{RenderSession, RenderState};
