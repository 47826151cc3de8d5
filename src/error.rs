//! Error types.
//!
//! The core never retries or recovers: a host failure aborts the current
//! render pass and is handed back to whoever drives the scheduler.

use thiserror::Error;

use crate::fiber::FiberId;

/// Failure reported by a [`Host`](crate::host::Host) operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host cannot build a node of this kind (empty or reserved name).
    #[error("cannot create a display node of kind {0:?}")]
    UnknownKind(String),

    /// The handle does not refer to a live node.
    #[error("display handle {0} does not exist")]
    MissingHandle(String),

    /// `child` was expected under `parent` but is not there.
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    /// The prop cannot be written as a plain property.
    #[error("prop {0:?} cannot be set as a property")]
    InvalidProp(String),
}

/// Failure of a render pass.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Host(#[from] HostError),

    /// A fiber id was used after its slot was released.
    #[error("fiber {0:?} is not live")]
    MissingFiber(FiberId),

    /// A fiber reached commit without a display handle.
    #[error("fiber {0:?} has no display handle")]
    MissingHandle(FiberId),
}

pub type Result<T> = std::result::Result<T, RenderError>;
