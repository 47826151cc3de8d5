//! Host - the display tree the renderer keeps in sync.
//!
//! The engine never builds display nodes itself. It asks a [`Host`] to
//! create them, to write props and listeners on them, and to attach or
//! detach them. Only the commit phase attaches or detaches; the render phase
//! only creates detached nodes and fills their initial props. Nodes left over
//! from a discarded pass are handed back through [`Host::destroy`].
//!
//! [`MemoryHost`] is the in-process implementation used by tests and by
//! embedders that render into their own structures.

mod memory;

pub use memory::{DirtyFlags, MemoryHost, MutationCounts, NodeId};

use std::fmt;

use crate::error::HostError;
use crate::types::{Listener, PropValue};

/// Display-tree operations the engine depends on.
pub trait Host {
    /// Handle to one display node. Cloning must not copy the node.
    type Handle: Clone + PartialEq + fmt::Debug;

    /// Build a detached element node.
    fn create_element(&mut self, kind: &str) -> Result<Self::Handle, HostError>;

    /// Build a detached, empty text node. Its content arrives through
    /// [`set_property`](Self::set_property) with the `value` prop.
    fn create_text(&mut self) -> Result<Self::Handle, HostError>;

    fn set_property(
        &mut self,
        handle: &Self::Handle,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    fn remove_property(&mut self, handle: &Self::Handle, name: &str) -> Result<(), HostError>;

    /// Register `listener` for `event` (name without the `on` prefix).
    fn add_listener(
        &mut self,
        handle: &Self::Handle,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    fn remove_listener(
        &mut self,
        handle: &Self::Handle,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    /// Attach `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Handle, child: &Self::Handle)
    -> Result<(), HostError>;

    /// Attach `child` right before `before`, which must be a child of `parent`.
    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        before: &Self::Handle,
    ) -> Result<(), HostError>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle)
    -> Result<(), HostError>;

    /// Drop a node that was created but never attached, e.g. by a render
    /// pass that was superseded or aborted before its commit.
    ///
    /// Backends that reclaim unreachable nodes on their own can keep the
    /// default.
    fn destroy(&mut self, handle: &Self::Handle) -> Result<(), HostError> {
        let _ = handle;
        Ok(())
    }
}
