//! Committer - apply a finished work-in-progress tree to the host.
//!
//! Runs in one uninterrupted call:
//!
//! 1. Detach every fiber queued for REMOVE
//! 2. Walk the work-in-progress tree depth first and apply each effect
//! 3. Promote the work-in-progress root to current, release the old tree
//!
//! The prop diff used by UPDATE also fills the initial props of a handle
//! when the scheduler materializes it (diff against an empty map).

use tracing::{debug, debug_span, trace, warn};

use crate::error::{RenderError, Result};
use crate::fiber::{FiberArena, FiberId, next_in_tree};
use crate::host::Host;
use crate::session::RenderSession;
use crate::types::{EffectTag, PropValue, Props, event_name, is_event};

/// Effect counts of one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

// =============================================================================
// Commit
// =============================================================================

pub(crate) fn commit_root<H: Host>(
    host: &mut H,
    arena: &mut FiberArena<H::Handle>,
    session: &mut RenderSession,
) -> Result<CommitReport> {
    let mut report = CommitReport::default();
    let Some(root) = session.work_in_progress else {
        return Ok(report);
    };
    let _span = debug_span!("commit", root = root.index()).entered();

    for id in std::mem::take(&mut session.pending_removals) {
        commit_removal(host, arena, id)?;
        report.removed += 1;
    }

    let mut cursor = arena.fiber(root)?.child;
    while let Some(id) = cursor {
        commit_work(host, arena, id, &mut report)?;
        cursor = next_in_tree(arena, id, root)?;
    }
    arena.fiber_mut(root)?.alternate = None;

    if let Some(old) = session.promote() {
        let released = arena.release_tree(old);
        trace!(released, "released previous tree");
    }

    debug!(
        created = report.created,
        updated = report.updated,
        removed = report.removed,
        fibers = arena.len(),
        "commit finished"
    );
    Ok(report)
}

fn commit_work<H: Host>(
    host: &mut H,
    arena: &mut FiberArena<H::Handle>,
    id: FiberId,
    report: &mut CommitReport,
) -> Result<()> {
    let fiber = arena.fiber(id)?;
    match fiber.effect {
        Some(EffectTag::Create) => {
            let handle = fiber.handle.clone().ok_or(RenderError::MissingHandle(id))?;
            let parent = parent_handle(arena, id)?;
            match next_attached_sibling(arena, fiber.sibling)? {
                Some(before) => host.insert_before(&parent, &handle, &before)?,
                None => host.append_child(&parent, &handle)?,
            }
            report.created += 1;
        }
        Some(EffectTag::Update) => {
            let handle = fiber.handle.clone().ok_or(RenderError::MissingHandle(id))?;
            let next = fiber.element.clone();
            let prev = match fiber.alternate {
                Some(alternate) => Some(arena.fiber(alternate)?.element.clone()),
                None => None,
            };
            let empty = Props::new();
            let prev_props = match prev.as_deref() {
                Some(element) => &element.props,
                None => &empty,
            };
            update_props(host, &handle, prev_props, &next.props)?;
            report.updated += 1;
        }
        Some(EffectTag::Remove) | None => {}
    }

    let fiber = arena.fiber_mut(id)?;
    fiber.effect = None;
    fiber.alternate = None;
    Ok(())
}

fn commit_removal<H: Host>(
    host: &mut H,
    arena: &mut FiberArena<H::Handle>,
    id: FiberId,
) -> Result<()> {
    let parent = parent_handle(arena, id)?;
    let mut targets = vec![id];

    // A fiber without a handle is detached through its children
    while let Some(target) = targets.pop() {
        let fiber = arena.fiber(target)?;
        match &fiber.handle {
            Some(handle) => host.remove_child(&parent, handle)?,
            None => {
                let mut child = fiber.child;
                while let Some(c) = child {
                    targets.push(c);
                    child = arena.fiber(c)?.sibling;
                }
            }
        }
    }

    arena.fiber_mut(id)?.effect = None;
    Ok(())
}

/// Handle of the nearest ancestor that has one.
fn parent_handle<H: Clone>(arena: &FiberArena<H>, id: FiberId) -> Result<H> {
    let mut cursor = arena.fiber(id)?.parent;
    while let Some(parent) = cursor {
        let fiber = arena.fiber(parent)?;
        if let Some(handle) = &fiber.handle {
            return Ok(handle.clone());
        }
        cursor = fiber.parent;
    }
    Err(RenderError::MissingHandle(id))
}

/// First later sibling whose handle is already attached (an UPDATE).
fn next_attached_sibling<H: Clone>(
    arena: &FiberArena<H>,
    start: Option<FiberId>,
) -> Result<Option<H>> {
    let mut cursor = start;
    while let Some(id) = cursor {
        let fiber = arena.fiber(id)?;
        if fiber.effect == Some(EffectTag::Update) {
            return Ok(fiber.handle.clone());
        }
        cursor = fiber.sibling;
    }
    Ok(None)
}

// =============================================================================
// Prop diff
// =============================================================================

/// Bring `handle` from `prev` props to `next` props.
///
/// Order matters for listeners: a changed listener is removed before its
/// replacement is added.
pub(crate) fn update_props<H: Host>(
    host: &mut H,
    handle: &H::Handle,
    prev: &Props,
    next: &Props,
) -> Result<()> {
    // Remove listeners that vanished or changed
    for (name, old) in prev.iter().filter(|(name, _)| is_event(name)) {
        if next.get(name) == Some(old) {
            continue;
        }
        if let (Some(event), Some(listener)) = (event_name(name), old.as_listener()) {
            host.remove_listener(handle, &event, listener)?;
        }
    }

    // Remove props that vanished
    for name in prev.keys().filter(|name| !is_event(name)) {
        if !next.contains_key(name) {
            host.remove_property(handle, name)?;
        }
    }

    // Set props that are new or changed
    for (name, value) in next.iter().filter(|(name, _)| !is_event(name)) {
        if prev.get(name) != Some(value) {
            host.set_property(handle, name, value)?;
        }
    }

    // Add listeners that are new or changed
    for (name, value) in next.iter().filter(|(name, _)| is_event(name)) {
        if prev.get(name) == Some(value) {
            continue;
        }
        match (event_name(name), value) {
            (Some(event), PropValue::Listener(listener)) => {
                host.add_listener(handle, &event, listener)?
            }
            _ => warn!(prop = %name, "event prop without a listener ignored"),
        }
    }

    Ok(())
}
