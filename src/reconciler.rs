//! Reconciler - diff one fiber's child descriptions against its committed
//! children.
//!
//! # Algorithm
//!
//! Walk the new descriptions and the alternate's child chain side by side,
//! one pair per step, while either side has elements left:
//!
//! 1. Same kind: UPDATE fiber reusing the old handle, alternate = old fiber
//! 2. New description, no kind match: CREATE fiber
//! 3. Old fiber without a kind match: flag REMOVE, queue in the session
//!
//! Matching is by position, then kind. Keys are not consulted, so reordered
//! same-kind siblings are updated in place.

use std::rc::Rc;

use crate::error::Result;
use crate::fiber::{Fiber, FiberArena, FiberId};
use crate::session::RenderSession;
use crate::types::{EffectTag, Element};

/// Build the child fibers of `parent_id` from `children` and link them in
/// description order.
pub(crate) fn reconcile_children<H: Clone>(
    arena: &mut FiberArena<H>,
    session: &mut RenderSession,
    parent_id: FiberId,
    children: &[Rc<Element>],
) -> Result<()> {
    let mut old = match arena.fiber(parent_id)?.alternate {
        Some(alternate) => arena.fiber(alternate)?.child,
        None => None,
    };
    let mut prev_sibling: Option<FiberId> = None;
    let mut index = 0;

    while index < children.len() || old.is_some() {
        let element = children.get(index);

        let (old_handle, old_sibling, same_kind) = match old {
            Some(old_id) => {
                let old_fiber = arena.fiber(old_id)?;
                let same_kind = element.is_some_and(|el| el.kind == old_fiber.kind);
                (old_fiber.handle.clone(), old_fiber.sibling, same_kind)
            }
            None => (None, None, false),
        };

        let new_fiber = match element {
            Some(element) if same_kind => Some(arena.insert(Fiber {
                handle: old_handle,
                alternate: old,
                effect: Some(EffectTag::Update),
                ..Fiber::new(Rc::clone(element), Some(parent_id))
            })),
            Some(element) => Some(arena.create(Rc::clone(element), Some(parent_id))),
            None => None,
        };

        if !same_kind {
            if let Some(old_id) = old {
                arena.fiber_mut(old_id)?.effect = Some(EffectTag::Remove);
                session.pending_removals.push(old_id);
            }
        }

        if let Some(new_id) = new_fiber {
            match prev_sibling {
                None => arena.fiber_mut(parent_id)?.child = Some(new_id),
                Some(prev) => arena.fiber_mut(prev)?.sibling = Some(new_id),
            }
            prev_sibling = Some(new_id);
        }

        old = old_sibling;
        index += 1;
    }

    Ok(())
}
