//! Work-unit model - fibers and the arena that owns them.
//!
//! Fibers are NOT heap objects linked by pointers. They are slots in an
//! arena, addressed by [`FiberId`], and the tree links are plain ids:
//!
//! ```text
//! Slot 0: ROOT (parent=-,  child=1, sibling=-)
//! Slot 1: div  (parent=0,  child=2, sibling=-)
//! Slot 2: TEXT (parent=1,  child=-, sibling=3)
//! Slot 3: span (parent=1,  child=-, sibling=-)
//! ```
//!
//! Both the committed tree and the work-in-progress tree live in the same
//! arena. Released slots go to a free pool and are reused before the arena
//! grows.

use std::rc::Rc;

use crate::error::{RenderError, Result};
use crate::types::{EffectTag, Element, Props};

// =============================================================================
// Fiber
// =============================================================================

/// Index of a fiber slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId(usize);

impl FiberId {
    /// Raw slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One unit of work.
#[derive(Debug, Clone)]
pub struct Fiber<H> {
    pub kind: String,
    /// Description this fiber renders. Its children are what gets reconciled.
    pub element: Rc<Element>,
    /// Backing display node, created lazily by the scheduler.
    pub handle: Option<H>,
    pub parent: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    /// Matching fiber of the last committed tree. Only valid during the pass.
    pub alternate: Option<FiberId>,
    pub effect: Option<EffectTag>,
}

impl<H> Fiber<H> {
    /// A fresh CREATE fiber with no handle and no alternate.
    pub fn new(element: Rc<Element>, parent: Option<FiberId>) -> Self {
        Self {
            kind: element.kind.clone(),
            element,
            handle: None,
            parent,
            child: None,
            sibling: None,
            alternate: None,
            effect: Some(EffectTag::Create),
        }
    }

    #[inline]
    pub fn props(&self) -> &Props {
        &self.element.props
    }

    #[inline]
    pub fn children(&self) -> &[Rc<Element>] {
        &self.element.children
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Slot storage for fibers.
#[derive(Debug)]
pub struct FiberArena<H> {
    slots: Vec<Option<Fiber<H>>>,
    free: Vec<usize>,
    live: usize,
}

impl<H> FiberArena<H> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Allocate a CREATE fiber for `element` under `parent`.
    pub fn create(&mut self, element: Rc<Element>, parent: Option<FiberId>) -> FiberId {
        self.insert(Fiber::new(element, parent))
    }

    /// Store a fiber, reusing a freed slot when one is available.
    pub fn insert(&mut self, fiber: Fiber<H>) -> FiberId {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(fiber);
                FiberId(index)
            }
            None => {
                self.slots.push(Some(fiber));
                FiberId(self.slots.len() - 1)
            }
        }
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber<H>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<H>> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Like [`get`](Self::get) but a dead id is an error.
    pub fn fiber(&self, id: FiberId) -> Result<&Fiber<H>> {
        self.get(id).ok_or(RenderError::MissingFiber(id))
    }

    pub fn fiber_mut(&mut self, id: FiberId) -> Result<&mut Fiber<H>> {
        self.get_mut(id).ok_or(RenderError::MissingFiber(id))
    }

    /// Free one slot. Releasing a dead id is a no-op.
    pub fn release(&mut self, id: FiberId) -> Option<Fiber<H>> {
        let fiber = self.slots.get_mut(id.0).and_then(Option::take)?;
        self.free.push(id.0);
        self.live -= 1;
        Some(fiber)
    }

    /// Free `root` and every fiber reachable through its child links.
    ///
    /// Siblings of `root` itself are left alone. Returns the number of slots
    /// released.
    pub fn release_tree(&mut self, root: FiberId) -> usize {
        let mut released = 0;
        let mut stack = vec![(root, true)];
        while let Some((id, is_root)) = stack.pop() {
            let Some(fiber) = self.release(id) else { continue };
            released += 1;
            if !is_root {
                if let Some(sibling) = fiber.sibling {
                    stack.push((sibling, false));
                }
            }
            if let Some(child) = fiber.child {
                stack.push((child, false));
            }
        }
        released
    }

    /// Number of live fibers.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Drop every fiber and forget the free pool.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}

impl<H> Default for FiberArena<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Next fiber in depth-first order below `root`: child, else the nearest
/// sibling walking up the ancestors, else `None`.
pub(crate) fn next_in_tree<H>(
    arena: &FiberArena<H>,
    id: FiberId,
    root: FiberId,
) -> Result<Option<FiberId>> {
    let fiber = arena.fiber(id)?;
    if fiber.child.is_some() {
        return Ok(fiber.child);
    }

    let mut cursor = id;
    while cursor != root {
        let fiber = arena.fiber(cursor)?;
        if fiber.sibling.is_some() {
            return Ok(fiber.sibling);
        }
        match fiber.parent {
            Some(parent) => cursor = parent,
            None => break,
        }
    }
    Ok(None)
}
