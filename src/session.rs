//! Render session - the state one renderer threads through a pass.

use crate::fiber::FiberId;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// No work-in-progress tree.
    Idle,
    /// A work-in-progress tree is being built or waits for commit.
    Rendering,
}

/// Roots and cursor of the active pass.
#[derive(Debug, Default)]
pub struct RenderSession {
    /// Root of the last committed tree.
    pub(crate) current: Option<FiberId>,
    /// Root of the tree being built.
    pub(crate) work_in_progress: Option<FiberId>,
    /// Next fiber the scheduler will process.
    pub(crate) next_unit: Option<FiberId>,
    /// Committed fibers flagged REMOVE during this pass.
    pub(crate) pending_removals: Vec<FiberId>,
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RenderState {
        if self.work_in_progress.is_some() {
            RenderState::Rendering
        } else {
            RenderState::Idle
        }
    }

    pub fn current(&self) -> Option<FiberId> {
        self.current
    }

    pub fn work_in_progress(&self) -> Option<FiberId> {
        self.work_in_progress
    }

    pub fn next_unit(&self) -> Option<FiberId> {
        self.next_unit
    }

    pub fn pending_removals(&self) -> &[FiberId] {
        &self.pending_removals
    }

    /// Start a pass rooted at `root`.
    pub(crate) fn begin(&mut self, root: FiberId) {
        self.work_in_progress = Some(root);
        self.next_unit = Some(root);
        self.pending_removals.clear();
    }

    /// Promote the work-in-progress root. Returns the replaced current root.
    pub(crate) fn promote(&mut self) -> Option<FiberId> {
        let root = self.work_in_progress.take()?;
        self.next_unit = None;
        self.pending_removals.clear();
        self.current.replace(root)
    }

    /// Forget the work-in-progress pass, returning its root and removals.
    pub(crate) fn abandon(&mut self) -> Option<(FiberId, Vec<FiberId>)> {
        let root = self.work_in_progress.take()?;
        self.next_unit = None;
        Some((root, std::mem::take(&mut self.pending_removals)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiber::FiberArena;
    use crate::types::Element;
    use std::rc::Rc;

    #[test]
    fn test_state_transitions() {
        let mut arena: FiberArena<u32> = FiberArena::new();
        let first = arena.create(Rc::new(Element::new("ROOT")), None);
        let second = arena.create(Rc::new(Element::new("ROOT")), None);
        let mut session = RenderSession::new();

        assert_eq!(session.state(), RenderState::Idle);

        session.begin(first);
        assert_eq!(session.state(), RenderState::Rendering);
        assert_eq!(session.next_unit(), Some(first));

        assert_eq!(session.promote(), None);
        assert_eq!(session.state(), RenderState::Idle);
        assert_eq!(session.current(), Some(first));

        session.begin(second);
        session.pending_removals.push(first);
        let (root, removals) = session.abandon().unwrap();
        assert_eq!(root, second);
        assert_eq!(removals, vec![first]);
        assert_eq!(session.current(), Some(first));
        assert!(session.next_unit().is_none());
    }
}
