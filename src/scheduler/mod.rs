//! Scheduler - the cooperative work loop and the renderer that owns it.
//!
//! # States
//!
//! ```text
//!            render()                   cursor exhausted
//!   Idle ─────────────────▶ Rendering ─────────────────▶ commit ─▶ Idle
//!                            │    ▲
//!                            └────┘ work_loop() yields between units
//! ```
//!
//! Each call to [`Renderer::work_loop`] processes units until the
//! [`Deadline`] asks for control back or the tree is exhausted. Processing a
//! unit never touches attached display nodes: it creates the unit's handle
//! (detached) and reconciles its children. Once nothing is left, the commit
//! runs to completion inside the same call.
//!
//! # Example
//!
//! ```
//! use spark_fiber::{create_element, props, MemoryHost, Renderer, StepDeadline, WorkStatus};
//!
//! let mut host = MemoryHost::new();
//! let root = host.create_root();
//! let mut renderer = Renderer::new(host);
//!
//! renderer.render(create_element("div", props! { "id" => "a" }, ["hi"]), root);
//!
//! // Host-driven slices of two units each
//! loop {
//!     match renderer.work_loop(&StepDeadline::new(2)).unwrap() {
//!         WorkStatus::Yielded => continue,
//!         _ => break,
//!     }
//! }
//! assert_eq!(renderer.host().to_markup(root), "<div id=\"a\">hi</div>");
//! ```

mod deadline;

pub use deadline::{Deadline, SliceDeadline, StepDeadline, Unbounded};

use std::rc::Rc;

use tracing::{debug, trace, trace_span, warn};

use crate::commit::{CommitReport, commit_root, update_props};
use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::fiber::{Fiber, FiberArena, FiberId, next_in_tree};
use crate::host::Host;
use crate::reconciler::reconcile_children;
use crate::session::{RenderSession, RenderState};
use crate::types::{EffectTag, Element, Props};

/// Outcome of one [`Renderer::work_loop`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing was pending.
    Idle,
    /// Budget ran out with work left. Schedule another slice.
    Yielded,
    /// The pass finished and was committed.
    Committed(CommitReport),
}

/// Result of [`Renderer::run_slices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Slices handed to the work loop, including the final one.
    pub slices: usize,
    /// Report of the commit, if one happened.
    pub report: Option<CommitReport>,
}

// =============================================================================
// Renderer
// =============================================================================

/// Owns one mounted tree: the host, the fiber arena and the render session.
pub struct Renderer<H: Host> {
    host: H,
    arena: FiberArena<H::Handle>,
    session: RenderSession,
    config: SchedulerConfig,
}

impl<H: Host> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, SchedulerConfig::default())
    }

    pub fn with_config(host: H, config: SchedulerConfig) -> Self {
        Self {
            host,
            arena: FiberArena::new(),
            session: RenderSession::new(),
            config,
        }
    }

    /// Start a render pass of `element` into `container`.
    ///
    /// Returns immediately; the work happens in [`work_loop`](Self::work_loop).
    /// An unfinished pass is discarded and replaced.
    pub fn render(&mut self, element: impl Into<Rc<Element>>, container: H::Handle) {
        self.discard_work_in_progress();

        // A different container means the committed tree leaves its old one
        let moved_from = self.session.current.filter(|&current| {
            !self
                .arena
                .get(current)
                .is_some_and(|root| root.handle.as_ref() == Some(&container))
        });
        let alternate = match moved_from {
            Some(_) => None,
            None => self.session.current,
        };

        let root = self.arena.insert(Fiber {
            handle: Some(container),
            alternate,
            effect: None,
            ..Fiber::new(Rc::new(Element::root(element.into())), None)
        });
        self.session.begin(root);
        if let Some(current) = moved_from {
            self.unmount_current(current);
        }
        trace!(root = root.index(), "render pass scheduled");
    }

    /// Process units until `deadline` asks to yield or the pass is done.
    ///
    /// Errors abort the pass: the work-in-progress tree is discarded and the
    /// last committed tree stays current.
    pub fn work_loop(&mut self, deadline: &impl Deadline) -> Result<WorkStatus> {
        let _span = trace_span!("work_loop").entered();
        match self.step(deadline) {
            Ok(status) => Ok(status),
            Err(err) => {
                debug!(error = %err, "render pass aborted");
                self.discard_work_in_progress();
                Err(err)
            }
        }
    }

    fn step(&mut self, deadline: &impl Deadline) -> Result<WorkStatus> {
        let mut processed = 0usize;
        while let Some(unit) = self.session.next_unit {
            self.session.next_unit = self.perform_unit_of_work(unit)?;
            processed += 1;

            if self.session.next_unit.is_some()
                && deadline.should_yield(self.config.yield_threshold)
            {
                debug!(
                    processed,
                    remaining_us = deadline.time_remaining().as_micros() as u64,
                    "yielding to host"
                );
                return Ok(WorkStatus::Yielded);
            }
        }

        if self.session.work_in_progress.is_some() {
            let report = commit_root(&mut self.host, &mut self.arena, &mut self.session)?;
            return Ok(WorkStatus::Committed(report));
        }
        Ok(WorkStatus::Idle)
    }

    /// Materialize the handle, reconcile children, pick the next unit.
    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>> {
        let fiber = self.arena.fiber(id)?;
        let element = Rc::clone(&fiber.element);
        trace!(fiber = id.index(), kind = %fiber.kind, "processing unit");

        if fiber.handle.is_none() {
            let handle = create_handle(&mut self.host, &element)?;
            self.arena.fiber_mut(id)?.handle = Some(handle);
        }

        reconcile_children(&mut self.arena, &mut self.session, id, &element.children)?;

        match self.session.work_in_progress {
            Some(root) => next_in_tree(&self.arena, id, root),
            None => Ok(None),
        }
    }

    /// Run the pending pass to completion without yielding.
    pub fn flush(&mut self) -> Result<Option<CommitReport>> {
        match self.work_loop(&Unbounded)? {
            WorkStatus::Committed(report) => Ok(Some(report)),
            _ => Ok(None),
        }
    }

    /// Drive slices from `next_slice` until the renderer is idle again.
    pub fn run_slices<D, F>(&mut self, mut next_slice: F) -> Result<RunSummary>
    where
        D: Deadline,
        F: FnMut() -> D,
    {
        let mut slices = 0;
        loop {
            slices += 1;
            match self.work_loop(&next_slice())? {
                WorkStatus::Yielded => continue,
                WorkStatus::Committed(report) => {
                    return Ok(RunSummary {
                        slices,
                        report: Some(report),
                    });
                }
                WorkStatus::Idle => return Ok(RunSummary { slices, report: None }),
            }
        }
    }

    /// Drop the in-progress tree and undo the REMOVE flags it placed on the
    /// committed tree. Handles built for its CREATE fibers were never
    /// attached and go back to the host.
    fn discard_work_in_progress(&mut self) {
        let Some((root, removals)) = self.session.abandon() else { return };
        for id in removals {
            if let Some(fiber) = self.arena.get_mut(id) {
                fiber.effect = None;
            }
        }

        let mut destroyed = 0usize;
        let mut cursor = Some(root);
        while let Some(id) = cursor {
            if let Some(fiber) = self.arena.get(id) {
                if let (Some(EffectTag::Create), Some(handle)) = (fiber.effect, &fiber.handle) {
                    match self.host.destroy(handle) {
                        Ok(()) => destroyed += 1,
                        Err(err) => warn!(fiber = id.index(), error = %err, "handle not destroyed"),
                    }
                }
            }
            cursor = next_in_tree(&self.arena, id, root).ok().flatten();
        }

        let released = self.arena.release_tree(root);
        debug!(released, destroyed, "discarded unfinished render pass");
    }

    /// Queue the committed tree's top-level fibers for removal so they leave
    /// their old container at the next commit.
    fn unmount_current(&mut self, current: FiberId) {
        let mut cursor = self.arena.get(current).and_then(|root| root.child);
        while let Some(id) = cursor {
            let Some(fiber) = self.arena.get_mut(id) else { break };
            fiber.effect = Some(EffectTag::Remove);
            cursor = fiber.sibling;
            self.session.pending_removals.push(id);
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn state(&self) -> RenderState {
        self.session.state()
    }

    pub fn is_idle(&self) -> bool {
        self.session.state() == RenderState::Idle
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub fn arena(&self) -> &FiberArena<H::Handle> {
        &self.arena
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access. Changing attached nodes behind the renderer's back
    /// breaks the next diff.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Handle of the committed top-level element.
    pub fn current_root_handle(&self) -> Option<&H::Handle> {
        let root = self.arena.get(self.session.current?)?;
        self.arena.get(root.child?)?.handle.as_ref()
    }
}

/// Build a detached handle for `element` with its initial props applied.
fn create_handle<H: Host>(host: &mut H, element: &Element) -> Result<H::Handle> {
    let handle = if element.is_text() {
        host.create_text()?
    } else {
        host.create_element(&element.kind)?
    };
    if let Err(err) = update_props(host, &handle, &Props::new(), &element.props) {
        if let Err(destroy_err) = host.destroy(&handle) {
            warn!(error = %destroy_err, "handle not destroyed");
        }
        return Err(err);
    }
    Ok(handle)
}

impl<H: Host> std::fmt::Debug for Renderer<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("state", &self.session.state())
            .field("fibers", &self.arena.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::create_element;
    use crate::host::MemoryHost;
    use crate::props;

    fn tree(id: &str) -> Element {
        create_element(
            "ul",
            props! { "id" => id },
            [
                create_element("li", None, ["one"]),
                create_element("li", None, ["two"]),
            ],
        )
    }

    #[test]
    fn test_render_is_deferred() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let mut renderer = Renderer::new(host);

        renderer.render(tree("a"), root);

        assert_eq!(renderer.state(), RenderState::Rendering);
        assert!(renderer.host().children(root).is_empty());
        assert_eq!(renderer.host().live_count(), 1);
    }

    #[test]
    fn test_work_loop_yields_between_units() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let mut renderer = Renderer::new(host);
        renderer.render(tree("a"), root);

        // ROOT, ul, li, TEXT, li, TEXT = 6 units
        assert_eq!(renderer.work_loop(&StepDeadline::new(2)).unwrap(), WorkStatus::Yielded);
        assert!(renderer.host().children(root).is_empty());
        assert_eq!(renderer.work_loop(&StepDeadline::new(3)).unwrap(), WorkStatus::Yielded);
        assert!(renderer.host().children(root).is_empty());

        let status = renderer.work_loop(&StepDeadline::new(3)).unwrap();
        assert!(matches!(status, WorkStatus::Committed(_)));
        assert_eq!(
            renderer.host().to_markup(root),
            "<ul id=\"a\"><li>one</li><li>two</li></ul>"
        );
        assert!(renderer.is_idle());
        assert_eq!(renderer.work_loop(&Unbounded).unwrap(), WorkStatus::Idle);
    }

    #[test]
    fn test_run_slices_counts() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let mut renderer = Renderer::new(host);
        renderer.render(tree("a"), root);

        let summary = renderer.run_slices(|| StepDeadline::new(1)).unwrap();
        assert_eq!(summary.slices, 6);
        assert_eq!(
            summary.report,
            Some(CommitReport {
                created: 1 + 2 + 2,
                updated: 0,
                removed: 0
            })
        );
    }

    #[test]
    fn test_render_while_rendering_restarts() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let mut renderer = Renderer::new(host);

        renderer.render(tree("a"), root);
        renderer.flush().unwrap();
        let fibers_after_commit = renderer.arena().len();

        renderer.render(create_element("p", None, ["x"]), root);
        assert_eq!(renderer.work_loop(&StepDeadline::new(2)).unwrap(), WorkStatus::Yielded);
        assert_eq!(renderer.session().pending_removals().len(), 1);

        // Superseded before commit: the attached tree is untouched
        renderer.render(tree("b"), root);
        assert!(renderer.session().pending_removals().is_empty());
        assert_eq!(
            renderer.host().to_markup(root),
            "<ul id=\"a\"><li>one</li><li>two</li></ul>"
        );

        let report = renderer.flush().unwrap().unwrap();
        assert_eq!(report, CommitReport { created: 0, updated: 5, removed: 0 });
        assert_eq!(
            renderer.host().to_markup(root),
            "<ul id=\"b\"><li>one</li><li>two</li></ul>"
        );
        assert_eq!(renderer.arena().len(), fibers_after_commit);
    }

    #[test]
    fn test_bad_kind_aborts_pass() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let mut renderer = Renderer::new(host);
        renderer.render(tree("a"), root);
        renderer.flush().unwrap();

        renderer.render(create_element("", None, ["x"]), root);
        assert!(renderer.flush().is_err());
        assert!(renderer.is_idle());

        // Committed tree is still the baseline
        renderer.render(tree("a"), root);
        let report = renderer.flush().unwrap().unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.removed, 0);
    }

    #[test]
    fn test_aborted_pass_destroys_its_handles() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let mut renderer = Renderer::new(host);
        renderer.render(tree("a"), root);
        renderer.flush().unwrap();
        let live = renderer.host().live_count();

        // section and its text exist before the bad sibling fails
        let broken = create_element(
            "div",
            None,
            [create_element("section", None, ["x"]), create_element("", None, ["y"])],
        );
        renderer.render(broken, root);
        assert!(renderer.flush().is_err());

        assert_eq!(renderer.host().live_count(), live);
        assert_eq!(renderer.host().counts().destroyed, 3);
    }

    #[test]
    fn test_superseded_pass_destroys_its_handles() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let mut renderer = Renderer::new(host);
        renderer.render(tree("a"), root);
        renderer.flush().unwrap();
        let live = renderer.host().live_count();

        // ROOT (update) and p (create) are processed, then the pass is replaced
        renderer.render(create_element("p", None, ["x"]), root);
        assert_eq!(renderer.work_loop(&StepDeadline::new(2)).unwrap(), WorkStatus::Yielded);
        assert_eq!(renderer.host().live_count(), live + 1);

        renderer.render(tree("b"), root);
        assert_eq!(renderer.host().live_count(), live);
        assert_eq!(renderer.host().counts().destroyed, 1);
    }

    #[test]
    fn test_switching_container_moves_tree() {
        let mut host = MemoryHost::new();
        let first = host.create_root();
        let second = host.create_root();
        let mut renderer = Renderer::new(host);

        renderer.render(tree("a"), first);
        renderer.flush().unwrap();
        renderer.render(tree("a"), second);
        let report = renderer.flush().unwrap().unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(report.created, 5);
        assert!(renderer.host().children(first).is_empty());
        assert_eq!(renderer.host().children(second).len(), 1);
    }
}
