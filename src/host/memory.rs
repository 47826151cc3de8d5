//! Memory host - an index-allocated display tree.
//!
//! Manages the lifecycle of display nodes:
//! - Index allocation with a free pool for O(1) reuse
//! - Parent/children links kept in both directions
//! - Recursive release when a node is detached
//! - Per-node dirty flags and global mutation counters for inspection

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};

use bitflags::bitflags;

use super::Host;
use crate::error::HostError;
use crate::types::{Event, Listener, PropValue, ROOT_KIND, TEXT_ELEMENT, TEXT_VALUE, is_event};

// =============================================================================
// Types
// =============================================================================

/// Handle to a node of a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// What changed on a node since its flags were last taken.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        /// A plain prop was set or removed.
        const PROPS = 1 << 0;
        /// A listener was added or removed.
        const LISTENERS = 1 << 1;
        /// A child was attached or detached.
        const CHILDREN = 1 << 2;
        /// Text content changed.
        const TEXT = 1 << 3;
    }
}

/// Counters of host calls since the last [`MemoryHost::reset_counts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationCounts {
    pub created: usize,
    pub props_set: usize,
    pub props_removed: usize,
    pub listeners_added: usize,
    pub listeners_removed: usize,
    pub attached: usize,
    pub detached: usize,
    /// Unattached nodes dropped through [`Host::destroy`].
    pub destroyed: usize,
}

impl MutationCounts {
    /// Prop and listener writes (what an UPDATE can cause).
    pub fn attribute_mutations(&self) -> usize {
        self.props_set + self.props_removed + self.listeners_added + self.listeners_removed
    }
}

#[derive(Debug)]
struct Node {
    kind: String,
    text: Option<String>,
    props: BTreeMap<String, PropValue>,
    listeners: HashMap<String, Vec<Listener>>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    dirty: DirtyFlags,
}

impl Node {
    fn new(kind: &str, text: Option<String>) -> Self {
        Self {
            kind: kind.to_string(),
            text,
            props: BTreeMap::new(),
            listeners: HashMap::new(),
            parent: None,
            children: Vec::new(),
            dirty: DirtyFlags::empty(),
        }
    }
}

// =============================================================================
// Memory Host
// =============================================================================

/// In-memory display tree.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: HashMap<usize, Node>,
    free: Vec<usize>,
    next: usize,
    counts: MutationCounts,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached container to render into.
    pub fn create_root(&mut self) -> NodeId {
        self.allocate(Node::new(ROOT_KIND, None))
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = self.next;
                self.next += 1;
                index
            }
        };
        self.nodes.insert(index, node);
        NodeId(index)
    }

    /// Release a node and, recursively, all of its children.
    fn release(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id.0) else { return };
        for child in node.children {
            self.release(child);
        }
        self.free.push(id.0);

        // Everything released: start numbering from zero again
        if self.nodes.is_empty() {
            self.free.clear();
            self.next = 0;
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node, HostError> {
        self.nodes
            .get(&id.0)
            .ok_or_else(|| HostError::MissingHandle(id.to_string()))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, HostError> {
        self.nodes
            .get_mut(&id.0)
            .ok_or_else(|| HostError::MissingHandle(id.to_string()))
    }

    fn detach(&mut self, child: NodeId) -> Result<(), HostError> {
        let Some(parent) = self.node(child)?.parent else { return Ok(()) };
        let parent_node = self.node_mut(parent)?;
        parent_node.children.retain(|&c| c != child);
        parent_node.dirty |= DirtyFlags::CHILDREN;
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Check if the handle refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id.0)
    }

    pub fn kind(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id.0).map(|n| n.kind.as_str())
    }

    /// Text content, for text nodes.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id.0).and_then(|n| n.text.as_deref())
    }

    pub fn prop(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.nodes.get(&id.0).and_then(|n| n.props.get(name))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id.0).and_then(|n| n.parent)
    }

    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        self.nodes
            .get(&id.0)
            .and_then(|n| n.listeners.get(event))
            .map_or(0, Vec::len)
    }

    /// Number of live nodes, attached or not.
    pub fn live_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn counts(&self) -> MutationCounts {
        self.counts
    }

    pub fn reset_counts(&mut self) {
        self.counts = MutationCounts::default();
    }

    /// Return and clear the dirty flags of one node.
    pub fn take_dirty(&mut self, id: NodeId) -> DirtyFlags {
        self.nodes
            .get_mut(&id.0)
            .map(|n| std::mem::take(&mut n.dirty))
            .unwrap_or_default()
    }

    /// Clear the dirty flags of every node.
    pub fn clear_dirty(&mut self) {
        for node in self.nodes.values_mut() {
            node.dirty = DirtyFlags::empty();
        }
    }

    /// Invoke every listener registered for `event` on `id`.
    ///
    /// Returns how many listeners ran. Panics inside listeners are not caught.
    pub fn dispatch(&self, id: NodeId, event: &Event) -> usize {
        let listeners = self
            .nodes
            .get(&id.0)
            .and_then(|n| n.listeners.get(&event.name))
            .cloned()
            .unwrap_or_default();
        for listener in &listeners {
            listener.call(event);
        }
        listeners.len()
    }

    /// Serialize the subtree below `id` (children only) as markup.
    ///
    /// ```text
    /// <div id="a">hi</div>
    /// ```
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_markup(child, &mut out);
        }
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(&id.0) else { return };
        if let Some(text) = &node.text {
            out.push_str(text);
            return;
        }
        let _ = write!(out, "<{}", node.kind);
        for (name, value) in &node.props {
            let _ = write!(out, " {}=\"{}\"", name, value.to_text());
        }
        out.push('>');
        for &child in &node.children {
            self.write_markup(child, out);
        }
        let _ = write!(out, "</{}>", node.kind);
    }
}

// =============================================================================
// Host implementation
// =============================================================================

impl Host for MemoryHost {
    type Handle = NodeId;

    fn create_element(&mut self, kind: &str) -> Result<NodeId, HostError> {
        let valid = !kind.is_empty()
            && kind != TEXT_ELEMENT
            && kind != ROOT_KIND
            && !kind.chars().any(|c| c.is_whitespace() || c == '<' || c == '>');
        if !valid {
            return Err(HostError::UnknownKind(kind.to_string()));
        }
        self.counts.created += 1;
        Ok(self.allocate(Node::new(kind, None)))
    }

    fn create_text(&mut self) -> Result<NodeId, HostError> {
        self.counts.created += 1;
        Ok(self.allocate(Node::new(TEXT_ELEMENT, Some(String::new()))))
    }

    fn set_property(
        &mut self,
        handle: &NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        if is_event(name) || value.as_listener().is_some() {
            return Err(HostError::InvalidProp(name.to_string()));
        }
        let node = self.node_mut(*handle)?;
        match node.text.as_mut() {
            Some(text) if name == TEXT_VALUE => {
                *text = value.to_text();
                node.dirty |= DirtyFlags::TEXT;
            }
            _ => {
                node.props.insert(name.to_string(), value.clone());
                node.dirty |= DirtyFlags::PROPS;
            }
        }
        self.counts.props_set += 1;
        Ok(())
    }

    fn remove_property(&mut self, handle: &NodeId, name: &str) -> Result<(), HostError> {
        let node = self.node_mut(*handle)?;
        match node.text.as_mut() {
            Some(text) if name == TEXT_VALUE => {
                text.clear();
                node.dirty |= DirtyFlags::TEXT;
            }
            _ => {
                node.props.remove(name);
                node.dirty |= DirtyFlags::PROPS;
            }
        }
        self.counts.props_removed += 1;
        Ok(())
    }

    fn add_listener(
        &mut self,
        handle: &NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        let node = self.node_mut(*handle)?;
        node.listeners
            .entry(event.to_string())
            .or_default()
            .push(listener.clone());
        node.dirty |= DirtyFlags::LISTENERS;
        self.counts.listeners_added += 1;
        Ok(())
    }

    fn remove_listener(
        &mut self,
        handle: &NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        let node = self.node_mut(*handle)?;
        if let Some(listeners) = node.listeners.get_mut(event) {
            listeners.retain(|l| !l.ptr_eq(listener));
            if listeners.is_empty() {
                node.listeners.remove(event);
            }
        }
        node.dirty |= DirtyFlags::LISTENERS;
        self.counts.listeners_removed += 1;
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.node(*parent)?;
        self.detach(*child)?;
        let parent_node = self.node_mut(*parent)?;
        parent_node.children.push(*child);
        parent_node.dirty |= DirtyFlags::CHILDREN;
        self.node_mut(*child)?.parent = Some(*parent);
        self.counts.attached += 1;
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        before: &NodeId,
    ) -> Result<(), HostError> {
        if !self.node(*parent)?.children.contains(before) {
            return Err(HostError::NotAChild {
                parent: parent.to_string(),
                child: before.to_string(),
            });
        }
        self.detach(*child)?;
        let parent_node = self.node_mut(*parent)?;
        let position = parent_node
            .children
            .iter()
            .position(|c| c == before)
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(position, *child);
        parent_node.dirty |= DirtyFlags::CHILDREN;
        self.node_mut(*child)?.parent = Some(*parent);
        self.counts.attached += 1;
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        if self.node(*child)?.parent != Some(*parent) {
            return Err(HostError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.detach(*child)?;
        self.release(*child);
        self.counts.detached += 1;
        Ok(())
    }

    fn destroy(&mut self, handle: &NodeId) -> Result<(), HostError> {
        self.detach(*handle)?;
        self.release(*handle);
        self.counts.destroyed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_allocate_and_reuse() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let a = host.create_element("div").unwrap();
        let b = host.create_element("span").unwrap();

        host.append_child(&root, &a).unwrap();
        host.append_child(&root, &b).unwrap();
        assert_eq!(host.children(root), &[a, b]);

        host.remove_child(&root, &a).unwrap();
        assert!(!host.contains(a));

        // Freed index is reused
        let c = host.create_element("p").unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn test_release_is_recursive() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let div = host.create_element("div").unwrap();
        let text = host.create_text().unwrap();
        host.append_child(&div, &text).unwrap();
        host.append_child(&root, &div).unwrap();
        assert_eq!(host.live_count(), 3);

        host.remove_child(&root, &div).unwrap();
        assert_eq!(host.live_count(), 1);
        assert!(!host.contains(text));
    }

    #[test]
    fn test_destroy_unattached() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let span = host.create_element("span").unwrap();
        let text = host.create_text().unwrap();
        assert_eq!(host.live_count(), 3);

        host.destroy(&span).unwrap();
        host.destroy(&text).unwrap();

        assert_eq!(host.live_count(), 1);
        assert!(host.contains(root));
        assert_eq!(host.counts().destroyed, 2);
        assert!(host.destroy(&span).is_err());
    }

    #[test]
    fn test_insert_before() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let a = host.create_element("a").unwrap();
        let b = host.create_element("b").unwrap();
        let c = host.create_element("c").unwrap();

        host.append_child(&root, &a).unwrap();
        host.append_child(&root, &c).unwrap();
        host.insert_before(&root, &b, &c).unwrap();
        assert_eq!(host.children(root), &[a, b, c]);

        let stray = host.create_element("x").unwrap();
        let err = host.insert_before(&root, &stray, &stray).unwrap_err();
        assert!(matches!(err, HostError::NotAChild { .. }));
    }

    #[test]
    fn test_text_value_and_dirty() {
        let mut host = MemoryHost::new();
        let text = host.create_text().unwrap();
        assert_eq!(host.text(text), Some(""));

        host.set_property(&text, TEXT_VALUE, &PropValue::from("hi")).unwrap();
        assert_eq!(host.text(text), Some("hi"));
        assert_eq!(host.take_dirty(text), DirtyFlags::TEXT);
        assert_eq!(host.take_dirty(text), DirtyFlags::empty());
    }

    #[test]
    fn test_listeners_are_not_props() {
        let mut host = MemoryHost::new();
        let button = host.create_element("button").unwrap();
        let listener = Listener::new(|_| {});

        let err = host
            .set_property(&button, "onClick", &PropValue::Listener(listener.clone()))
            .unwrap_err();
        assert_eq!(err, HostError::InvalidProp("onClick".to_string()));

        host.add_listener(&button, "click", &listener).unwrap();
        assert_eq!(host.listener_count(button, "click"), 1);
        host.remove_listener(&button, "click", &listener).unwrap();
        assert_eq!(host.listener_count(button, "click"), 0);
    }

    #[test]
    fn test_dispatch() {
        let mut host = MemoryHost::new();
        let button = host.create_element("button").unwrap();
        let clicks = Rc::new(Cell::new(0));
        let clicks_clone = clicks.clone();
        host.add_listener(&button, "click", &Listener::new(move |_| {
            clicks_clone.set(clicks_clone.get() + 1);
        }))
        .unwrap();

        assert_eq!(host.dispatch(button, &Event::new("click")), 1);
        assert_eq!(host.dispatch(button, &Event::new("keydown")), 0);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_rejects_bad_kinds() {
        let mut host = MemoryHost::new();
        assert!(matches!(host.create_element(""), Err(HostError::UnknownKind(_))));
        assert!(matches!(host.create_element("TEXT"), Err(HostError::UnknownKind(_))));
        assert!(matches!(host.create_element("a b"), Err(HostError::UnknownKind(_))));
    }

    #[test]
    fn test_markup() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let div = host.create_element("div").unwrap();
        let text = host.create_text().unwrap();
        host.set_property(&div, "id", &PropValue::from("a")).unwrap();
        host.set_property(&text, TEXT_VALUE, &PropValue::from("hi")).unwrap();
        host.append_child(&div, &text).unwrap();
        host.append_child(&root, &div).unwrap();

        assert_eq!(host.to_markup(root), "<div id=\"a\">hi</div>");
    }
}
