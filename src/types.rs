//! Core types for spark-fiber.
//!
//! These are the shapes that flow from the element builder through the
//! reconciler and into the host: node descriptions, prop values, listeners
//! and effect tags.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Reserved names
// =============================================================================

/// Kind of a text node description.
pub const TEXT_ELEMENT: &str = "TEXT";

/// Kind of the fiber that wraps the container handle.
pub const ROOT_KIND: &str = "ROOT";

/// Prop carrying the content of a text node.
pub const TEXT_VALUE: &str = "value";

/// Props starting with this prefix are event listeners, not plain props.
pub const EVENT_PREFIX: &str = "on";

// =============================================================================
// Events and listeners
// =============================================================================

/// Event delivered to a listener.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event name without the prefix (e.g., "click").
    pub name: String,
    /// Optional payload supplied by whoever dispatches the event.
    pub detail: Option<String>,
}

impl Event {
    /// Create an event with no payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: None,
        }
    }

    /// Create an event carrying a payload.
    pub fn with_detail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: Some(detail.into()),
        }
    }
}

/// Shared event callback.
///
/// Two listeners are equal only when they point at the same allocation, so
/// re-rendering with the same `Listener` is a no-op while a freshly built
/// closure is treated as a change.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    /// Wrap a callback.
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Invoke the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

// =============================================================================
// Prop values
// =============================================================================

/// Value of a single prop.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Listener(Listener),
}

impl PropValue {
    /// Render the value as text (listeners render as an empty string).
    pub fn to_text(&self) -> String {
        match self {
            PropValue::Text(s) => s.clone(),
            PropValue::Number(n) => n.to_string(),
            PropValue::Bool(b) => b.to_string(),
            PropValue::Listener(_) => String::new(),
        }
    }

    /// Get the listener, if this value is one.
    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            PropValue::Listener(l) => Some(l),
            _ => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<Listener> for PropValue {
    fn from(value: Listener) -> Self {
        PropValue::Listener(value)
    }
}

/// Prop map. Ordered so that diffs and serialization are deterministic.
pub type Props = BTreeMap<String, PropValue>;

/// Check whether a prop name denotes an event listener.
#[inline]
pub fn is_event(name: &str) -> bool {
    name.len() > EVENT_PREFIX.len() && name.starts_with(EVENT_PREFIX)
}

/// Event name for a listener prop: `onClick` -> `click`.
pub fn event_name(name: &str) -> Option<String> {
    if !is_event(name) {
        return None;
    }
    Some(name[EVENT_PREFIX.len()..].to_lowercase())
}

// =============================================================================
// Node descriptions
// =============================================================================

/// Immutable description of one node of UI.
///
/// Text nodes use kind [`TEXT_ELEMENT`] with a single [`TEXT_VALUE`] prop.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub kind: String,
    pub props: Props,
    pub children: Vec<Rc<Element>>,
}

impl Element {
    /// Check if this describes a text node.
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == TEXT_ELEMENT
    }

    /// Description held by the root fiber: the container with `child` as its
    /// only child.
    pub(crate) fn root(child: Rc<Element>) -> Self {
        Self {
            kind: ROOT_KIND.to_string(),
            props: Props::new(),
            children: vec![child],
        }
    }
}

// =============================================================================
// Effects
// =============================================================================

/// What the commit phase must do with a fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// Attach a freshly created handle.
    Create,
    /// Repaint a reused handle's props and listeners.
    Update,
    /// Detach the handle from its parent.
    Remove,
}
