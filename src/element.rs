//! Element builder - turns author input into node descriptions.
//!
//! Pure and stateless: nothing here touches a host or a fiber.
//!
//! # Example
//!
//! ```
//! use spark_fiber::{create_element, props};
//!
//! let tree = create_element("div", props! { "id" => "a" }, ["hi"]);
//! assert_eq!(tree.children[0].kind, "TEXT");
//!
//! let same = spark_fiber::Element::new("div").prop("id", "a").child("hi");
//! assert_eq!(tree, same);
//! ```

use std::rc::Rc;

use crate::types::{EVENT_PREFIX, Element, Listener, PropValue, Props, TEXT_ELEMENT, TEXT_VALUE};

// =============================================================================
// Children
// =============================================================================

/// Anything that can sit in a children list.
///
/// Primitives become text descriptions.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Element(Rc<Element>),
    Text(String),
}

impl Child {
    /// Normalize into a description.
    pub fn into_element(self) -> Rc<Element> {
        match self {
            Child::Element(element) => element,
            Child::Text(text) => Rc::new(text_element(text)),
        }
    }
}

impl From<Element> for Child {
    fn from(value: Element) -> Self {
        Child::Element(Rc::new(value))
    }
}

impl From<Rc<Element>> for Child {
    fn from(value: Rc<Element>) -> Self {
        Child::Element(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(value.to_string())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Text(value)
    }
}

macro_rules! child_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(value.to_string())
                }
            }
        )*
    };
}

child_from_display!(i32, i64, u32, u64, usize, f64, bool, char);

// =============================================================================
// Builders
// =============================================================================

/// Create a node description.
///
/// `props` may be `None` for an element with no props. Primitive children
/// are wrapped into [`TEXT_ELEMENT`] descriptions.
pub fn create_element<I, C>(kind: impl Into<String>, props: Option<Props>, children: I) -> Element
where
    I: IntoIterator<Item = C>,
    C: Into<Child>,
{
    Element {
        kind: kind.into(),
        props: props.unwrap_or_default(),
        children: children
            .into_iter()
            .map(|child| child.into().into_element())
            .collect(),
    }
}

/// Create a text description.
pub fn text_element(value: impl Into<String>) -> Element {
    let mut props = Props::new();
    props.insert(TEXT_VALUE.to_string(), PropValue::Text(value.into()));
    Element {
        kind: TEXT_ELEMENT.to_string(),
        props,
        children: Vec::new(),
    }
}

impl Element {
    /// Start a description with no props and no children.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: Props::new(),
            children: Vec::new(),
        }
    }

    /// Add or replace a prop.
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Register a listener: `on("click", ..)` stores the `onClick` prop.
    pub fn on(mut self, event: &str, listener: Listener) -> Self {
        let mut chars = event.chars();
        let name = match chars.next() {
            Some(first) => format!("{EVENT_PREFIX}{}{}", first.to_uppercase(), chars.as_str()),
            None => EVENT_PREFIX.to_string(),
        };
        self.props.insert(name, PropValue::Listener(listener));
        self
    }

    /// Append a child.
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into().into_element());
        self
    }

    /// Append several children.
    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        self.children
            .extend(children.into_iter().map(|child| child.into().into_element()));
        self
    }
}

/// Build an `Option<Props>` for [`create_element`].
///
/// ```
/// use spark_fiber::props;
///
/// let p = props! { "id" => "a", "tabIndex" => 2 };
/// assert_eq!(p.unwrap().len(), 2);
/// assert!(props! {}.is_none());
/// ```
#[macro_export]
macro_rules! props {
    () => {
        ::core::option::Option::None::<$crate::Props>
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut props = $crate::Props::new();
        $(
            props.insert(::std::string::String::from($name), $crate::PropValue::from($value));
        )+
        ::core::option::Option::Some(props)
    }};
}
