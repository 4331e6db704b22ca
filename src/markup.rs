//! Declarative element trees.
//!
//! A [`Component`] describes what it renders as a [`VNode`] tree; the
//! container mounts that tree into its document, creating one DOM node per
//! `VNode` and registering the listeners attached with [`VElement::on`].

use std::fmt;
use std::rc::Rc;

use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::events::{Event, Handler, Listener, ListenerStore};

pub trait Component {
    fn view(&self) -> VNode;
}

#[derive(Debug, Clone)]
pub enum VNode {
    Element(VElement),
    Text(String),
}

#[derive(Clone)]
pub struct VElement {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<VNode>,
    listeners: Vec<(String, Handler)>,
}

/// Starts an element description: `el("form").attr("id", "customer")`.
pub fn el(tag: &str) -> VElement {
    VElement::new(tag)
}

impl VElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn child(mut self, node: impl Into<VNode>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(VNode::Text(text.into()))
    }

    pub fn on<F>(mut self, event: &str, handler: F) -> Self
    where
        F: Fn(&mut Event<'_>) -> Result<()> + 'static,
    {
        let handler: Handler = Rc::new(handler);
        self.listeners.push((event.to_string(), handler));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }
}

impl fmt::Debug for VElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<&str> = self.listeners.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("VElement")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("children", &self.children)
            .field("listeners", &events)
            .finish()
    }
}

impl From<VElement> for VNode {
    fn from(element: VElement) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for VNode {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for VNode {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Creates `node` under `parent` and returns the new DOM node.
pub(crate) fn mount(
    dom: &mut Dom,
    listeners: &mut ListenerStore,
    parent: NodeId,
    node: &VNode,
) -> NodeId {
    match node {
        VNode::Text(text) => dom.create_text(parent, text),
        VNode::Element(element) => {
            let id = dom.create_element(parent, &element.tag, element.attrs.clone());
            for (event, handler) in &element.listeners {
                listeners.add(
                    id,
                    event.clone(),
                    Listener {
                        handler: Rc::clone(handler),
                    },
                );
            }
            for child in &element.children {
                mount(dom, listeners, id, child);
            }
            id
        }
    }
}
