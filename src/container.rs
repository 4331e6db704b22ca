use std::collections::VecDeque;

use tracing::debug;

use crate::customer_form::FORM_ID;
use crate::dom::{Dom, NodeId, truncate_chars};
use crate::error::{Error, Result};
use crate::events::{DispatchOutcome, ListenerStore, dispatch};
use crate::markup::{Component, VNode, mount};
use crate::selector::quote_attr_value;

/// Builds a fresh document with an empty container `div` in its body.
pub fn create_container() -> Container {
    Container::new()
}

/// An isolated DOM subtree that components render into.
///
/// Each container owns its own document, so containers never observe each
/// other. All queries are scoped to the container's descendants.
pub struct Container {
    dom: Dom,
    root: NodeId,
    listeners: ListenerStore,
    render_count: usize,
    trace: bool,
    trace_to_tracing: bool,
    trace_logs: VecDeque<String>,
    trace_log_limit: usize,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        let mut dom = Dom::new();
        let body = dom.body();
        let root = dom.create_element(body, "div", Vec::new());
        Self {
            dom,
            root,
            listeners: ListenerStore::default(),
            render_count: 0,
            trace: false,
            trace_to_tracing: true,
            trace_logs: VecDeque::new(),
            trace_log_limit: 10_000,
        }
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_to_tracing(&mut self, enabled: bool) {
        self.trace_to_tracing = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidConfig(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.pop_front();
        }
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_logs.drain(..).collect()
    }

    /// Replaces the container content with `component`'s tree.
    ///
    /// The previous tree is detached but its nodes stay allocated until the
    /// container is dropped, so each render grows the container's memory by
    /// one full tree. Use a fresh container per test rather than
    /// re-rendering one in an unbounded loop.
    pub fn render(&mut self, component: &impl Component) -> Result<()> {
        self.render_node(component.view())
    }

    pub fn render_node(&mut self, node: VNode) -> Result<()> {
        self.clear();
        let mounted = mount(&mut self.dom, &mut self.listeners, self.root, &node);
        self.render_count += 1;
        if self.trace {
            let line = format!(
                "[render] #{} root={}",
                self.render_count,
                self.node_label(mounted)
            );
            self.trace_line(line);
        }
        Ok(())
    }

    /// Removes everything rendered so far.
    pub fn unmount(&mut self) {
        self.clear();
        if self.trace {
            self.trace_line("[render] unmount".into());
        }
    }

    fn clear(&mut self) {
        for node in self.dom.detach_children(self.root) {
            self.listeners.remove_node(node);
        }
    }

    pub fn render_count(&self) -> usize {
        self.render_count
    }

    /// The container element itself.
    pub fn container(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    pub fn node(&self, node_id: NodeId) -> NodeRef<'_> {
        NodeRef {
            dom: &self.dom,
            node_id,
        }
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeRef<'_>>> {
        Ok(self
            .dom
            .query_selector_from(self.root, selector)?
            .map(|id| self.node(id)))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeRef<'_>>> {
        Ok(self
            .dom
            .query_selector_all_from(self.root, selector)?
            .into_iter()
            .map(|id| self.node(id))
            .collect())
    }

    /// `form[id="<id>"]`.
    pub fn form(&self, id: &str) -> Result<Option<NodeRef<'_>>> {
        self.query_selector(&format!("form[id={}]", quote_attr_value(id)))
    }

    /// `label[for="<name>"]`.
    pub fn label_for(&self, name: &str) -> Result<Option<NodeRef<'_>>> {
        self.query_selector(&format!("label[for={}]", quote_attr_value(name)))
    }

    /// `form("customer").elements[name]`.
    pub fn field(&self, name: &str) -> Result<Option<NodeRef<'_>>> {
        self.form_control(FORM_ID, name)
    }

    pub fn form_control(&self, form_id: &str, name: &str) -> Result<Option<NodeRef<'_>>> {
        match self.form(form_id)? {
            Some(form) => form.named_element(name),
            None => Ok(None),
        }
    }

    /// Required lookup: fails with `SelectorNotFound` when nothing matches.
    pub fn get(&self, selector: &str) -> Result<NodeRef<'_>> {
        self.query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    /// Sets the control's current value and fires `change` on it.
    ///
    /// Detached nodes and non-control elements are rejected before the
    /// value is touched.
    pub fn change(&mut self, node_id: NodeId, value: &str) -> Result<DispatchOutcome> {
        self.ensure_connected(node_id, "change")?;
        if !self.dom.is_form_control(node_id) {
            return Err(Error::TypeMismatch {
                selector: self.node_label(node_id),
                expected: "form control".into(),
                actual: self.dom.tag_name(node_id).unwrap_or("#text").to_string(),
            });
        }
        self.dom.set_value(node_id, value)?;
        self.dispatch_event(node_id, "change")
    }

    /// Fires `submit` on the node's form. Nodes outside a form are ignored.
    pub fn submit(&mut self, node_id: NodeId) -> Result<DispatchOutcome> {
        match self.dom.form_owner(node_id) {
            Some(form) => self.dispatch_event(form, "submit"),
            None => Ok(DispatchOutcome::default()),
        }
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.get(selector)?.node_id();
        let tag = self.dom.tag_name(target).unwrap_or_default().to_string();
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        self.dispatch_event(target, "change")?;
        Ok(())
    }

    pub fn submit_form(&mut self, selector: &str) -> Result<DispatchOutcome> {
        let target = self.get(selector)?.node_id();
        self.submit(target)
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.get(selector)?;
        Ok(())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.get(selector)?;
        let actual = target.text_content();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: target.snippet(),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.get(selector)?;
        let actual = target.value();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: target.snippet(),
            });
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        Ok(self.get(selector)?.outer_html())
    }

    /// Serialized container content.
    pub fn inner_html(&self) -> String {
        self.dom
            .children(self.root)
            .iter()
            .map(|child| self.dom.dump_node(*child))
            .collect()
    }

    fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<DispatchOutcome> {
        self.ensure_connected(target, event_type)?;

        let (state, invoked) = dispatch(&self.dom, &self.listeners, target, event_type)?;
        if self.trace {
            let line = format!(
                "[event] {} target={} listeners={} default_prevented={} propagation_stopped={}",
                state.event_type,
                self.node_label(state.target),
                invoked,
                state.default_prevented,
                state.propagation_stopped
            );
            self.trace_line(line);
        }

        Ok(DispatchOutcome {
            default_prevented: state.default_prevented,
            propagation_stopped: state.propagation_stopped,
            listeners_invoked: invoked,
        })
    }

    fn ensure_connected(&self, target: NodeId, event_type: &str) -> Result<()> {
        if self.dom.is_connected(target) {
            return Ok(());
        }
        Err(Error::Dom(format!(
            "{event_type} target {} is detached",
            self.node_label(target)
        )))
    }

    fn node_label(&self, node_id: NodeId) -> String {
        let Some(tag) = self.dom.tag_name(node_id) else {
            return "#text".into();
        };
        match self.dom.attr(node_id, "id") {
            Some(id) if !id.is_empty() => format!("{tag}#{id}"),
            _ => tag.to_string(),
        }
    }

    fn trace_line(&mut self, line: String) {
        if !self.trace {
            return;
        }
        if self.trace_to_tracing {
            debug!(target: "customer_form", "{line}");
        }
        if self.trace_logs.len() >= self.trace_log_limit {
            self.trace_logs.pop_front();
        }
        self.trace_logs.push_back(line);
    }
}

/// Read-only view of a node inside a [`Container`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    dom: &'a Dom,
    node_id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Uppercase tag name, as DOM `tagName` reports it. Empty for text.
    pub fn tag_name(&self) -> String {
        self.dom
            .tag_name(self.node_id)
            .map(|tag| tag.to_ascii_uppercase())
            .unwrap_or_default()
    }

    /// The `id` attribute, or an empty string.
    pub fn id(&self) -> String {
        self.attr("id").unwrap_or_default()
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.dom.attr(self.node_id, name)
    }

    /// The `for` attribute of a label, or an empty string.
    pub fn html_for(&self) -> String {
        self.attr("for").unwrap_or_default()
    }

    /// Input type as DOM `type` reports it; inputs default to `text`.
    pub fn input_type(&self) -> String {
        match self.attr("type") {
            Some(kind) => kind.to_ascii_lowercase(),
            None if self.dom.is_tag(self.node_id, "input") => "text".into(),
            None => String::new(),
        }
    }

    /// Current value of a form control; empty for other nodes.
    pub fn value(&self) -> String {
        self.dom.value(self.node_id).unwrap_or_default()
    }

    pub fn text_content(&self) -> String {
        self.dom.text_content(self.node_id)
    }

    pub fn outer_html(&self) -> String {
        self.dom.dump_node(self.node_id)
    }

    pub fn is_connected(&self) -> bool {
        self.dom.is_connected(self.node_id)
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeRef<'a>>> {
        Ok(self
            .dom
            .query_selector_from(self.node_id, selector)?
            .map(|id| self.with_id(id)))
    }

    /// Controls of this form, in tree order.
    pub fn elements(&self) -> Result<Vec<NodeRef<'a>>> {
        Ok(self
            .dom
            .form_elements(self.node_id)?
            .into_iter()
            .map(|id| self.with_id(id))
            .collect())
    }

    /// `form.elements[name]`, matching on `id` or `name`.
    pub fn named_element(&self, name: &str) -> Result<Option<NodeRef<'a>>> {
        Ok(self
            .dom
            .named_form_control(self.node_id, name)?
            .map(|id| self.with_id(id)))
    }

    fn with_id(&self, node_id: NodeId) -> NodeRef<'a> {
        NodeRef {
            dom: self.dom,
            node_id,
        }
    }

    fn snippet(&self) -> String {
        truncate_chars(&self.outer_html(), 200)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("node_id", &self.node_id)
            .field("html", &self.snippet())
            .finish()
    }
}
