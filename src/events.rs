use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};

/// Listener callback. Listeners see the document read-only and report
/// failures through the returned `Result`, which aborts the dispatch.
pub type Handler = Rc<dyn Fn(&mut Event<'_>) -> Result<()>>;

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) handler: Handler,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: String, listener: Listener) {
        self.map
            .entry(node_id)
            .or_default()
            .entry(event)
            .or_default()
            .push(listener);
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn remove_node(&mut self, node_id: NodeId) {
        self.map.remove(&node_id);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.map.values().flat_map(|events| events.values()).map(Vec::len).sum()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventState {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) default_prevented: bool,
    pub(crate) propagation_stopped: bool,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            default_prevented: false,
            propagation_stopped: false,
        }
    }
}

/// What a listener sees while an event is being dispatched.
pub struct Event<'a> {
    pub(crate) dom: &'a Dom,
    pub(crate) state: &'a mut EventState,
}

impl Event<'_> {
    pub fn event_type(&self) -> &str {
        &self.state.event_type
    }

    pub fn target(&self) -> NodeId {
        self.state.target
    }

    pub fn current_target(&self) -> NodeId {
        self.state.current_target
    }

    pub fn prevent_default(&mut self) {
        self.state.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.state.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.state.propagation_stopped = true;
    }

    /// Current value of a form control.
    pub fn value_of(&self, node_id: NodeId) -> Result<String> {
        self.dom.value(node_id)
    }

    /// Current value of `form.elements[name]`, or `None` when the form has
    /// no such control.
    pub fn form_value(&self, form: NodeId, name: &str) -> Result<Option<String>> {
        match self.dom.named_form_control(form, name)? {
            Some(control) => self.dom.value(control).map(Some),
            None => Ok(None),
        }
    }

    /// The form owning the current target.
    pub fn owner_form(&self) -> Result<NodeId> {
        self.dom
            .form_owner(self.state.current_target)
            .ok_or_else(|| Error::Dom(format!("{} target has no form", self.state.event_type)))
    }
}

/// Result of a simulated event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub listeners_invoked: usize,
}

/// Runs target-phase listeners, then bubbles up to the document.
pub(crate) fn dispatch(
    dom: &Dom,
    listeners: &ListenerStore,
    target: NodeId,
    event_type: &str,
) -> Result<(EventState, usize)> {
    let mut state = EventState::new(event_type, target);
    let mut invoked = 0usize;

    let mut cursor = Some(target);
    while let Some(node) = cursor {
        state.current_target = node;
        for listener in listeners.get(node, event_type) {
            let mut event = Event {
                dom,
                state: &mut state,
            };
            (listener.handler)(&mut event)?;
            invoked += 1;
        }
        if state.propagation_stopped {
            break;
        }
        cursor = dom.parent(node);
    }

    Ok((state, invoked))
}
