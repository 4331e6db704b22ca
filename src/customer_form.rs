use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::Result;
use crate::events::Event;
use crate::markup::{Component, VElement, VNode, el};

pub const FORM_ID: &str = "customer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
}

impl Field {
    /// Fields in render order.
    pub const ALL: [Field; 2] = [Field::FirstName, Field::LastName];

    /// Rendered as both the input `id` and the label `for`.
    pub fn name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values reported on submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
}

impl Customer {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
        };
        *slot = value.into();
    }

    /// `(field name, value)` pairs keyed the way the form names its inputs.
    pub fn entries(&self) -> [(&'static str, &str); 2] {
        Field::ALL.map(|field| (field.name(), self.get(field)))
    }
}

pub type SubmitCallback = Rc<dyn Fn(&Customer)>;

/// Two-field customer form.
///
/// Renders `form#customer` with a label and a text input per [`Field`]. On
/// submit it prevents the default action, reads the inputs' current values
/// and passes them to the `on_submit` callback, if any.
#[derive(Clone, Default)]
pub struct CustomerForm {
    first_name: Option<String>,
    last_name: Option<String>,
    on_submit: Option<SubmitCallback>,
}

impl CustomerForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(self, value: impl Into<String>) -> Self {
        self.with_value(Field::FirstName, value)
    }

    pub fn last_name(self, value: impl Into<String>) -> Self {
        self.with_value(Field::LastName, value)
    }

    pub fn with_value(mut self, field: Field, value: impl Into<String>) -> Self {
        let slot = match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
        };
        *slot = Some(value.into());
        self
    }

    pub fn on_submit<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Customer) + 'static,
    {
        let callback: SubmitCallback = Rc::new(callback);
        self.on_submit = Some(callback);
        self
    }

    pub fn initial_value(&self, field: Field) -> &str {
        let value = match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
        };
        value.as_deref().unwrap_or_default()
    }

    fn field_view(&self, field: Field) -> [VElement; 2] {
        [
            el("label").attr("for", field.name()).text(field.label()),
            el("input")
                .attr("type", "text")
                .attr("name", field.name())
                .attr("id", field.name())
                .attr("value", self.initial_value(field)),
        ]
    }
}

impl fmt::Debug for CustomerForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomerForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("on_submit", &self.on_submit.is_some())
            .finish()
    }
}

impl Component for CustomerForm {
    fn view(&self) -> VNode {
        let on_submit = self.on_submit.clone();
        let mut form = el("form")
            .attr("id", FORM_ID)
            .on("submit", move |event| handle_submit(event, on_submit.as_deref()));
        for field in Field::ALL {
            for node in self.field_view(field) {
                form = form.child(node);
            }
        }
        form.into()
    }
}

fn handle_submit(event: &mut Event<'_>, on_submit: Option<&dyn Fn(&Customer)>) -> Result<()> {
    event.prevent_default();
    let form = event.owner_form()?;

    let mut customer = Customer::default();
    for field in Field::ALL {
        let value = event.form_value(form, field.name())?.unwrap_or_default();
        customer.set(field, value);
    }
    debug!(target: "customer_form", ?customer, "customer form submitted");

    if let Some(callback) = on_submit {
        callback(&customer);
    }
    Ok(())
}
