//! Customer form component plus a deterministic in-memory DOM harness for
//! rendering it, querying the result and simulating user input.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use customer_form::{CustomerForm, create_container};
//!
//! # fn main() -> customer_form::Result<()> {
//! let submitted = Rc::new(RefCell::new(None));
//! let sink = Rc::clone(&submitted);
//!
//! let mut container = create_container();
//! container.render(
//!     &CustomerForm::new()
//!         .first_name("Ashley")
//!         .on_submit(move |customer| *sink.borrow_mut() = Some(customer.clone())),
//! )?;
//!
//! container.type_text("#lastName", "Jones")?;
//! container.submit_form("form#customer")?;
//!
//! let customer = submitted.borrow().clone().unwrap_or_default();
//! assert_eq!(customer.first_name, "Ashley");
//! assert_eq!(customer.last_name, "Jones");
//! # Ok(())
//! # }
//! ```

mod container;
mod customer_form;
mod dom;
mod error;
mod events;
mod markup;
mod selector;

pub use container::{Container, NodeRef, create_container};
pub use customer_form::{Customer, CustomerForm, FORM_ID, Field, SubmitCallback};
pub use dom::NodeId;
pub use error::{Error, Result};
pub use events::{DispatchOutcome, Event, Handler};
pub use markup::{Component, VElement, VNode, el};

#[cfg(test)]
mod tests;
