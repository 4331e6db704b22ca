use std::cell::RefCell;
use std::rc::Rc;

use super::*;

fn required<'a>(node: Option<NodeRef<'a>>, what: &str) -> Result<NodeRef<'a>> {
    node.ok_or_else(|| Error::SelectorNotFound(what.to_string()))
}

fn form<'a>(container: &'a Container, id: &str) -> Result<NodeRef<'a>> {
    required(container.form(id)?, id)
}

fn field<'a>(container: &'a Container, name: &str) -> Result<NodeRef<'a>> {
    required(container.field(name)?, name)
}

fn label_for<'a>(container: &'a Container, name: &str) -> Result<NodeRef<'a>> {
    required(container.label_for(name)?, name)
}

type Submissions = Rc<RefCell<Vec<Customer>>>;

fn recording_form(props: CustomerForm) -> (CustomerForm, Submissions) {
    let submissions: Submissions = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&submissions);
    let form = props.on_submit(move |customer| sink.borrow_mut().push(customer.clone()));
    (form, submissions)
}

fn expect_to_be_input_field_of_type_text(node: NodeRef<'_>) {
    assert_eq!(node.tag_name(), "INPUT");
    assert_eq!(node.input_type(), "text");
}

fn renders_as_text_box(field_name: &str) -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    expect_to_be_input_field_of_type_text(field(&c, field_name)?);
    Ok(())
}

fn includes_existing_value(field: Field) -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new().with_value(field, "value"))?;
    assert_eq!(self::field(&c, field.name())?.value(), "value");
    Ok(())
}

fn renders_a_label(field_name: &str, text: &str) -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    assert_eq!(label_for(&c, field_name)?.text_content(), text);
    Ok(())
}

fn assigns_an_id_that_matches_the_label_id(field_name: &str) -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    assert_eq!(field(&c, field_name)?.id(), field_name);
    assert_eq!(label_for(&c, field_name)?.html_for(), field_name);
    Ok(())
}

fn saves_existing_value_when_submitted(field: Field, value: &str) -> Result<()> {
    let (props, submissions) = recording_form(CustomerForm::new().with_value(field, value));
    let mut c = create_container();
    c.render(&props)?;

    let form_id = form(&c, FORM_ID)?.node_id();
    c.submit(form_id)?;

    let submissions = submissions.borrow();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].get(field), value);
    Ok(())
}

fn saves_new_value_when_submitted(field: Field, value: &str) -> Result<()> {
    let (props, submissions) =
        recording_form(CustomerForm::new().with_value(field, "existingValue"));
    let mut c = create_container();
    c.render(&props)?;

    let input = self::field(&c, field.name())?.node_id();
    c.change(input, value)?;
    let form_id = form(&c, FORM_ID)?.node_id();
    c.submit(form_id)?;

    let submissions = submissions.borrow();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].get(field), value);
    Ok(())
}

macro_rules! field_suite {
    ($module:ident, $field:expr, $label:expr) => {
        mod $module {
            use super::*;

            #[test]
            fn renders_the_field_as_a_text_box() -> Result<()> {
                renders_as_text_box($field.name())
            }

            #[test]
            fn includes_the_existing_value() -> Result<()> {
                includes_existing_value($field)
            }

            #[test]
            fn renders_a_label_for_the_field() -> Result<()> {
                renders_a_label($field.name(), $label)
            }

            #[test]
            fn assigns_an_id_that_matches_the_label_id() -> Result<()> {
                super::assigns_an_id_that_matches_the_label_id($field.name())
            }

            #[test]
            fn saves_existing_value_when_submitted() -> Result<()> {
                super::saves_existing_value_when_submitted($field, "value")
            }

            #[test]
            fn saves_new_value_when_submitted() -> Result<()> {
                super::saves_new_value_when_submitted($field, "newValue")
            }
        }
    };
}

field_suite!(first_name_field, Field::FirstName, "First name");
field_suite!(last_name_field, Field::LastName, "Last name");

#[test]
fn renders_a_form() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    assert!(c.form(FORM_ID)?.is_some());
    assert!(c.form("supplier")?.is_none());
    Ok(())
}

#[test]
fn submits_both_fields_together() -> Result<()> {
    let (props, submissions) =
        recording_form(CustomerForm::new().first_name("Ashley").last_name("Jones"));
    let mut c = create_container();
    c.render(&props)?;

    c.type_text("#lastName", "Smith")?;
    let outcome = c.submit_form("form#customer")?;
    assert!(outcome.default_prevented);
    assert_eq!(outcome.listeners_invoked, 1);

    assert_eq!(
        *submissions.borrow(),
        vec![Customer {
            first_name: "Ashley".into(),
            last_name: "Smith".into(),
        }]
    );
    Ok(())
}

#[test]
fn every_submit_reads_fresh_values() -> Result<()> {
    let (props, submissions) = recording_form(CustomerForm::new().first_name("A"));
    let mut c = create_container();
    c.render(&props)?;

    c.submit_form("#customer")?;
    c.type_text("#firstName", "B")?;
    c.submit_form("#firstName")?;

    let names: Vec<String> = submissions
        .borrow()
        .iter()
        .map(|customer| customer.first_name.clone())
        .collect();
    assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    Ok(())
}

#[test]
fn submit_without_callback_still_prevents_default() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new().first_name("Ashley"))?;
    let outcome = c.submit_form("form")?;
    assert!(outcome.default_prevented);
    Ok(())
}

#[test]
fn submitting_outside_a_form_is_a_no_op() -> Result<()> {
    let mut c = create_container();
    c.render_node(el("div").child(el("input").attr("id", "loose")).into())?;
    let outcome = c.submit_form("#loose")?;
    assert_eq!(outcome, DispatchOutcome::default());
    Ok(())
}

#[test]
fn change_event_does_not_submit() -> Result<()> {
    let (props, submissions) = recording_form(CustomerForm::new());
    let mut c = create_container();
    c.render(&props)?;
    let input = field(&c, "firstName")?.node_id();
    let outcome = c.change(input, "typed")?;
    assert_eq!(outcome.listeners_invoked, 0);
    assert!(submissions.borrow().is_empty());
    c.assert_value("#firstName", "typed")?;
    Ok(())
}

#[test]
fn empty_props_render_empty_values() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    for f in Field::ALL {
        assert_eq!(field(&c, f.name())?.value(), "");
    }
    Ok(())
}

#[test]
fn rendering_twice_yields_equivalent_dom() -> Result<()> {
    let props = CustomerForm::new().first_name("Ashley").last_name("Jones");
    let mut c = create_container();
    c.render(&props)?;
    let first = c.inner_html();
    c.render(&props)?;
    let second = c.inner_html();

    assert_eq!(first, second);
    assert_eq!(c.render_count(), 2);
    assert_eq!(c.query_selector_all("form")?.len(), 1);
    assert_eq!(c.query_selector_all("input")?.len(), 2);
    Ok(())
}

#[test]
fn rerender_drops_previous_listeners() -> Result<()> {
    let (first, first_submissions) = recording_form(CustomerForm::new().first_name("one"));
    let (second, second_submissions) = recording_form(CustomerForm::new().first_name("two"));
    let mut c = create_container();
    c.render(&first)?;
    let stale_form = form(&c, FORM_ID)?.node_id();
    c.render(&second)?;

    c.submit_form("#customer")?;
    assert!(first_submissions.borrow().is_empty());
    assert_eq!(second_submissions.borrow().len(), 1);

    assert!(!c.node(stale_form).is_connected());
    assert!(matches!(c.submit(stale_form), Err(Error::Dom(_))));
    Ok(())
}

#[test]
fn change_on_detached_node_leaves_value_untouched() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new().first_name("one"))?;
    let stale = field(&c, "firstName")?.node_id();
    c.render(&CustomerForm::new().first_name("two"))?;

    assert!(matches!(c.change(stale, "edited"), Err(Error::Dom(_))));
    assert_eq!(c.node(stale).value(), "one");
    assert_eq!(field(&c, "firstName")?.value(), "two");
    Ok(())
}

#[test]
fn change_rejects_non_form_controls() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    let label = label_for(&c, "firstName")?.node_id();
    let form_node = form(&c, FORM_ID)?.node_id();

    let err = c.change(label, "edited").err();
    assert_eq!(
        err,
        Some(Error::TypeMismatch {
            selector: "label".into(),
            expected: "form control".into(),
            actual: "label".into(),
        })
    );
    assert!(matches!(
        c.change(form_node, "edited"),
        Err(Error::TypeMismatch { .. })
    ));
    assert_eq!(c.node(label).value(), "");
    assert_eq!(c.node(form_node).value(), "");
    Ok(())
}

#[test]
fn rendered_markup_matches_contract() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new().first_name("Ashley"))?;
    assert_eq!(
        c.inner_html(),
        concat!(
            "<form id=\"customer\">",
            "<label for=\"firstName\">First name</label>",
            "<input type=\"text\" name=\"firstName\" id=\"firstName\" value=\"Ashley\">",
            "<label for=\"lastName\">Last name</label>",
            "<input type=\"text\" name=\"lastName\" id=\"lastName\" value=\"\">",
            "</form>"
        )
    );
    Ok(())
}

#[test]
fn form_elements_lists_both_inputs() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    let ids: Vec<String> = form(&c, FORM_ID)?
        .elements()?
        .iter()
        .map(NodeRef::id)
        .collect();
    assert_eq!(ids, vec!["firstName".to_string(), "lastName".to_string()]);
    Ok(())
}

#[test]
fn queries_are_null_before_render_and_after_unmount() -> Result<()> {
    let mut c = create_container();
    assert!(c.form(FORM_ID)?.is_none());
    assert!(c.field("firstName")?.is_none());
    assert!(c.label_for("firstName")?.is_none());

    c.render(&CustomerForm::new())?;
    c.unmount();
    assert!(c.form(FORM_ID)?.is_none());
    assert_eq!(c.inner_html(), "");
    assert_eq!(c.container().tag_name(), "DIV");
    Ok(())
}

#[test]
fn containers_are_isolated() -> Result<()> {
    let mut a = create_container();
    let b = create_container();
    a.render(&CustomerForm::new())?;
    assert!(a.form(FORM_ID)?.is_some());
    assert!(b.form(FORM_ID)?.is_none());
    Ok(())
}

#[test]
fn label_and_field_lookups_quote_their_argument() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    assert!(c.label_for("first\"Name")?.is_none());
    assert!(c.field("nope")?.is_none());
    Ok(())
}

#[test]
fn assertion_helpers_report_mismatches() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new().first_name("Ashley"))?;
    c.assert_exists("#customer")?;
    c.assert_text("label[for=firstName]", "First name")?;
    c.assert_value("#firstName", "Ashley")?;

    match c.assert_value("#firstName", "Jamie") {
        Err(Error::AssertionFailed {
            expected,
            actual,
            dom_snippet,
            ..
        }) => {
            assert_eq!(expected, "Jamie");
            assert_eq!(actual, "Ashley");
            assert!(dom_snippet.starts_with("<input"));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    assert_eq!(
        c.assert_exists("#missing"),
        Err(Error::SelectorNotFound("#missing".into()))
    );
    Ok(())
}

#[test]
fn type_text_rejects_non_text_controls() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    assert!(matches!(
        c.type_text("label[for=firstName]", "x"),
        Err(Error::TypeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn malformed_selectors_are_reported() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    assert!(matches!(
        c.query_selector("form["),
        Err(Error::UnsupportedSelector(_))
    ));
    Ok(())
}

#[test]
fn dump_dom_serializes_the_matched_node() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    assert_eq!(
        c.dump_dom("label[for=lastName]")?,
        "<label for=\"lastName\">Last name</label>"
    );
    Ok(())
}

#[test]
fn trace_records_renders_and_events() -> Result<()> {
    let mut c = create_container();
    c.enable_trace(true);
    c.set_trace_to_tracing(false);
    c.render(&CustomerForm::new())?;
    c.submit_form("#customer")?;

    let logs = c.take_trace_logs();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0], "[render] #1 root=form#customer");
    assert_eq!(
        logs[1],
        "[event] submit target=form#customer listeners=1 default_prevented=true propagation_stopped=false"
    );
    assert!(c.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn trace_log_limit_keeps_newest_lines() -> Result<()> {
    let mut c = create_container();
    c.enable_trace(true);
    c.set_trace_to_tracing(false);
    c.render(&CustomerForm::new())?;
    c.render(&CustomerForm::new())?;
    c.render(&CustomerForm::new())?;
    c.set_trace_log_limit(1)?;

    assert_eq!(c.take_trace_logs(), vec!["[render] #3 root=form#customer"]);
    assert!(matches!(
        c.set_trace_log_limit(0),
        Err(Error::InvalidConfig(_))
    ));
    Ok(())
}

#[test]
fn trace_is_off_by_default() -> Result<()> {
    let mut c = create_container();
    c.render(&CustomerForm::new())?;
    assert!(c.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn custom_components_get_listeners() -> Result<()> {
    struct Counter(Rc<RefCell<usize>>);

    impl Component for Counter {
        fn view(&self) -> VNode {
            let hits = Rc::clone(&self.0);
            el("form")
                .attr("id", "counter")
                .on("change", move |_| {
                    *hits.borrow_mut() += 1;
                    Ok(())
                })
                .child(el("input").attr("id", "n"))
                .into()
        }
    }

    let hits = Rc::new(RefCell::new(0));
    let mut c = create_container();
    c.render(&Counter(Rc::clone(&hits)))?;
    c.type_text("#n", "1")?;
    c.type_text("#n", "2")?;
    assert_eq!(*hits.borrow(), 2);
    assert!(c.form_control("counter", "n")?.is_some());
    Ok(())
}
