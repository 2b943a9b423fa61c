//! Validation feedback driven by bound, buffered edits.

use std::cell::RefCell;
use std::rc::Rc;

use bindery_core::access::PropertyAccessStrategy;
use bindery_core::buffer::{BufferedValueCell, CommitTrigger};
use bindery_core::domain::Bean;
use bindery_core::reactive::ValueCellExt;
use bindery_core::value::Value;
use bindery_validation::{
    MessageSink, Severity, ValidationMessage, ValidationResultsAggregator, ValidationResultsModel,
};

fn validate_age(model: &ValidationResultsModel, value: &Value, ts: u64) {
    let messages = match value.as_int() {
        Some(age) if age < 0 => vec![ValidationMessage::at(
            "age",
            Severity::Error,
            "age must not be negative",
            ts,
        )],
        Some(age) if age > 120 => vec![ValidationMessage::at(
            "age",
            Severity::Warning,
            "age looks unlikely",
            ts,
        )],
        _ => Vec::new(),
    };
    model.replace_messages_for("age", messages);
}

#[test]
fn buffered_edits_drive_the_message_area() {
    let bean = Bean::builder("Person").property("age", 30).build();
    let strategy = PropertyAccessStrategy::new(bean.clone());
    let trigger = CommitTrigger::new();
    let age = BufferedValueCell::new(strategy.get_value_cell("age").unwrap(), Some(trigger.clone()));

    let model = ValidationResultsModel::new();
    let shown = Rc::new(RefCell::new(Vec::new()));
    let shown_clone = Rc::clone(&shown);
    let sink: Rc<dyn MessageSink> = Rc::new(move |m: Option<&ValidationMessage>| {
        shown_clone.borrow_mut().push(m.map(|m| m.severity));
    });
    let aggregator = ValidationResultsAggregator::with_sink(model.clone(), sink);

    let validator_model = Rc::clone(&model);
    let _validator = age.on_change(move |change| validate_age(&validator_model, &change.new, 1));

    age.set(-1).unwrap();
    assert_eq!(
        aggregator.active_message().map(|m| m.severity),
        Some(Severity::Error)
    );

    age.set(130).unwrap();
    assert_eq!(
        aggregator.active_message().map(|m| m.severity),
        Some(Severity::Warning)
    );

    age.set(40).unwrap();
    assert_eq!(aggregator.active_message(), None);
    trigger.commit().unwrap();
    assert_eq!(bean.peek("age"), Some(Value::from(40)));

    assert_eq!(
        *shown.borrow(),
        vec![None, Some(Severity::Error), Some(Severity::Warning), None]
    );
}

#[test]
fn section_models_feed_one_form_aggregator() {
    let form = ValidationResultsModel::new();
    let address = ValidationResultsModel::new();
    let contact = ValidationResultsModel::new();
    assert!(form.add_child(&address));
    assert!(form.add_child(&contact));
    let aggregator = ValidationResultsAggregator::new(form.clone());

    contact.add_message(ValidationMessage::at("email", Severity::Warning, "no domain", 5));
    address.add_message(ValidationMessage::at("city", Severity::Warning, "unknown", 3));
    assert_eq!(
        aggregator.active_message().map(|m| m.property),
        Some("email".to_string())
    );

    address.add_message(ValidationMessage::at("zip", Severity::Error, "required", 1));
    assert_eq!(
        aggregator.active_message().map(|m| m.property),
        Some("zip".to_string())
    );

    assert!(form.remove_child(&address));
    assert_eq!(
        aggregator.active_message().map(|m| m.property),
        Some("email".to_string())
    );
    assert_eq!(form.message_count(), 1);
}

#[test]
fn swapping_sinks_pushes_current_message() {
    let model = ValidationResultsModel::new();
    model.add_message(ValidationMessage::at("", Severity::Info, "saved", 1));
    let aggregator = ValidationResultsAggregator::new(model.clone());

    let received = Rc::new(RefCell::new(Vec::new()));
    let received_clone = Rc::clone(&received);
    aggregator.set_sink(Some(Rc::new(move |m: Option<&ValidationMessage>| {
        received_clone.borrow_mut().push(m.map(ToString::to_string));
    })));
    assert_eq!(*received.borrow(), vec![Some("info: saved".to_string())]);

    aggregator.set_sink(None);
    model.clear();
    assert_eq!(received.borrow().len(), 1);
}
