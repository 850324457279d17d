#![forbid(unsafe_code)]

//! Reference view-models and UI elements.

use std::cell::Cell;
use std::rc::Rc;

use tether_core::{
    BindError, DynamicObject, ObjectRef, PropertyNotifier, PropertySource, Result, Value,
};

/// `Address { city }`.
#[must_use]
pub fn address(city: &str) -> Rc<DynamicObject> {
    DynamicObject::builder("Address").property("city", city).build()
}

/// `Person { name, age, active, address }`.
#[must_use]
pub fn person(name: &str, city: &str) -> Rc<DynamicObject> {
    DynamicObject::builder("Person")
        .property("name", name)
        .property("age", 30)
        .property("active", true)
        .property("address", address(city) as ObjectRef)
        .build()
}

/// A label with a writable `text` and a read-only `kind`.
#[must_use]
pub fn label() -> Rc<DynamicObject> {
    DynamicObject::builder("Label")
        .property("text", "")
        .read_only("kind", "label")
        .build()
}

/// An editable text box: observable `text`, so it can drive two-way bindings.
#[must_use]
pub fn text_box() -> Rc<DynamicObject> {
    DynamicObject::builder("TextBox").property("text", "").build()
}

/// A checkbox with a boolean `checked`.
#[must_use]
pub fn checkbox() -> Rc<DynamicObject> {
    DynamicObject::builder("Checkbox")
        .property("checked", false)
        .build()
}

/// Current value of `property` rendered as a string; empty when missing.
#[must_use]
pub fn text_of(object: &dyn PropertySource, property: &str) -> String {
    object
        .get(property)
        .map(|value| value.to_string())
        .unwrap_or_default()
}

/// Hand-written view-model exposing a single observable `count`.
///
/// Writes through [`PropertySource::set`] accept integers only.
#[derive(Debug, Default)]
pub struct CounterVm {
    count: Cell<i64>,
    notifier: PropertyNotifier,
}

impl CounterVm {
    #[must_use]
    pub fn new(start: i64) -> Rc<Self> {
        Rc::new(Self {
            count: Cell::new(start),
            notifier: PropertyNotifier::new(),
        })
    }

    /// Add one and notify.
    ///
    /// # Errors
    ///
    /// Whatever a subscriber returns.
    pub fn increment(&self) -> Result<()> {
        self.count.set(self.count.get() + 1);
        self.notifier.notify("count")
    }

    #[must_use]
    pub fn count(&self) -> i64 {
        self.count.get()
    }
}

impl PropertySource for CounterVm {
    fn type_name(&self) -> &str {
        "CounterVm"
    }

    fn get(&self, name: &str) -> Option<Value> {
        (name == "count").then(|| Value::Int(self.count.get()))
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        if name != "count" {
            return Err(BindError::not_found("CounterVm", name, name));
        }
        let next = value.as_int().ok_or_else(|| {
            BindError::invalid_argument(format!("count expects an int, got {}", value.kind()))
        })?;
        if next != self.count.get() {
            self.count.set(next);
            self.notifier.notify("count")?;
        }
        Ok(())
    }

    fn is_writable(&self, name: &str) -> bool {
        name == "count"
    }

    fn notifier(&self) -> Option<&PropertyNotifier> {
        Some(&self.notifier)
    }
}
