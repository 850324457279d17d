#![forbid(unsafe_code)]

//! Named-property access on arbitrary objects.
//!
//! [`PropertySource`] is the capability interface tether uses instead of
//! reflection: view-models and UI elements expose readable (and optionally
//! writable) properties by name, plus an optional [`PropertyNotifier`] when
//! they can announce changes.
//!
//! [`DynamicObject`] is a ready-made implementation backed by a property
//! map. It covers plain view-models, test doubles, and UI elements that
//! do not need custom behavior.
//!
//! # Invariants
//!
//! 1. `get(name)` returns `None` only when `name` is not a property of the
//!    object's runtime type; a property holding nothing returns
//!    `Some(Value::Null)`.
//! 2. `DynamicObject::set` with a value equal to the current one is a no-op
//!    (no notification).
//! 3. The value is stored before subscribers are notified, so callbacks
//!    always read the new value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::error::{BindError, Result};
use crate::notify::PropertyNotifier;
use crate::value::Value;

/// Shared handle to any object with named properties.
pub type ObjectRef = Rc<dyn PropertySource>;

/// Name-based property access.
///
/// Implementations use interior mutability for `set`; objects are shared
/// through [`ObjectRef`] and tether never needs `&mut` access.
pub trait PropertySource {
    /// Name of the runtime type, used in diagnostics.
    fn type_name(&self) -> &str;

    /// Current value of `name`, or `None` when no such property exists.
    fn get(&self, name: &str) -> Option<Value>;

    /// Write `value` to `name`.
    ///
    /// # Errors
    ///
    /// [`BindError::PropertyNotFound`] for unknown properties and
    /// [`BindError::ReadOnly`] for properties without a setter. Errors
    /// raised by change subscribers are propagated.
    fn set(&self, name: &str, value: Value) -> Result<()>;

    /// Whether `name` accepts writes.
    fn is_writable(&self, _name: &str) -> bool {
        false
    }

    /// Whether `name` is a property of this runtime type.
    fn has_property(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The observable-property capability, if this object supports it.
    fn notifier(&self) -> Option<&PropertyNotifier> {
        None
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    writable: bool,
}

/// Property-map backed object with optional change notification.
pub struct DynamicObject {
    type_name: String,
    slots: RefCell<AHashMap<String, Slot>>,
    notifier: Option<PropertyNotifier>,
}

impl DynamicObject {
    /// Start declaring an object of the given runtime type.
    #[must_use]
    pub fn builder(type_name: impl Into<String>) -> DynamicObjectBuilder {
        DynamicObjectBuilder {
            type_name: type_name.into(),
            slots: AHashMap::new(),
            observable: true,
        }
    }

    /// Raise a change notification for `name` without touching its value.
    ///
    /// Useful for derived properties whose inputs changed elsewhere.
    ///
    /// # Errors
    ///
    /// Propagates subscriber errors; unknown names fail with
    /// [`BindError::PropertyNotFound`].
    pub fn raise_property_changed(&self, name: &str) -> Result<()> {
        if !self.slots.borrow().contains_key(name) {
            return Err(BindError::not_found(&self.type_name, name, name));
        }
        match &self.notifier {
            Some(notifier) => notifier.notify(name),
            None => Ok(()),
        }
    }

    /// Declared property names, sorted.
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether this object announces changes.
    #[must_use]
    pub fn is_observable(&self) -> bool {
        self.notifier.is_some()
    }
}

impl PropertySource for DynamicObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.slots.borrow().get(name).map(|slot| slot.value.clone())
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        {
            let mut slots = self.slots.borrow_mut();
            let slot = slots
                .get_mut(name)
                .ok_or_else(|| BindError::not_found(&self.type_name, name, name))?;
            if !slot.writable {
                return Err(BindError::read_only(&self.type_name, name));
            }
            if slot.value == value {
                return Ok(());
            }
            slot.value = value;
        }
        match &self.notifier {
            Some(notifier) => notifier.notify(name),
            None => Ok(()),
        }
    }

    fn is_writable(&self, name: &str) -> bool {
        self.slots.borrow().get(name).is_some_and(|s| s.writable)
    }

    fn has_property(&self, name: &str) -> bool {
        self.slots.borrow().contains_key(name)
    }

    fn notifier(&self) -> Option<&PropertyNotifier> {
        self.notifier.as_ref()
    }
}

impl fmt::Debug for DynamicObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicObject")
            .field("type_name", &self.type_name)
            .field("properties", &self.property_names())
            .field("observable", &self.is_observable())
            .finish()
    }
}

/// Builder returned by [`DynamicObject::builder`].
#[derive(Debug)]
#[must_use]
pub struct DynamicObjectBuilder {
    type_name: String,
    slots: AHashMap<String, Slot>,
    observable: bool,
}

impl DynamicObjectBuilder {
    /// Declare a read-write property.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slots.insert(
            name.into(),
            Slot {
                value: value.into(),
                writable: true,
            },
        );
        self
    }

    /// Declare a property without a setter.
    pub fn read_only(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slots.insert(
            name.into(),
            Slot {
                value: value.into(),
                writable: false,
            },
        );
        self
    }

    /// Build an object without change notification (static properties).
    pub fn static_properties(mut self) -> Self {
        self.observable = false;
        self
    }

    #[must_use]
    pub fn build(self) -> Rc<DynamicObject> {
        Rc::new(DynamicObject {
            type_name: self.type_name,
            slots: RefCell::new(self.slots),
            notifier: self.observable.then(PropertyNotifier::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn person() -> Rc<DynamicObject> {
        DynamicObject::builder("Person")
            .property("name", "Alice")
            .read_only("id", 7)
            .build()
    }

    #[test]
    fn get_and_set() {
        let p = person();
        assert_eq!(p.get("name"), Some(Value::from("Alice")));
        p.set("name", "Bob".into()).unwrap();
        assert_eq!(p.get("name"), Some(Value::from("Bob")));
        assert_eq!(p.get("missing"), None);
    }

    #[test]
    fn set_unknown_property_fails() {
        let err = person().set("age", 3.into()).unwrap_err();
        assert!(matches!(err, BindError::PropertyNotFound { .. }));
    }

    #[test]
    fn read_only_rejects_writes() {
        let p = person();
        assert!(!p.is_writable("id"));
        assert!(p.is_writable("name"));
        let err = p.set("id", 8.into()).unwrap_err();
        assert!(matches!(err, BindError::ReadOnly { .. }));
    }

    #[test]
    fn equal_set_does_not_notify() {
        let p = person();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = p.notifier().unwrap().subscribe("name", move |_| {
            h.set(h.get() + 1);
            Ok(())
        });
        p.set("name", "Alice".into()).unwrap();
        assert_eq!(hits.get(), 0);
        p.set("name", "Carol".into()).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn callbacks_read_new_value() {
        let p = person();
        let seen = Rc::new(RefCell::new(Value::Null));
        let s = Rc::clone(&seen);
        let weak = Rc::downgrade(&p);
        let _sub = p.notifier().unwrap().subscribe("name", move |name| {
            if let Some(p) = weak.upgrade() {
                *s.borrow_mut() = p.get(name).unwrap_or_default();
            }
            Ok(())
        });
        p.set("name", "Dora".into()).unwrap();
        assert_eq!(*seen.borrow(), Value::from("Dora"));
    }

    #[test]
    fn static_objects_have_no_notifier() {
        let p = DynamicObject::builder("Config")
            .property("title", "x")
            .static_properties()
            .build();
        assert!(p.notifier().is_none());
        p.set("title", "y".into()).unwrap();
        assert_eq!(p.get("title"), Some(Value::from("y")));
    }

    #[test]
    fn raise_property_changed_notifies() {
        let p = person();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = p.notifier().unwrap().subscribe_all(move |_| {
            h.set(h.get() + 1);
            Ok(())
        });
        p.raise_property_changed("id").unwrap();
        assert_eq!(hits.get(), 1);
        assert!(p.raise_property_changed("nope").is_err());
    }
}
