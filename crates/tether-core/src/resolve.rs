#![forbid(unsafe_code)]

//! Property resolution: from `(object, "a.b.c")` to a live handle.
//!
//! [`resolve`] checks that every segment of a path exists on the runtime
//! type it is looked up on and returns a [`PropertyHandle`]. The handle
//! never caches intermediate objects: [`PropertyHandle::get`] and
//! [`PropertyHandle::set`] walk the chain from the root on every call, so
//! they always go through the latest intermediates.
//!
//! [`PropertyHandle::watch`] subscribes a callback to changes of the path.
//! The returned [`PathWatch`] holds one [`Subscription`] per observable link
//! of the chain. When an intermediate link changes, the deeper links are
//! re-subscribed against the new intermediate objects before the callback
//! runs.
//!
//! # Invariants
//!
//! 1. A handle reads through the current chain, never a stale one.
//! 2. A watch holds at most one subscription per chain link.
//! 3. After [`PathWatch::release`] (or drop) the callback never runs again,
//!    even when a notification carrying it is already in flight.
//!
//! # Failure Modes
//!
//! - Missing segment at resolve time: [`BindError::PropertyNotFound`].
//! - Intermediate value is `Null`: the path is unreachable; reads yield
//!   `Null`, writes are dropped, and the watch waits for the intermediate
//!   to be assigned.
//! - Intermediate value is a primitive: [`BindError::PropertyNotFound`]
//!   naming the primitive kind.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{BindError, Result};
use crate::notify::Subscription;
use crate::object::ObjectRef;
use crate::path::PropertyPath;
use crate::value::Value;

/// Resolve `path` against `target`.
///
/// # Errors
///
/// [`BindError::PropertyNotFound`] when a segment does not exist on the
/// object (or value) it is looked up on.
pub fn resolve(target: &ObjectRef, path: &PropertyPath) -> Result<PropertyHandle> {
    let handle = PropertyHandle {
        root: Rc::clone(target),
        path: path.clone(),
    };
    // Validates every reachable segment.
    handle.owner()?;
    #[cfg(feature = "tracing")]
    tracing::trace!(
        path = path.as_str(),
        root = target.type_name(),
        "property resolved"
    );
    Ok(handle)
}

/// Convenience wrapper parsing `path` first.
///
/// # Errors
///
/// [`BindError::InvalidPath`] or anything [`resolve`] returns.
pub fn resolve_str(target: &ObjectRef, path: &str) -> Result<PropertyHandle> {
    resolve(target, &PropertyPath::parse(path)?)
}

/// A resolved `(root object, path)` pair.
#[derive(Clone)]
pub struct PropertyHandle {
    root: ObjectRef,
    path: PropertyPath,
}

impl PropertyHandle {
    #[must_use]
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    #[must_use]
    pub fn root(&self) -> &ObjectRef {
        &self.root
    }

    /// The object declaring the leaf property, walking the current chain.
    ///
    /// `Ok(None)` when an intermediate link is `Null`.
    ///
    /// # Errors
    ///
    /// [`BindError::PropertyNotFound`] when a segment is missing.
    pub fn owner(&self) -> Result<Option<ObjectRef>> {
        let segments = self.path.segments();
        let mut current = Rc::clone(&self.root);
        for (depth, segment) in segments.iter().enumerate() {
            if !current.has_property(segment) {
                return Err(BindError::not_found(
                    current.type_name(),
                    segment.as_str(),
                    self.path.as_str(),
                ));
            }
            if depth + 1 == segments.len() {
                break;
            }
            match current.get(segment).unwrap_or_default() {
                Value::Object(next) => current = next,
                Value::Null => return Ok(None),
                other => {
                    return Err(BindError::not_found(
                        other.kind(),
                        segments[depth + 1].as_str(),
                        self.path.as_str(),
                    ));
                }
            }
        }
        Ok(Some(current))
    }

    /// Current value at the end of the chain (`Null` when unreachable).
    ///
    /// # Errors
    ///
    /// [`BindError::PropertyNotFound`] when the chain no longer matches.
    pub fn get(&self) -> Result<Value> {
        Ok(self
            .owner()?
            .and_then(|owner| owner.get(self.path.leaf()))
            .unwrap_or_default())
    }

    /// Write `value` at the end of the chain; dropped when unreachable.
    ///
    /// # Errors
    ///
    /// Whatever the owning object's `set` returns.
    pub fn set(&self, value: Value) -> Result<()> {
        match self.owner()? {
            Some(owner) => owner.set(self.path.leaf(), value),
            None => {
                #[cfg(feature = "tracing")]
                tracing::trace!(path = self.path.as_str(), "write to unreachable path dropped");
                Ok(())
            }
        }
    }

    /// Whether the leaf currently accepts writes.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        matches!(self.owner(), Ok(Some(owner)) if owner.is_writable(self.path.leaf()))
    }

    /// Subscribe `callback` to changes anywhere along the path.
    ///
    /// Returns `None` when no object in the current chain is observable:
    /// the property is static and will never announce a change.
    pub fn watch(&self, callback: impl Fn() -> Result<()> + 'static) -> Option<PathWatch> {
        let inner = Rc::new(WatchInner {
            root: Rc::clone(&self.root),
            path: self.path.clone(),
            links: RefCell::new(Vec::new()),
            live: Cell::new(true),
            callback: Box::new(callback),
        });
        inner.rewire();
        if inner.links.borrow().is_empty() {
            return None;
        }
        Some(PathWatch { inner })
    }
}

impl fmt::Debug for PropertyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyHandle")
            .field("root", &self.root.type_name())
            .field("path", &self.path.as_str())
            .finish()
    }
}

struct WatchInner {
    root: ObjectRef,
    path: PropertyPath,
    /// One subscription per observable link, ordered by depth.
    links: RefCell<Vec<Subscription>>,
    live: Cell<bool>,
    callback: Box<dyn Fn() -> Result<()>>,
}

impl WatchInner {
    /// (Re)subscribe to every observable link of the current chain.
    fn rewire(self: &Rc<Self>) {
        let segments = self.path.segments();
        let mut links = Vec::with_capacity(segments.len());
        let mut current = Some(Rc::clone(&self.root));

        for (depth, segment) in segments.iter().enumerate() {
            let Some(object) = current.take() else {
                break;
            };
            let is_leaf = depth + 1 == segments.len();
            if let Some(notifier) = object.notifier() {
                let weak = Rc::downgrade(self);
                links.push(notifier.subscribe(segment, move |_| match weak.upgrade() {
                    Some(watch) => watch.on_change(is_leaf),
                    None => Ok(()),
                }));
            }
            if !is_leaf {
                current = object
                    .get(segment)
                    .and_then(|value| value.as_object().cloned());
            }
        }

        let stale = self.links.replace(links);
        drop(stale);
    }

    fn on_change(self: &Rc<Self>, is_leaf: bool) -> Result<()> {
        if !self.live.get() {
            return Ok(());
        }
        if !is_leaf {
            self.rewire();
            #[cfg(feature = "tracing")]
            tracing::trace!(path = self.path.as_str(), "chain link changed, rewired");
        }
        (self.callback)()
    }
}

/// Live subscription to a property path.
///
/// Dropping the watch unsubscribes every link.
#[must_use = "dropping a PathWatch unsubscribes immediately"]
pub struct PathWatch {
    inner: Rc<WatchInner>,
}

impl PathWatch {
    /// Unsubscribe every link. Idempotent.
    pub fn release(&mut self) {
        if self.inner.live.replace(false) {
            let links = self.inner.links.take();
            drop(links);
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.live.get()
    }

    /// Number of chain links currently subscribed.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.inner.links.borrow().len()
    }
}

impl Drop for PathWatch {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for PathWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathWatch")
            .field("path", &self.inner.path.as_str())
            .field("links", &self.link_count())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{DynamicObject, PropertySource};

    fn address(city: &str) -> Rc<DynamicObject> {
        DynamicObject::builder("Address")
            .property("city", city)
            .build()
    }

    fn person_with(address: &Rc<DynamicObject>) -> Rc<DynamicObject> {
        let addr: ObjectRef = address.clone();
        DynamicObject::builder("Person")
            .property("name", "Alice")
            .property("address", addr)
            .build()
    }

    fn counter() -> (Rc<Cell<u32>>, impl Fn() -> Result<()> + 'static) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, move || {
            h.set(h.get() + 1);
            Ok(())
        })
    }

    #[test]
    fn resolves_simple_property() {
        let p: ObjectRef = person_with(&address("Oslo"));
        let handle = resolve_str(&p, "name").unwrap();
        assert_eq!(handle.get().unwrap(), Value::from("Alice"));
        assert!(handle.is_writable());
    }

    #[test]
    fn missing_property_is_not_found() {
        let p: ObjectRef = person_with(&address("Oslo"));
        let err = resolve_str(&p, "age").unwrap_err();
        assert_eq!(err, BindError::not_found("Person", "age", "age"));

        let err = resolve_str(&p, "address.zip").unwrap_err();
        assert_eq!(err, BindError::not_found("Address", "zip", "address.zip"));
    }

    #[test]
    fn primitive_intermediate_is_not_found() {
        let p: ObjectRef = person_with(&address("Oslo"));
        let err = resolve_str(&p, "name.length").unwrap_err();
        assert_eq!(err, BindError::not_found("string", "length", "name.length"));
    }

    #[test]
    fn null_intermediate_reads_null() {
        let p: ObjectRef = DynamicObject::builder("Person")
            .property("address", Value::Null)
            .build();
        let handle = resolve_str(&p, "address.city").unwrap();
        assert_eq!(handle.get().unwrap(), Value::Null);
        handle.set("Paris".into()).unwrap();
        assert!(!handle.is_writable());
    }

    #[test]
    fn chained_get_reads_latest_intermediate() {
        let person = person_with(&address("Oslo"));
        let p: ObjectRef = person.clone();
        let handle = resolve_str(&p, "address.city").unwrap();
        assert_eq!(handle.get().unwrap(), Value::from("Oslo"));

        let paris: ObjectRef = address("Paris");
        person.set("address", paris.into()).unwrap();
        assert_eq!(handle.get().unwrap(), Value::from("Paris"));
    }

    #[test]
    fn watch_fires_on_leaf_change() {
        let p = person_with(&address("Oslo"));
        let obj: ObjectRef = p.clone();
        let (hits, cb) = counter();
        let watch = resolve_str(&obj, "name").unwrap().watch(cb).unwrap();
        assert_eq!(watch.link_count(), 1);

        p.set("name", "Bob".into()).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn watch_rewires_when_intermediate_changes() {
        let oslo = address("Oslo");
        let p = person_with(&oslo);
        let obj: ObjectRef = p.clone();
        let (hits, cb) = counter();
        let _watch = resolve_str(&obj, "address.city").unwrap().watch(cb).unwrap();

        let paris = address("Paris");
        let paris_ref: ObjectRef = paris.clone();
        p.set("address", paris_ref.into()).unwrap();
        assert_eq!(hits.get(), 1);

        // The old intermediate is no longer watched.
        oslo.set("city", "Bergen".into()).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(oslo.notifier().unwrap().subscriber_count(), 0);

        paris.set("city", "Lyon".into()).unwrap();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn static_property_has_no_watch() {
        let obj: ObjectRef = DynamicObject::builder("Label")
            .property("text", "fixed")
            .static_properties()
            .build();
        let handle = resolve_str(&obj, "text").unwrap();
        let (_hits, cb) = counter();
        assert!(handle.watch(cb).is_none());
    }

    #[test]
    fn released_watch_never_fires() {
        let p = person_with(&address("Oslo"));
        let obj: ObjectRef = p.clone();
        let (hits, cb) = counter();
        let mut watch = resolve_str(&obj, "name").unwrap().watch(cb).unwrap();
        watch.release();
        watch.release();
        p.set("name", "Eve".into()).unwrap();
        assert_eq!(hits.get(), 0);
        assert_eq!(p.notifier().unwrap().subscriber_count(), 0);
    }
}
