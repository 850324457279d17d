#![forbid(unsafe_code)]

//! The observable-property capability.
//!
//! A [`PropertyNotifier`] is the change-notification hub an object exposes
//! to announce "property `name` changed". Subscribers register either for a
//! single property name or for every property, and receive the changed
//! property's name.
//!
//! # Architecture
//!
//! The subscriber list lives behind `Rc<RefCell<..>>`. [`notify`] takes a
//! snapshot of the matching subscribers and releases the borrow before
//! invoking any callback, so callbacks may freely subscribe, unsubscribe,
//! or trigger nested notifications.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Each subscriber carries a liveness flag. Releasing a [`Subscription`]
//!    clears the flag immediately, so a callback that is still pending in
//!    an in-flight snapshot is skipped (no writes after teardown).
//! 3. A [`Subscription`] is released exactly once: explicitly through
//!    [`Subscription::release`] or implicitly on drop.
//! 4. Every matching callback runs even when an earlier one fails; the
//!    first error is returned to the caller of [`notify`].
//!
//! # Failure Modes
//!
//! - Notifier dropped while subscriptions are alive: releasing them is a
//!   no-op.
//! - Release while the subscriber list is borrowed: the entry is marked
//!   dead and pruned on the next notification.
//!
//! [`notify`]: PropertyNotifier::notify

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{BindError, Result};

type Callback = Rc<dyn Fn(&str) -> Result<()>>;

struct Subscriber {
    id: u64,
    /// `None` subscribes to every property.
    property: Option<String>,
    live: Rc<Cell<bool>>,
    callback: Callback,
}

impl Subscriber {
    fn matches(&self, name: &str) -> bool {
        self.property.as_deref().is_none_or(|p| p == name)
    }
}

#[derive(Default)]
struct NotifierInner {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Change-notification hub for the properties of one object.
#[derive(Default)]
pub struct PropertyNotifier {
    inner: Rc<RefCell<NotifierInner>>,
}

impl PropertyNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to changes of a single property.
    pub fn subscribe(
        &self,
        property: &str,
        callback: impl Fn(&str) -> Result<()> + 'static,
    ) -> Subscription {
        self.register(Some(property.to_owned()), Rc::new(callback))
    }

    /// Subscribe to changes of every property on this object.
    pub fn subscribe_all(&self, callback: impl Fn(&str) -> Result<()> + 'static) -> Subscription {
        self.register(None, Rc::new(callback))
    }

    fn register(&self, property: Option<String>, callback: Callback) -> Subscription {
        let live = Rc::new(Cell::new(true));
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            property,
            live: Rc::clone(&live),
            callback,
        });
        Subscription {
            notifier: Rc::downgrade(&self.inner),
            id,
            live,
        }
    }

    /// Announce that `property` changed.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a subscriber callback, after all
    /// matching callbacks ran.
    pub fn notify(&self, property: &str) -> Result<()> {
        let snapshot: Vec<(Rc<Cell<bool>>, Callback)> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|s| s.live.get());
            inner
                .subscribers
                .iter()
                .filter(|s| s.matches(property))
                .map(|s| (Rc::clone(&s.live), Rc::clone(&s.callback)))
                .collect()
        };

        let mut first_err: Option<BindError> = None;
        for (live, callback) in snapshot {
            // Released by an earlier callback in this same pass.
            if !live.get() {
                continue;
            }
            if let Err(err) = callback(property) {
                #[cfg(feature = "tracing")]
                tracing::debug!(property, error = %err, "change subscriber failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Number of live subscribers (all properties).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|s| s.live.get())
            .count()
    }

    /// Number of live subscribers that would receive a change of `property`.
    #[must_use]
    pub fn subscriber_count_for(&self, property: &str) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|s| s.live.get() && s.matches(property))
            .count()
    }
}

impl fmt::Debug for PropertyNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// RAII guard for one registered change callback.
///
/// Dropping the guard unsubscribes; [`release`](Self::release) does the same
/// eagerly and is idempotent.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    notifier: Weak<RefCell<NotifierInner>>,
    id: u64,
    live: Rc<Cell<bool>>,
}

impl Subscription {
    /// Unsubscribe now. Calling this more than once is a no-op.
    pub fn release(&mut self) {
        if !self.live.replace(false) {
            return;
        }
        if let Some(shared) = self.notifier.upgrade()
            && let Ok(mut inner) = shared.try_borrow_mut()
        {
            let id = self.id;
            inner.subscribers.retain(|s| s.id != id);
        }
    }

    /// Whether the callback can still fire.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.live.get() && self.notifier.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
