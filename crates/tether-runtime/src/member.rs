#![forbid(unsafe_code)]

//! Member bindings: one live link between a view-model property and a UI
//! element property.
//!
//! Construction resolves both property paths, pushes the initial value
//! (through the adapter, if any) into the UI property, and then subscribes
//! to the view-model side so every later change is pushed synchronously.
//! Two-way bindings additionally watch the UI side and write changes back
//! through [`ValueAdapter::convert_back`].
//!
//! # Invariants
//!
//! 1. The initial UI write happens before any subscription exists, so it
//!    always precedes notification-driven writes.
//! 2. A binding owns exactly one watch per side it listens to, created in
//!    `new` and released exactly once in [`MemberBinding::dispose`].
//! 3. After `dispose`, no write from this binding reaches either side, even
//!    for a notification already in flight.
//! 4. Two-way bindings never echo: a write caused by this binding does not
//!    bounce back through the opposite watch (re-entrancy guard).
//!
//! # Failure Modes
//!
//! - Unresolvable path on either side: `new` fails with
//!   `BindError::PropertyNotFound` and nothing is subscribed.
//! - Read-only UI property: the binding is built as an inert sink and
//!   never writes.
//! - Adapter failure during construction: logged, the UI keeps its
//!   previous value, and the binding stays subscribed.
//! - Adapter failure on a later change: returned to whoever triggered the
//!   change; the binding stays subscribed.
//! - Two-way write-back failure (`convert_back` rejects partial input):
//!   the view-model keeps its last valid value and the error is returned
//!   to the UI-side mutator.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tether_core::{ObjectRef, PathWatch, PropertyHandle, PropertyPath, Result, resolve};

use crate::adapter::ValueAdapter;
use crate::config::BindingMode;

/// State shared between the binding and its change callbacks.
struct BinderShared {
    view_model: PropertyHandle,
    ui: PropertyHandle,
    adapter: Option<Rc<dyn ValueAdapter>>,
    ui_writable: bool,
    active: Cell<bool>,
    /// Set while this binding is writing, to swallow its own echo.
    syncing: Cell<bool>,
}

impl BinderShared {
    fn push_to_ui(&self) -> Result<()> {
        if !self.active.get() || !self.ui_writable || self.syncing.get() {
            return Ok(());
        }
        let value = self.view_model.get()?;
        let converted = match &self.adapter {
            Some(adapter) => adapter.convert(value)?,
            None => value,
        };
        self.syncing.set(true);
        let written = self.ui.set(converted);
        self.syncing.set(false);
        written
    }

    fn push_to_view_model(&self) -> Result<()> {
        if !self.active.get() || self.syncing.get() {
            return Ok(());
        }
        let value = self.ui.get()?;
        let converted = match &self.adapter {
            Some(adapter) => adapter.convert_back(value)?,
            None => value,
        };
        self.syncing.set(true);
        let written = self.view_model.set(converted);
        self.syncing.set(false);
        written
    }
}

/// A live binding between one view-model property and one UI property.
///
/// Dropping the binding disposes it.
pub struct MemberBinding {
    shared: Rc<BinderShared>,
    mode: BindingMode,
    view_model_watch: Option<PathWatch>,
    ui_watch: Option<PathWatch>,
}

impl MemberBinding {
    /// Build a binding and push the initial value.
    ///
    /// # Errors
    ///
    /// `BindError::PropertyNotFound` when either path does not resolve.
    pub fn new(
        ui_element: &ObjectRef,
        view_model_path: &PropertyPath,
        ui_path: &PropertyPath,
        adapter: Option<Rc<dyn ValueAdapter>>,
        view_model: &ObjectRef,
        mode: BindingMode,
    ) -> Result<Self> {
        let view_model_handle = resolve(view_model, view_model_path)?;
        let ui_handle = resolve(ui_element, ui_path)?;
        let ui_writable = ui_handle.is_writable();
        if !ui_writable {
            tracing::debug!(
                ui_path = ui_path.as_str(),
                element = ui_element.type_name(),
                "ui property is read-only; binding is an inert sink"
            );
        }

        let shared = Rc::new(BinderShared {
            view_model: view_model_handle,
            ui: ui_handle,
            adapter,
            ui_writable,
            active: Cell::new(true),
            syncing: Cell::new(false),
        });

        if let Err(err) = shared.push_to_ui() {
            tracing::warn!(
                view_model_path = view_model_path.as_str(),
                ui_path = ui_path.as_str(),
                error = %err,
                "initial value not applied"
            );
        }

        let view_model_watch = {
            let shared = Rc::clone(&shared);
            shared.view_model.clone().watch(move || shared.push_to_ui())
        };
        let ui_watch = match mode {
            BindingMode::OneWay => None,
            BindingMode::TwoWay => {
                let shared = Rc::clone(&shared);
                shared.ui.clone().watch(move || shared.push_to_view_model())
            }
        };

        tracing::trace!(
            view_model_path = view_model_path.as_str(),
            ui_path = ui_path.as_str(),
            ?mode,
            live = view_model_watch.is_some(),
            "member binding created"
        );

        Ok(Self {
            shared,
            mode,
            view_model_watch,
            ui_watch,
        })
    }

    /// One-way binding (view-model → UI).
    ///
    /// # Errors
    ///
    /// See [`MemberBinding::new`].
    pub fn one_way(
        ui_element: &ObjectRef,
        view_model_path: &str,
        ui_path: &str,
        adapter: Option<Rc<dyn ValueAdapter>>,
        view_model: &ObjectRef,
    ) -> Result<Self> {
        Self::new(
            ui_element,
            &PropertyPath::parse(view_model_path)?,
            &PropertyPath::parse(ui_path)?,
            adapter,
            view_model,
            BindingMode::OneWay,
        )
    }

    /// Two-way binding (view-model ⇄ UI).
    ///
    /// # Errors
    ///
    /// See [`MemberBinding::new`].
    pub fn two_way(
        ui_element: &ObjectRef,
        view_model_path: &str,
        ui_path: &str,
        adapter: Option<Rc<dyn ValueAdapter>>,
        view_model: &ObjectRef,
    ) -> Result<Self> {
        Self::new(
            ui_element,
            &PropertyPath::parse(view_model_path)?,
            &PropertyPath::parse(ui_path)?,
            adapter,
            view_model,
            BindingMode::TwoWay,
        )
    }

    /// Re-read the view-model and push it to the UI.
    ///
    /// Static (non-observable) properties only update through this call.
    ///
    /// # Errors
    ///
    /// Adapter or UI write failures.
    pub fn refresh(&self) -> Result<()> {
        self.shared.push_to_ui()
    }

    /// Release every subscription. Idempotent; safe on a binding whose
    /// subscriptions were never established.
    pub fn dispose(&mut self) {
        if !self.shared.active.replace(false) {
            return;
        }
        if let Some(mut watch) = self.view_model_watch.take() {
            watch.release();
        }
        if let Some(mut watch) = self.ui_watch.take() {
            watch.release();
        }
        tracing::trace!(
            view_model_path = self.shared.view_model.path().as_str(),
            ui_path = self.shared.ui.path().as_str(),
            "member binding disposed"
        );
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.active.get()
    }

    /// Whether view-model changes are pushed automatically.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.view_model_watch.as_ref().is_some_and(PathWatch::is_active)
    }

    #[must_use]
    pub fn mode(&self) -> BindingMode {
        self.mode
    }

    /// The view-model this binding reads from.
    #[must_use]
    pub fn view_model(&self) -> &ObjectRef {
        self.shared.view_model.root()
    }

    #[must_use]
    pub fn view_model_path(&self) -> &PropertyPath {
        self.shared.view_model.path()
    }

    #[must_use]
    pub fn ui_path(&self) -> &PropertyPath {
        self.shared.ui.path()
    }

    #[must_use]
    pub fn adapter_id(&self) -> Option<&str> {
        self.shared.adapter.as_deref().map(ValueAdapter::id)
    }

    /// Whether writes to the UI side are dropped (read-only UI property).
    #[must_use]
    pub fn is_inert_sink(&self) -> bool {
        !self.shared.ui_writable
    }
}

impl Drop for MemberBinding {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for MemberBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberBinding")
            .field("view_model_path", &self.view_model_path().as_str())
            .field("ui_path", &self.ui_path().as_str())
            .field("mode", &self.mode)
            .field("adapter", &self.adapter_id())
            .field("active", &self.is_active())
            .finish()
    }
}
