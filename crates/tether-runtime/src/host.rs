#![forbid(unsafe_code)]

//! Binding lifecycle hosts.
//!
//! A [`BindingHost`] is the per-element wrapper around one
//! [`BindingConfig`]. It builds a [`MemberBinding`] on `connect` and
//! releases it on `disconnect`, following a small state machine:
//!
//! ```text
//! Unconnected ──connect──▶ Connected ──disconnect──▶ Disconnected
//!      │                                                  │
//!      └──────────────disconnect──────▶ Disconnected ◀────┘
//!                                          │
//!                                          └──connect──▶ Connected
//! ```
//!
//! # Invariants
//!
//! 1. A connected host owns exactly one member binding; `connect` on a
//!    connected host is a no-op, never a duplicate binding.
//! 2. `disconnect` is valid in every state and releases the binding at
//!    most once.
//! 3. Dropping a host disconnects it.
//! 4. The configuration is read at connect time and never mutated.
//!
//! # Failure Modes
//!
//! - No view-model available: `connect` returns
//!   [`ConnectOutcome::NoViewModel`]; the host stays inert. This is normal
//!   during early initialisation.
//! - No UI element attached: [`ConnectOutcome::NoElement`], also inert.
//! - Bad path, unknown adapter, adapter options rejected: `connect` returns
//!   the error and the host keeps its previous (unconnected) state.

use std::fmt;
use std::rc::Rc;

use tether_core::{ObjectRef, Result};

use crate::adapter::AdapterRegistry;
use crate::config::BindingConfig;
use crate::member::MemberBinding;

/// Lifecycle state of a [`BindingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostState {
    /// Never connected.
    Unconnected,
    /// Owns a live member binding.
    Connected,
    /// Was disconnected; may connect again.
    Disconnected,
}

/// Result of a [`BindingHost::connect`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectOutcome {
    /// A member binding was created.
    Connected,
    /// The host already owned a binding; nothing changed.
    AlreadyConnected,
    /// No view-model reachable; the host stays inert.
    NoViewModel,
    /// No UI element to bind to; the host stays inert.
    NoElement,
}

impl ConnectOutcome {
    /// Whether the host owns a binding after the call.
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected | Self::AlreadyConnected)
    }
}

/// Lifecycle wrapper around one binding configuration.
pub struct BindingHost {
    config: BindingConfig,
    state: HostState,
    binding: Option<MemberBinding>,
    connects: u64,
}

impl BindingHost {
    #[must_use]
    pub fn new(config: BindingConfig) -> Self {
        Self {
            config,
            state: HostState::Unconnected,
            binding: None,
            connects: 0,
        }
    }

    /// Build the member binding against `view_model`.
    ///
    /// # Errors
    ///
    /// Path, adapter, and resolution errors from the configuration.
    pub fn connect(
        &mut self,
        ui_element: Option<&ObjectRef>,
        view_model: Option<&ObjectRef>,
        adapters: &AdapterRegistry,
    ) -> Result<ConnectOutcome> {
        if self.state == HostState::Connected {
            return Ok(ConnectOutcome::AlreadyConnected);
        }
        let Some(view_model) = view_model else {
            return Ok(ConnectOutcome::NoViewModel);
        };
        let Some(ui_element) = ui_element else {
            return Ok(ConnectOutcome::NoElement);
        };

        let (view_model_path, ui_path) = self.config.paths()?;
        let adapter = self
            .config
            .adapter
            .as_deref()
            .map(|id| adapters.create(id, &self.config.adapter_options))
            .transpose()?;

        let binding = MemberBinding::new(
            ui_element,
            &view_model_path,
            &ui_path,
            adapter,
            view_model,
            self.config.mode,
        )?;
        self.binding = Some(binding);
        self.state = HostState::Connected;
        self.connects += 1;
        Ok(ConnectOutcome::Connected)
    }

    /// Release the member binding, if any. Returns whether one was released.
    pub fn disconnect(&mut self) -> bool {
        self.state = HostState::Disconnected;
        match self.binding.take() {
            Some(mut binding) => {
                binding.dispose();
                true
            }
            None => false,
        }
    }

    /// Disconnect, then connect again (full refresh).
    ///
    /// # Errors
    ///
    /// See [`BindingHost::connect`].
    pub fn init(
        &mut self,
        ui_element: Option<&ObjectRef>,
        view_model: Option<&ObjectRef>,
        adapters: &AdapterRegistry,
    ) -> Result<ConnectOutcome> {
        self.disconnect();
        self.connect(ui_element, view_model, adapters)
    }

    #[must_use]
    pub fn state(&self) -> HostState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    #[must_use]
    pub fn binding(&self) -> Option<&MemberBinding> {
        self.binding.as_ref()
    }

    /// Whether this host is connected to exactly `view_model`.
    #[must_use]
    pub fn is_bound_to(&self, view_model: &ObjectRef) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|binding| Rc::ptr_eq(binding.view_model(), view_model))
    }

    /// How many member bindings this host has created over its lifetime.
    #[must_use]
    pub fn connect_count(&self) -> u64 {
        self.connects
    }
}

impl Drop for BindingHost {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for BindingHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingHost")
            .field("view_model_property", &self.config.view_model_property)
            .field("ui_property", &self.config.ui_property)
            .field("state", &self.state)
            .field("connects", &self.connects)
            .finish()
    }
}
