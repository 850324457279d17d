#![forbid(unsafe_code)]

//! View tree: nodes, view-model scopes, and binding hosts.
//!
//! A [`ViewTree`] is an arena of nodes with parent back-links and ordered
//! children. Any node may carry a UI element, a view-model scope, and any
//! number of [`BindingHost`]s. The tree answers the hierarchy queries
//! bindings need (effective view-model, activity, descendant discovery)
//! and drives host lifecycles through the [`Lifecycle`] hooks.
//!
//! # Invariants
//!
//! 1. The effective view-model of a node is the view-model of the nearest
//!    scope at or above it that has one. Scopes without a view-model are
//!    transparent.
//! 2. `init_child_bindings` on an inactive scope stores the view-model and
//!    releases every connected host in the subtree without connecting
//!    any. The first activation that makes the scope active connects them.
//! 3. `init_child_bindings` on an active scope disconnects every connected
//!    host in the subtree, inactive descendants included, before
//!    reconnecting the active ones. No binding to the previous view-model
//!    survives the call; inactive hosts connect on their activation.
//! 4. Activation never duplicates a live binding: connected hosts already
//!    bound to their effective view-model are left untouched.
//! 5. Deactivation keeps bindings connected.
//! 6. Destroying a subtree disconnects each of its hosts exactly once and
//!    removes the nodes and hosts from the arena.
//!
//! # Failure Modes
//!
//! - A host whose connect fails (bad path, unknown adapter) is counted in
//!   [`InitReport::failed`] and logged; its siblings still connect.
//! - `init_child_bindings` with a `Null` or primitive view-model, or on a
//!   node that is not a scope, fails with `BindError::InvalidArgument`
//!   before touching any host.

use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use tether_core::{BindError, ObjectRef, Result, Value};

use crate::adapter::AdapterRegistry;
use crate::config::{BindingConfig, BindingManifest};
use crate::host::{BindingHost, ConnectOutcome, HostState};

/// Identifier of a node in a [`ViewTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Identifier of a binding host in a [`ViewTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(u64);

impl HostId {
    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}", self.0)
    }
}

/// Hooks a host UI framework calls as elements change state.
pub trait Lifecycle {
    /// The node became active. Connects hosts in the now-active subtree.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode` for a stale id.
    fn on_activate(&mut self, node: NodeId) -> Result<InitReport>;

    /// The node became inactive. Bindings stay connected.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode` for a stale id.
    fn on_deactivate(&mut self, node: NodeId) -> Result<()>;

    /// The node is being destroyed. Returns the number of bindings released.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode` for a stale id.
    fn on_destroy(&mut self, node: NodeId) -> Result<usize>;
}

/// Outcome of a connect pass over a subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitReport {
    /// Hosts that own a live binding after the pass.
    pub connected: usize,
    /// Hosts left inert (no view-model or no element).
    pub inert: usize,
    /// Hosts whose connect returned an error.
    pub failed: usize,
    /// The scope was inactive; binding work waits for activation.
    pub deferred: bool,
    /// Failed hosts and the error each one returned.
    pub errors: Vec<(HostId, BindError)>,
}

impl InitReport {
    fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::default()
        }
    }

    fn record(&mut self, host: HostId, outcome: Result<ConnectOutcome>) {
        match outcome {
            Ok(outcome) if outcome.is_connected() => self.connected += 1,
            Ok(_) => self.inert += 1,
            Err(err) => {
                self.failed += 1;
                self.errors.push((host, err));
            }
        }
    }

    /// Total hosts visited.
    #[must_use]
    pub fn visited(&self) -> usize {
        self.connected + self.inert + self.failed
    }
}

/// Arena occupancy, for leak checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub scopes: usize,
    pub hosts: usize,
    pub connected: usize,
}

#[derive(Default)]
struct Scope {
    view_model: Option<ObjectRef>,
    expected_type: Option<String>,
}

struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    active_self: bool,
    element: Option<ObjectRef>,
    scope: Option<Scope>,
    hosts: Vec<HostId>,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            active_self: true,
            element: None,
            scope: None,
            hosts: Vec::new(),
        }
    }
}

struct HostEntry {
    node: NodeId,
    host: BindingHost,
}

/// Arena of view nodes with scopes and binding hosts.
pub struct ViewTree {
    nodes: AHashMap<NodeId, Node>,
    hosts: AHashMap<HostId, HostEntry>,
    root: NodeId,
    adapters: AdapterRegistry,
    next_id: u64,
}

impl ViewTree {
    /// Empty tree with an active root node and the built-in adapters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_adapters(AdapterRegistry::with_builtins())
    }

    #[must_use]
    pub fn with_adapters(adapters: AdapterRegistry) -> Self {
        let root = NodeId(1);
        let mut nodes = AHashMap::new();
        nodes.insert(root, Node::new("root".to_owned(), None));
        Self {
            nodes,
            hosts: AHashMap::new(),
            root,
            adapters,
            next_id: 2,
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    /// Mutable access for registering adapters.
    pub fn adapters_mut(&mut self) -> &mut AdapterRegistry {
        &mut self.adapters
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or(BindError::UnknownNode { id: id.0 })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or(BindError::UnknownNode { id: id.0 })
    }

    fn entry(&self, id: HostId) -> Result<&HostEntry> {
        self.hosts
            .get(&id)
            .ok_or(BindError::UnknownHost { id: id.0 })
    }

    // --- structure ---------------------------------------------------------

    /// Append a child node. New nodes start active.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode` when `parent` is not in the tree.
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        self.node(parent)?;
        let id = NodeId(self.next());
        self.nodes.insert(id, Node::new(name.into(), Some(parent)));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Attach the UI element hosts on `node` bind to.
    ///
    /// Connected hosts keep their current binding until re-initialised.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode`.
    pub fn set_element(&mut self, node: NodeId, element: ObjectRef) -> Result<()> {
        self.node_mut(node)?.element = Some(element);
        Ok(())
    }

    #[must_use]
    pub fn element(&self, node: NodeId) -> Option<&ObjectRef> {
        self.nodes.get(&node).and_then(|n| n.element.as_ref())
    }

    /// Turn `node` into a view-model scope. Idempotent.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode`.
    pub fn make_scope(&mut self, node: NodeId) -> Result<()> {
        let node = self.node_mut(node)?;
        if node.scope.is_none() {
            node.scope = Some(Scope::default());
        }
        Ok(())
    }

    /// Like [`ViewTree::make_scope`], additionally requiring view-models
    /// given to this scope to report `type_name`.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode`.
    pub fn make_scope_typed(&mut self, node: NodeId, type_name: impl Into<String>) -> Result<()> {
        self.make_scope(node)?;
        if let Some(scope) = self.node_mut(node)?.scope.as_mut() {
            scope.expected_type = Some(type_name.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn is_scope(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.scope.is_some())
    }

    /// The view-model stored on `scope`, if any.
    #[must_use]
    pub fn view_model(&self, scope: NodeId) -> Option<&ObjectRef> {
        self.nodes
            .get(&scope)
            .and_then(|n| n.scope.as_ref())
            .and_then(|s| s.view_model.as_ref())
    }

    /// Register a binding on `node`. The host starts unconnected.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode`.
    pub fn add_binding(&mut self, node: NodeId, config: BindingConfig) -> Result<HostId> {
        self.node(node)?;
        let id = HostId(self.next());
        self.hosts.insert(
            id,
            HostEntry {
                node,
                host: BindingHost::new(config),
            },
        );
        self.node_mut(node)?.hosts.push(id);
        Ok(id)
    }

    /// Register every binding in `manifest`, matching entries to nodes by
    /// name within the subtree rooted at `under`.
    ///
    /// # Errors
    ///
    /// `BindError::Config` when an entry names no node; nothing is
    /// registered in that case.
    pub fn apply_manifest(
        &mut self,
        under: NodeId,
        manifest: &BindingManifest,
    ) -> Result<Vec<HostId>> {
        let targets = manifest
            .bindings
            .iter()
            .map(|entry| {
                self.find_by_name(under, &entry.element)?.ok_or_else(|| {
                    BindError::config(format!("no node named `{}`", entry.element))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        targets
            .into_iter()
            .zip(&manifest.bindings)
            .map(|(node, entry)| self.add_binding(node, entry.binding.clone()))
            .collect()
    }

    /// First node named `name` in pre-order from `under` (inclusive).
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode`.
    pub fn find_by_name(&self, under: NodeId, name: &str) -> Result<Option<NodeId>> {
        self.node(under)?;
        let mut stack = vec![under];
        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            if node.name == name {
                return Ok(Some(id));
            }
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(None)
    }

    #[must_use]
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.name.as_str())
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    // --- hierarchy queries -------------------------------------------------

    /// Whether `node` and all its ancestors are active.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode`.
    pub fn is_active_in_hierarchy(&self, node: NodeId) -> Result<bool> {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let n = self.node(id)?;
            if !n.active_self {
                return Ok(false);
            }
            cursor = n.parent;
        }
        Ok(true)
    }

    /// Nearest scope at or above `node`.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode`.
    pub fn nearest_scope(&self, node: NodeId) -> Result<Option<NodeId>> {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let n = self.node(id)?;
            if n.scope.is_some() {
                return Ok(Some(id));
            }
            cursor = n.parent;
        }
        Ok(None)
    }

    /// View-model of the nearest scope at or above `node` that has one.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode`.
    pub fn resolve_effective_view_model(&self, node: NodeId) -> Result<Option<ObjectRef>> {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let n = self.node(id)?;
            if let Some(vm) = n.scope.as_ref().and_then(|s| s.view_model.as_ref()) {
                return Ok(Some(Rc::clone(vm)));
            }
            cursor = n.parent;
        }
        Ok(None)
    }

    /// Hosts on `node` and its active descendants, in pre-order.
    ///
    /// Inactive subtrees are skipped; an inactive `node` yields nothing.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode`.
    pub fn find_binding_hosts(&self, node: NodeId) -> Result<Vec<HostId>> {
        if !self.is_active_in_hierarchy(node)? {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let n = self.node(id)?;
            if !n.active_self {
                continue;
            }
            found.extend_from_slice(&n.hosts);
            stack.extend(n.children.iter().rev().copied());
        }
        Ok(found)
    }

    /// Every node in the subtree, active or not, children before parents.
    fn subtree_post_order(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let mut order = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id)?.children.iter().copied());
        }
        order.reverse();
        Ok(order)
    }

    // --- host lifecycle ----------------------------------------------------

    /// Connect one host against its effective view-model.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownHost`, plus path and adapter errors.
    pub fn connect(&mut self, host: HostId) -> Result<ConnectOutcome> {
        let (element, view_model) = self.binding_inputs(host)?;
        let entry = self
            .hosts
            .get_mut(&host)
            .ok_or(BindError::UnknownHost { id: host.0 })?;
        entry
            .host
            .connect(element.as_ref(), view_model.as_ref(), &self.adapters)
    }

    /// Disconnect one host. Returns whether a binding was released.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownHost`.
    pub fn disconnect(&mut self, host: HostId) -> Result<bool> {
        let entry = self
            .hosts
            .get_mut(&host)
            .ok_or(BindError::UnknownHost { id: host.0 })?;
        Ok(entry.host.disconnect())
    }

    /// Disconnect, then connect one host against its effective view-model.
    ///
    /// # Errors
    ///
    /// See [`ViewTree::connect`].
    pub fn init_host(&mut self, host: HostId) -> Result<ConnectOutcome> {
        let (element, view_model) = self.binding_inputs(host)?;
        let entry = self
            .hosts
            .get_mut(&host)
            .ok_or(BindError::UnknownHost { id: host.0 })?;
        entry
            .host
            .init(element.as_ref(), view_model.as_ref(), &self.adapters)
    }

    /// # Errors
    ///
    /// `BindError::UnknownHost`.
    pub fn host_state(&self, host: HostId) -> Result<HostState> {
        Ok(self.entry(host)?.host.state())
    }

    #[must_use]
    pub fn host(&self, host: HostId) -> Option<&BindingHost> {
        self.hosts.get(&host).map(|e| &e.host)
    }

    /// Node a host is attached to.
    #[must_use]
    pub fn host_node(&self, host: HostId) -> Option<NodeId> {
        self.hosts.get(&host).map(|e| e.node)
    }

    fn binding_inputs(&self, host: HostId) -> Result<(Option<ObjectRef>, Option<ObjectRef>)> {
        let node = self.entry(host)?.node;
        let element = self.node(node)?.element.clone();
        let view_model = self.resolve_effective_view_model(node)?;
        Ok((element, view_model))
    }

    /// Hand `view_model` to `scope` and bind its subtree.
    ///
    /// Every connected host in the subtree is disconnected first, inactive
    /// descendants included. When the scope is active in the hierarchy the
    /// discovered (active) hosts are then reconnected against their
    /// effective view-model. Otherwise the report is marked deferred and
    /// activation does the connecting.
    ///
    /// # Errors
    ///
    /// `BindError::InvalidArgument` for a non-object view-model, a node
    /// that is not a scope, or a view-model of the wrong type.
    pub fn init_child_bindings(
        &mut self,
        scope: NodeId,
        view_model: impl Into<Value>,
    ) -> Result<InitReport> {
        let view_model = match view_model.into() {
            Value::Object(object) => object,
            other => {
                return Err(BindError::invalid_argument(format!(
                    "view-model for {scope} must be an object, got {}",
                    other.kind()
                )));
            }
        };
        let node = self.node_mut(scope)?;
        let Some(slot) = node.scope.as_mut() else {
            return Err(BindError::invalid_argument(format!(
                "{scope} (`{}`) is not a view-model scope",
                node.name
            )));
        };
        if let Some(expected) = slot.expected_type.as_deref()
            && expected != view_model.type_name()
        {
            return Err(BindError::invalid_argument(format!(
                "{scope} expects a `{expected}` view-model, got `{}`",
                view_model.type_name()
            )));
        }
        slot.view_model = Some(view_model);

        let released = self.release_subtree(scope)?;
        if !self.is_active_in_hierarchy(scope)? {
            tracing::debug!(
                %scope,
                released,
                "scope inactive; binding deferred until activation"
            );
            return Ok(InitReport::deferred());
        }

        let hosts = self.find_binding_hosts(scope)?;
        let report = self.connect_all(&hosts, |_, _| true)?;
        tracing::debug!(
            %scope,
            connected = report.connected,
            inert = report.inert,
            failed = report.failed,
            "child bindings initialised"
        );
        Ok(report)
    }

    /// Disconnect every connected host under `node`, active or not.
    fn release_subtree(&mut self, node: NodeId) -> Result<usize> {
        let mut released = 0;
        for id in self.subtree_post_order(node)? {
            for host in self.node(id)?.hosts.clone() {
                if self.host_state(host)? == HostState::Connected && self.disconnect(host)? {
                    released += 1;
                }
            }
        }
        Ok(released)
    }

    /// Connect `hosts` for which `needs_work(host, effective view-model)`
    /// holds, re-initialising any that are connected.
    fn connect_all(
        &mut self,
        hosts: &[HostId],
        needs_work: impl Fn(&BindingHost, Option<&ObjectRef>) -> bool,
    ) -> Result<InitReport> {
        let mut report = InitReport::default();
        for &id in hosts {
            let (element, view_model) = self.binding_inputs(id)?;
            let entry = self
                .hosts
                .get_mut(&id)
                .ok_or(BindError::UnknownHost { id: id.0 })?;
            if !needs_work(&entry.host, view_model.as_ref()) {
                report.record(id, Ok(ConnectOutcome::AlreadyConnected));
                continue;
            }
            let outcome = entry
                .host
                .init(element.as_ref(), view_model.as_ref(), &self.adapters);
            if let Err(err) = &outcome {
                tracing::warn!(
                    host = %id,
                    view_model_property = entry.host.config().view_model_property.as_str(),
                    ui_property = entry.host.config().ui_property.as_str(),
                    error = %err,
                    "binding failed to connect"
                );
            }
            report.record(id, outcome);
        }
        Ok(report)
    }

    /// Set a node's own active flag, running activation or deactivation
    /// hooks when its effective activity changes.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownNode`.
    pub fn set_active(&mut self, node: NodeId, active: bool) -> Result<InitReport> {
        let before = self.is_active_in_hierarchy(node)?;
        self.node_mut(node)?.active_self = active;
        let after = self.is_active_in_hierarchy(node)?;
        match (before, after) {
            (false, true) => self.on_activate(node),
            (true, false) => self.on_deactivate(node).map(|()| InitReport::default()),
            _ => Ok(InitReport::default()),
        }
    }

    #[must_use]
    pub fn is_active_self(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.active_self)
    }

    /// Remove `node` and its subtree, disconnecting every host once.
    /// Returns the number of bindings released.
    ///
    /// # Errors
    ///
    /// `BindError::InvalidArgument` for the root.
    pub fn destroy(&mut self, node: NodeId) -> Result<usize> {
        if node == self.root {
            return Err(BindError::invalid_argument("the root node cannot be destroyed"));
        }
        let parent = self.node(node)?.parent;
        let order = self.subtree_post_order(node)?;
        let mut released = 0;
        for id in &order {
            let Some(removed) = self.nodes.remove(id) else {
                continue;
            };
            for host in removed.hosts {
                if let Some(mut entry) = self.hosts.remove(&host)
                    && entry.host.disconnect()
                {
                    released += 1;
                }
            }
        }
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != node);
        }
        tracing::debug!(%node, nodes = order.len(), released, "subtree destroyed");
        Ok(released)
    }

    #[must_use]
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            nodes: self.nodes.len(),
            scopes: self.nodes.values().filter(|n| n.scope.is_some()).count(),
            hosts: self.hosts.len(),
            connected: self
                .hosts
                .values()
                .filter(|e| e.host.state() == HostState::Connected)
                .count(),
        }
    }
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle for ViewTree {
    fn on_activate(&mut self, node: NodeId) -> Result<InitReport> {
        if !self.is_active_in_hierarchy(node)? {
            return Ok(InitReport::deferred());
        }
        let hosts = self.find_binding_hosts(node)?;
        let report = self.connect_all(&hosts, |host, view_model| {
            !matches!(view_model, Some(vm) if host.is_bound_to(vm))
        })?;
        tracing::debug!(
            %node,
            connected = report.connected,
            inert = report.inert,
            failed = report.failed,
            "subtree activated"
        );
        Ok(report)
    }

    fn on_deactivate(&mut self, node: NodeId) -> Result<()> {
        self.node(node)?;
        tracing::trace!(%node, "subtree deactivated; bindings kept");
        Ok(())
    }

    fn on_destroy(&mut self, node: NodeId) -> Result<usize> {
        self.destroy(node)
    }
}

impl fmt::Debug for ViewTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewTree")
            .field("root", &self.root)
            .field("stats", &self.stats())
            .field("adapters", &self.adapters)
            .finish()
    }
}
