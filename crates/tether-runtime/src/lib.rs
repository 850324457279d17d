#![forbid(unsafe_code)]

//! Binding runtime for tether.
//!
//! Builds on `tether-core`'s property model:
//!
//! - [`adapter`]: value adapters and the id-keyed [`AdapterRegistry`].
//! - [`config`]: [`BindingConfig`] and name-keyed [`BindingManifest`]s
//!   (TOML/JSON loading behind the `config` feature).
//! - [`member`]: [`MemberBinding`], one live link between a view-model
//!   property and a UI property.
//! - [`host`]: [`BindingHost`], the connect/disconnect lifecycle around a
//!   member binding.
//! - [`tree`]: [`ViewTree`], nodes with view-model scopes, activation,
//!   and destruction.
//!
//! # Example
//!
//! ```
//! use tether_core::{DynamicObject, PropertySource, Value};
//! use tether_runtime::{BindingConfig, ViewTree};
//!
//! let mut tree = ViewTree::new();
//! let scope = tree.add_node(tree.root(), "card").unwrap();
//! tree.make_scope(scope).unwrap();
//! let title = tree.add_node(scope, "title").unwrap();
//! let label = DynamicObject::builder("Label").property("text", "").build();
//! tree.set_element(title, label.clone()).unwrap();
//! tree.add_binding(title, BindingConfig::one_way("name", "text")).unwrap();
//!
//! let vm = DynamicObject::builder("Person").property("name", "Alice").build();
//! tree.init_child_bindings(scope, Value::Object(vm.clone())).unwrap();
//! assert_eq!(label.get("text"), Some(Value::from("Alice")));
//!
//! vm.set("name", "Bob".into()).unwrap();
//! assert_eq!(label.get("text"), Some(Value::from("Bob")));
//! ```

pub mod adapter;
pub mod config;
pub mod host;
pub mod member;
pub mod tree;

pub use adapter::{
    AdapterId, AdapterOptions, AdapterRegistry, BoolToStringAdapter, FnAdapter, IntToFloatAdapter,
    InvertBoolAdapter, StringToFloatAdapter, StringToIntAdapter, ToStringAdapter, ValueAdapter,
};
pub use config::{BindingConfig, BindingManifest, BindingMode, ManifestEntry};
pub use host::{BindingHost, ConnectOutcome, HostState};
pub use member::MemberBinding;
pub use tree::{HostId, InitReport, Lifecycle, NodeId, TreeStats, ViewTree};
