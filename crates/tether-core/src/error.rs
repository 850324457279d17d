#![forbid(unsafe_code)]

//! Error taxonomy shared by every tether crate.
//!
//! # Failure Modes
//!
//! | Error | Raised by | Scope of the failure |
//! |-------|-----------|----------------------|
//! | `PropertyNotFound` | path resolution | one binding; siblings continue |
//! | `InvalidArgument` | scope initialisation | the whole subtree, surfaced immediately |
//! | `AdapterConversion` | adapter `convert` / `convert_back` | the triggering `set`; binding stays subscribed |
//! | `InvalidPath` | path parsing | one binding |
//! | `ReadOnly` | writes to read-only properties | the triggering `set` |
//! | `UnknownAdapter` | adapter lookup at connect time | one binding |
//! | `Config` | configuration loading | the load call |
//! | `UnknownNode` / `UnknownHost` | view tree lookups with stale ids | the call |

use thiserror::Error;

/// Convenience alias used across tether.
pub type Result<T> = std::result::Result<T, BindError>;

/// Errors raised while resolving, connecting, or updating bindings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// A path segment does not exist on the runtime type it was looked up on.
    #[error("property '{property}' not found on {type_name} (path '{path}')")]
    PropertyNotFound {
        type_name: String,
        property: String,
        path: String,
    },

    /// A caller passed an argument the engine cannot work with.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A value adapter rejected its input.
    #[error("adapter '{adapter}' failed: {message}")]
    AdapterConversion { adapter: String, message: String },

    /// A property path was empty or had an empty segment.
    #[error("invalid property path '{path}'")]
    InvalidPath { path: String },

    /// A write targeted a property that only exposes a getter.
    #[error("property '{property}' on {type_name} is read-only")]
    ReadOnly { type_name: String, property: String },

    /// Configuration referenced an adapter id nobody registered.
    #[error("unknown adapter '{id}'")]
    UnknownAdapter { id: String },

    /// Configuration could not be parsed.
    #[error("config error: {message}")]
    Config { message: String },

    /// A view-tree node id is not (or no longer) part of the tree.
    #[error("unknown node #{id}")]
    UnknownNode { id: u64 },

    /// A binding host id is not (or no longer) part of the tree.
    #[error("unknown binding host #{id}")]
    UnknownHost { id: u64 },
}

impl BindError {
    #[must_use]
    pub fn not_found(
        type_name: impl Into<String>,
        property: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::PropertyNotFound {
            type_name: type_name.into(),
            property: property.into(),
            path: path.into(),
        }
    }

    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conversion(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AdapterConversion {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn read_only(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::ReadOnly {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error only affects the binding that raised it.
    ///
    /// Scope initialisation keeps going after binding-local errors and
    /// aborts on everything else.
    #[must_use]
    pub fn is_binding_local(&self) -> bool {
        matches!(
            self,
            Self::PropertyNotFound { .. }
                | Self::InvalidPath { .. }
                | Self::UnknownAdapter { .. }
                | Self::AdapterConversion { .. }
                | Self::ReadOnly { .. }
        )
    }
}
