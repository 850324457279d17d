#![forbid(unsafe_code)]

//! Core primitives for tether data bindings.
//!
//! - [`Value`]: the type-agnostic value every property read/write carries.
//! - [`PropertySource`]: name-based property access on view-models and UI
//!   elements, with [`DynamicObject`] as a ready-made implementation.
//! - [`PropertyNotifier`] / [`Subscription`]: the observable-property
//!   capability (subscribe by name, fire on change, RAII unsubscribe).
//! - [`resolve`]: dotted-path resolution into a [`PropertyHandle`], plus
//!   [`PathWatch`] for live change tracking along the chain.
//! - [`BindError`]: the error taxonomy shared by all tether crates.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`) and synchronous:
//! notifications run to completion before the triggering `set` returns.

pub mod error;
pub mod notify;
pub mod object;
pub mod path;
pub mod resolve;
pub mod value;

pub use error::{BindError, Result};
pub use notify::{PropertyNotifier, Subscription};
pub use object::{DynamicObject, DynamicObjectBuilder, ObjectRef, PropertySource};
pub use path::PropertyPath;
pub use resolve::{PathWatch, PropertyHandle, resolve, resolve_str};
pub use value::Value;
