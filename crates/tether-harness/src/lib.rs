#![forbid(unsafe_code)]

//! Test harness and reference fixtures for tether.
//!
//! - [`fixtures`]: view-models and UI elements used across the integration
//!   suites, including a hand-written [`PropertySource`] implementation.
//! - [`capture`]: a `tracing` layer that records events so tests can assert
//!   on lifecycle logging, with JSONL export.
//! - [`strategies`]: `proptest` strategies for values and property names.
//!
//! [`PropertySource`]: tether_core::PropertySource

pub mod capture;
pub mod fixtures;
pub mod strategies;

pub use capture::{CapturedEvent, LogCapture, capture_logs};
