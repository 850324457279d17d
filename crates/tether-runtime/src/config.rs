#![forbid(unsafe_code)]

//! Binding configuration.
//!
//! A [`BindingConfig`] names the view-model property, the UI property, the
//! optional adapter (with its string options), and the binding direction.
//! It is supplied by the owning element's static configuration, read once
//! when the binding connects, and never mutated by the engine.
//!
//! A [`BindingManifest`] lists configurations per view-tree node name so a
//! whole subtree's bindings can be declared in one document. With the
//! `config` feature enabled, manifests load from TOML or JSON:
//!
//! ```toml
//! [[binding]]
//! element = "title"
//! view_model_property = "name"
//! ui_property = "text"
//!
//! [[binding]]
//! element = "price"
//! view_model_property = "order.total"
//! ui_property = "text"
//! adapter = "to_string"
//! adapter_options = { format = "${}", precision = "2" }
//! ```

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use tether_core::{PropertyPath, Result};

use crate::adapter::{AdapterId, AdapterOptions};

/// Direction in which values flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum BindingMode {
    /// View-model → UI only.
    #[default]
    OneWay,
    /// View-model → UI, and UI changes written back to the view-model.
    TwoWay,
}

/// Immutable description of one binding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct BindingConfig {
    /// Dotted path on the view-model (`name`, `address.city`).
    pub view_model_property: String,
    /// Dotted path on the UI element (`text`, `style.color`).
    pub ui_property: String,
    #[cfg_attr(
        feature = "config",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub adapter: Option<AdapterId>,
    #[cfg_attr(
        feature = "config",
        serde(default, skip_serializing_if = "AdapterOptions::is_empty")
    )]
    pub adapter_options: AdapterOptions,
    #[cfg_attr(feature = "config", serde(default))]
    pub mode: BindingMode,
}

impl BindingConfig {
    #[must_use]
    pub fn one_way(view_model_property: impl Into<String>, ui_property: impl Into<String>) -> Self {
        Self {
            view_model_property: view_model_property.into(),
            ui_property: ui_property.into(),
            adapter: None,
            adapter_options: AdapterOptions::new(),
            mode: BindingMode::OneWay,
        }
    }

    #[must_use]
    pub fn two_way(view_model_property: impl Into<String>, ui_property: impl Into<String>) -> Self {
        Self {
            mode: BindingMode::TwoWay,
            ..Self::one_way(view_model_property, ui_property)
        }
    }

    #[must_use]
    pub fn with_adapter(mut self, id: impl Into<AdapterId>) -> Self {
        self.adapter = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.adapter_options.insert(key.into(), value.into());
        self
    }

    /// Parse both property paths.
    ///
    /// # Errors
    ///
    /// [`tether_core::BindError::InvalidPath`] for malformed paths.
    pub fn paths(&self) -> Result<(PropertyPath, PropertyPath)> {
        Ok((
            PropertyPath::parse(&self.view_model_property)?,
            PropertyPath::parse(&self.ui_property)?,
        ))
    }
}

/// One manifest entry: a binding attached to the node called `element`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct ManifestEntry {
    pub element: String,
    #[cfg_attr(feature = "config", serde(flatten))]
    pub binding: BindingConfig,
}

/// A list of bindings keyed by view-tree node name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct BindingManifest {
    #[cfg_attr(feature = "config", serde(default, rename = "binding"))]
    pub bindings: Vec<ManifestEntry>,
}

impl BindingManifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, element: impl Into<String>, binding: BindingConfig) -> Self {
        self.bindings.push(ManifestEntry {
            element: element.into(),
            binding,
        });
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(feature = "config")]
impl BindingManifest {
    /// Parse a TOML manifest (`[[binding]]` tables).
    ///
    /// # Errors
    ///
    /// [`tether_core::BindError::Config`] on syntax or schema errors.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| tether_core::BindError::config(e.to_string()))
    }

    /// Parse a JSON manifest (`{"binding": [...]}`).
    ///
    /// # Errors
    ///
    /// [`tether_core::BindError::Config`] on syntax or schema errors.
    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| tether_core::BindError::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::BindError;

    #[test]
    fn builders() {
        let cfg = BindingConfig::two_way("price", "text")
            .with_adapter("to_string")
            .with_option("precision", "2");
        assert_eq!(cfg.mode, BindingMode::TwoWay);
        assert_eq!(cfg.adapter.as_deref(), Some("to_string"));
        assert_eq!(cfg.adapter_options["precision"], "2");
    }

    #[test]
    fn paths_validate() {
        let (vm, ui) = BindingConfig::one_way("address.city", "text").paths().unwrap();
        assert_eq!(vm.segments(), ["address", "city"]);
        assert_eq!(ui.leaf(), "text");
        assert!(matches!(
            BindingConfig::one_way("a..b", "text").paths(),
            Err(BindError::InvalidPath { .. })
        ));
    }

    #[cfg(feature = "config")]
    #[test]
    fn manifest_from_toml() {
        let manifest = BindingManifest::from_toml_str(
            r#"
            [[binding]]
            element = "title"
            view_model_property = "name"
            ui_property = "text"

            [[binding]]
            element = "price"
            view_model_property = "total"
            ui_property = "text"
            adapter = "to_string"
            mode = "two_way"
            adapter_options = { precision = "2" }
            "#,
        )
        .unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.bindings[0].binding,
            BindingConfig::one_way("name", "text")
        );
        let price = &manifest.bindings[1].binding;
        assert_eq!(price.mode, BindingMode::TwoWay);
        assert_eq!(price.adapter_options["precision"], "2");
    }

    #[cfg(feature = "config")]
    #[test]
    fn manifest_from_json() {
        let manifest = BindingManifest::from_json_str(
            r#"{"binding": [{"element": "flag", "view_model_property": "done",
                "ui_property": "checked", "adapter": "invert_bool"}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.bindings[0].element, "flag");
        assert_eq!(manifest.bindings[0].binding.adapter.as_deref(), Some("invert_bool"));
    }

    #[cfg(feature = "config")]
    #[test]
    fn manifest_errors_map_to_config() {
        assert!(matches!(
            BindingManifest::from_toml_str("[[binding]]\nelement = 3"),
            Err(BindError::Config { .. })
        ));
        assert!(matches!(
            BindingManifest::from_json_str("{"),
            Err(BindError::Config { .. })
        ));
    }
}
