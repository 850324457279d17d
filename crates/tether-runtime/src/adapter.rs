#![forbid(unsafe_code)]

//! Value adapters: converting view-model values into UI values and back.
//!
//! A binding carries at most one [`ValueAdapter`]; no adapter means the
//! value passes through untouched. Adapters are stateless apart from the
//! options they were built with.
//!
//! Adapters are looked up by id in an [`AdapterRegistry`]. The registry
//! built by [`AdapterRegistry::with_builtins`] knows:
//!
//! | Id | `convert` | `convert_back` | Options |
//! |----|-----------|----------------|---------|
//! | `to_string` | any → text | text → `back` kind | `format` (`{}` placeholder), `precision`, `back` (`string`/`int`/`float`/`bool`) |
//! | `invert_bool` | `!b` | `!b` | none |
//! | `bool_to_string` | bool → label | label → bool | `true`, `false` |
//! | `int_to_float` | int → float | float → rounded int | none |
//! | `string_to_int` | text → int | int → text | none |
//! | `string_to_float` | text → float | float → text | none |
//!
//! # Failure Modes
//!
//! - Input of the wrong kind: [`BindError::AdapterConversion`].
//! - Unparseable text: [`BindError::AdapterConversion`].
//! - Bad options at build time: [`BindError::Config`].
//! - Unknown id: [`BindError::UnknownAdapter`].

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use tether_core::{BindError, Result, Value};

/// Identifier an adapter is registered under.
pub type AdapterId = String;

/// String options configured alongside an adapter id.
pub type AdapterOptions = BTreeMap<String, String>;

/// Converts between view-model values and UI values.
pub trait ValueAdapter {
    /// Registry id, used in error messages.
    fn id(&self) -> &str;

    /// View-model value → UI value.
    ///
    /// # Errors
    ///
    /// [`BindError::AdapterConversion`] when `value` cannot be converted.
    fn convert(&self, value: Value) -> Result<Value>;

    /// UI value → view-model value, for two-way bindings.
    ///
    /// # Errors
    ///
    /// [`BindError::AdapterConversion`]; the default implementation always
    /// fails because the adapter is one-way.
    fn convert_back(&self, _value: Value) -> Result<Value> {
        Err(BindError::conversion(self.id(), "adapter is one-way"))
    }
}

type ConvertFn = Box<dyn Fn(Value) -> Result<Value>>;

/// Adapter assembled from closures.
pub struct FnAdapter {
    id: String,
    convert: ConvertFn,
    convert_back: Option<ConvertFn>,
}

impl FnAdapter {
    pub fn new(id: impl Into<String>, convert: impl Fn(Value) -> Result<Value> + 'static) -> Self {
        Self {
            id: id.into(),
            convert: Box::new(convert),
            convert_back: None,
        }
    }

    /// Add the reverse conversion, making the adapter usable two-way.
    #[must_use]
    pub fn with_back(mut self, convert_back: impl Fn(Value) -> Result<Value> + 'static) -> Self {
        self.convert_back = Some(Box::new(convert_back));
        self
    }
}

impl ValueAdapter for FnAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn convert(&self, value: Value) -> Result<Value> {
        (self.convert)(value)
    }

    fn convert_back(&self, value: Value) -> Result<Value> {
        match &self.convert_back {
            Some(back) => back(value),
            None => Err(BindError::conversion(&self.id, "adapter is one-way")),
        }
    }
}

impl fmt::Debug for FnAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAdapter")
            .field("id", &self.id)
            .field("two_way", &self.convert_back.is_some())
            .finish()
    }
}

fn wrong_kind(adapter: &str, expected: &str, got: &Value) -> BindError {
    BindError::conversion(adapter, format!("expected {expected}, got {}", got.kind()))
}

// ---------------------------------------------------------------------------
// Built-in adapters
// ---------------------------------------------------------------------------

/// Kind `to_string` parses text back into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextKind {
    Str,
    Int,
    Float,
    Bool,
}

impl TextKind {
    fn parse_option(raw: Option<&String>) -> Result<Self> {
        match raw.map(String::as_str) {
            None | Some("string") => Ok(Self::Str),
            Some("int") => Ok(Self::Int),
            Some("float") => Ok(Self::Float),
            Some("bool") => Ok(Self::Bool),
            Some(other) => Err(BindError::config(format!(
                "to_string: unknown back kind '{other}'"
            ))),
        }
    }

    fn parse(self, adapter: &str, text: &str) -> Result<Value> {
        let trimmed = text.trim();
        let fail = |kind: &str| BindError::conversion(adapter, format!("'{text}' is not a valid {kind}"));
        match self {
            Self::Str => Ok(Value::Str(text.to_owned())),
            Self::Int => trimmed.parse::<i64>().map(Value::Int).map_err(|_| fail("int")),
            Self::Float => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| fail("float")),
            Self::Bool => trimmed
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| fail("bool")),
        }
    }
}

/// Renders any value as text, optionally through a `{}` format template.
#[derive(Debug, Clone)]
pub struct ToStringAdapter {
    format: Option<String>,
    precision: Option<u16>,
    back: TextKind,
}

impl ToStringAdapter {
    pub const ID: &'static str = "to_string";

    /// Build from options `format`, `precision`, and `back`.
    ///
    /// # Errors
    ///
    /// [`BindError::Config`] for a precision that is not a `u16`, a format without
    /// a `{}` placeholder, or an unknown back kind.
    pub fn from_options(options: &AdapterOptions) -> Result<Self> {
        let precision = options
            .get("precision")
            .map(|p| {
                p.trim()
                    .parse::<u16>()
                    .map_err(|_| BindError::config(format!("to_string: bad precision '{p}'")))
            })
            .transpose()?;
        let format = options.get("format").cloned();
        if let Some(fmt) = &format
            && !fmt.contains("{}")
        {
            return Err(BindError::config(format!(
                "to_string: format '{fmt}' has no {{}} placeholder"
            )));
        }
        Ok(Self {
            format,
            precision,
            back: TextKind::parse_option(options.get("back"))?,
        })
    }

    fn render(&self, value: &Value) -> String {
        match (value, self.precision) {
            (Value::Float(x), Some(p)) => {
                let p = usize::from(p);
                format!("{x:.p$}")
            }
            _ => value.to_string(),
        }
    }
}

impl ValueAdapter for ToStringAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn convert(&self, value: Value) -> Result<Value> {
        let text = self.render(&value);
        Ok(Value::Str(match &self.format {
            Some(fmt) => fmt.replacen("{}", &text, 1),
            None => text,
        }))
    }

    fn convert_back(&self, value: Value) -> Result<Value> {
        let Value::Str(text) = &value else {
            return Err(wrong_kind(Self::ID, "string", &value));
        };
        let inner = match &self.format {
            Some(fmt) => {
                let (prefix, suffix) = fmt.split_once("{}").unwrap_or((fmt.as_str(), ""));
                text.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_suffix(suffix))
                    .ok_or_else(|| {
                        BindError::conversion(Self::ID, format!("'{text}' does not match '{fmt}'"))
                    })?
            }
            None => text.as_str(),
        };
        self.back.parse(Self::ID, inner)
    }
}

/// Logical negation in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvertBoolAdapter;

impl InvertBoolAdapter {
    pub const ID: &'static str = "invert_bool";
}

impl ValueAdapter for InvertBoolAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn convert(&self, value: Value) -> Result<Value> {
        value
            .as_bool()
            .map(|b| Value::Bool(!b))
            .ok_or_else(|| wrong_kind(Self::ID, "bool", &value))
    }

    fn convert_back(&self, value: Value) -> Result<Value> {
        self.convert(value)
    }
}

/// Maps a bool onto two configurable labels.
#[derive(Debug, Clone)]
pub struct BoolToStringAdapter {
    when_true: String,
    when_false: String,
}

impl BoolToStringAdapter {
    pub const ID: &'static str = "bool_to_string";

    /// Build from options `true` and `false` (defaults: `"true"`/`"false"`).
    ///
    /// # Errors
    ///
    /// [`BindError::Config`] when both labels are identical, which would
    /// make the reverse conversion ambiguous.
    pub fn from_options(options: &AdapterOptions) -> Result<Self> {
        let when_true = options.get("true").cloned().unwrap_or_else(|| "true".into());
        let when_false = options
            .get("false")
            .cloned()
            .unwrap_or_else(|| "false".into());
        if when_true == when_false {
            return Err(BindError::config(format!(
                "bool_to_string: labels must differ (both '{when_true}')"
            )));
        }
        Ok(Self {
            when_true,
            when_false,
        })
    }
}

impl ValueAdapter for BoolToStringAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn convert(&self, value: Value) -> Result<Value> {
        match value.as_bool() {
            Some(true) => Ok(Value::Str(self.when_true.clone())),
            Some(false) => Ok(Value::Str(self.when_false.clone())),
            None => Err(wrong_kind(Self::ID, "bool", &value)),
        }
    }

    fn convert_back(&self, value: Value) -> Result<Value> {
        match value.as_str() {
            Some(s) if s == self.when_true => Ok(Value::Bool(true)),
            Some(s) if s == self.when_false => Ok(Value::Bool(false)),
            Some(s) => Err(BindError::conversion(
                Self::ID,
                format!("'{s}' is neither '{}' nor '{}'", self.when_true, self.when_false),
            )),
            None => Err(wrong_kind(Self::ID, "string", &value)),
        }
    }
}

/// Widens integers to floats; rounds on the way back.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntToFloatAdapter;

impl IntToFloatAdapter {
    pub const ID: &'static str = "int_to_float";
}

impl ValueAdapter for IntToFloatAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn convert(&self, value: Value) -> Result<Value> {
        match value {
            Value::Int(_) => Ok(Value::Float(value.as_float().unwrap_or_default())),
            other => Err(wrong_kind(Self::ID, "int", &other)),
        }
    }

    fn convert_back(&self, value: Value) -> Result<Value> {
        match value {
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            Value::Float(x) if (i64::MIN as f64..i64::MAX as f64).contains(&x.round()) => {
                Ok(Value::Int(x.round() as i64))
            }
            Value::Float(x) if x.is_finite() => Err(BindError::conversion(
                Self::ID,
                format!("{x} is out of int range"),
            )),
            Value::Float(x) => Err(BindError::conversion(Self::ID, format!("{x} is not finite"))),
            Value::Int(i) => Ok(Value::Int(i)),
            other => Err(wrong_kind(Self::ID, "float", &other)),
        }
    }
}

/// Parses text into an integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToIntAdapter;

impl StringToIntAdapter {
    pub const ID: &'static str = "string_to_int";
}

impl ValueAdapter for StringToIntAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn convert(&self, value: Value) -> Result<Value> {
        match &value {
            Value::Str(s) => TextKind::Int.parse(Self::ID, s),
            _ => Err(wrong_kind(Self::ID, "string", &value)),
        }
    }

    fn convert_back(&self, value: Value) -> Result<Value> {
        match value {
            Value::Int(i) => Ok(Value::Str(i.to_string())),
            other => Err(wrong_kind(Self::ID, "int", &other)),
        }
    }
}

/// Parses text into a float.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToFloatAdapter;

impl StringToFloatAdapter {
    pub const ID: &'static str = "string_to_float";
}

impl ValueAdapter for StringToFloatAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn convert(&self, value: Value) -> Result<Value> {
        match &value {
            Value::Str(s) => TextKind::Float.parse(Self::ID, s),
            _ => Err(wrong_kind(Self::ID, "string", &value)),
        }
    }

    fn convert_back(&self, value: Value) -> Result<Value> {
        match value.as_float() {
            Some(x) => Ok(Value::Str(x.to_string())),
            None => Err(wrong_kind(Self::ID, "float", &value)),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

type AdapterFactory = Box<dyn Fn(&AdapterOptions) -> Result<Rc<dyn ValueAdapter>>>;

/// Adapter factories keyed by id.
pub struct AdapterRegistry {
    factories: AHashMap<AdapterId, AdapterFactory>,
}

impl AdapterRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: AHashMap::new(),
        }
    }

    /// A registry pre-loaded with the built-in adapters.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ToStringAdapter::ID, |opts| {
            Ok(Rc::new(ToStringAdapter::from_options(opts)?))
        });
        registry.register(InvertBoolAdapter::ID, |_| Ok(Rc::new(InvertBoolAdapter)));
        registry.register(BoolToStringAdapter::ID, |opts| {
            Ok(Rc::new(BoolToStringAdapter::from_options(opts)?))
        });
        registry.register(IntToFloatAdapter::ID, |_| Ok(Rc::new(IntToFloatAdapter)));
        registry.register(StringToIntAdapter::ID, |_| Ok(Rc::new(StringToIntAdapter)));
        registry.register(StringToFloatAdapter::ID, |_| {
            Ok(Rc::new(StringToFloatAdapter))
        });
        registry
    }

    /// Register (or replace) the factory for `id`.
    pub fn register(
        &mut self,
        id: impl Into<AdapterId>,
        factory: impl Fn(&AdapterOptions) -> Result<Rc<dyn ValueAdapter>> + 'static,
    ) -> &mut Self {
        self.factories.insert(id.into(), Box::new(factory));
        self
    }

    /// Register a ready-made adapter instance, shared by every binding.
    pub fn register_instance(&mut self, adapter: Rc<dyn ValueAdapter>) -> &mut Self {
        let id = adapter.id().to_owned();
        self.register(id, move |_| Ok(Rc::clone(&adapter)))
    }

    /// Build the adapter registered under `id` with `options`.
    ///
    /// # Errors
    ///
    /// [`BindError::UnknownAdapter`] for unregistered ids; factory errors
    /// are propagated.
    pub fn create(&self, id: &str, options: &AdapterOptions) -> Result<Rc<dyn ValueAdapter>> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| BindError::UnknownAdapter { id: id.to_owned() })?;
        factory(options)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn opts(pairs: &[(&str, &str)]) -> AdapterOptions {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn to_string_plain() {
        let a = ToStringAdapter::from_options(&AdapterOptions::new()).unwrap();
        assert_eq!(a.convert(Value::Int(42)).unwrap(), Value::from("42"));
        assert_eq!(a.convert(Value::Null).unwrap(), Value::from(""));
    }

    #[test]
    fn to_string_format_and_precision() {
        let a = ToStringAdapter::from_options(&opts(&[
            ("format", "${} total"),
            ("precision", "2"),
            ("back", "float"),
        ]))
        .unwrap();
        assert_eq!(
            a.convert(Value::Float(3.14159)).unwrap(),
            Value::from("$3.14 total")
        );
        assert_eq!(
            a.convert_back(Value::from("$2.50 total")).unwrap(),
            Value::Float(2.5)
        );
        assert!(matches!(
            a.convert_back(Value::from("2.50")),
            Err(BindError::AdapterConversion { .. })
        ));
    }

    #[test]
    fn to_string_rejects_bad_options() {
        assert!(matches!(
            ToStringAdapter::from_options(&opts(&[("precision", "two")])),
            Err(BindError::Config { .. })
        ));
        assert!(matches!(
            ToStringAdapter::from_options(&opts(&[("precision", "100000000")])),
            Err(BindError::Config { .. })
        ));
        assert!(matches!(
            ToStringAdapter::from_options(&opts(&[("format", "no placeholder")])),
            Err(BindError::Config { .. })
        ));
        assert!(matches!(
            ToStringAdapter::from_options(&opts(&[("back", "date")])),
            Err(BindError::Config { .. })
        ));
    }

    #[test]
    fn to_string_back_int_rejects_partial_input() {
        let a = ToStringAdapter::from_options(&opts(&[("back", "int")])).unwrap();
        assert_eq!(a.convert_back(Value::from(" 12 ")).unwrap(), Value::Int(12));
        assert!(a.convert_back(Value::from("12a")).is_err());
    }

    #[test]
    fn invert_bool_both_ways() {
        let a = InvertBoolAdapter;
        assert_eq!(a.convert(Value::Bool(true)).unwrap(), Value::Bool(false));
        assert_eq!(a.convert_back(Value::Bool(false)).unwrap(), Value::Bool(true));
        assert!(a.convert(Value::Int(1)).is_err());
    }

    #[test]
    fn bool_to_string_labels() {
        let a = BoolToStringAdapter::from_options(&opts(&[("true", "On"), ("false", "Off")]))
            .unwrap();
        assert_eq!(a.convert(Value::Bool(true)).unwrap(), Value::from("On"));
        assert_eq!(a.convert_back(Value::from("Off")).unwrap(), Value::Bool(false));
        assert!(a.convert_back(Value::from("Maybe")).is_err());
        assert!(BoolToStringAdapter::from_options(&opts(&[("true", "x"), ("false", "x")])).is_err());
    }

    #[test]
    fn numeric_adapters() {
        assert_eq!(
            IntToFloatAdapter.convert(Value::Int(3)).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            IntToFloatAdapter.convert_back(Value::Float(2.6)).unwrap(),
            Value::Int(3)
        );
        assert!(IntToFloatAdapter.convert_back(Value::Float(f64::NAN)).is_err());
        for huge in [1e30, -1e30, 9.3e18] {
            assert!(matches!(
                IntToFloatAdapter.convert_back(Value::Float(huge)),
                Err(BindError::AdapterConversion { .. })
            ));
        }
        assert_eq!(
            StringToIntAdapter.convert(Value::from("17")).unwrap(),
            Value::Int(17)
        );
        assert_eq!(
            StringToFloatAdapter.convert_back(Value::Float(0.5)).unwrap(),
            Value::from("0.5")
        );
    }

    #[test]
    fn fn_adapter_one_way_by_default() {
        let a = FnAdapter::new("upper", |v| Ok(Value::Str(v.to_string().to_uppercase())));
        assert_eq!(a.convert(Value::from("ab")).unwrap(), Value::from("AB"));
        assert!(matches!(
            a.convert_back(Value::from("AB")),
            Err(BindError::AdapterConversion { .. })
        ));
    }

    #[test]
    fn registry_builtins_and_unknown() {
        let registry = AdapterRegistry::with_builtins();
        assert_eq!(
            registry.ids(),
            vec![
                "bool_to_string",
                "int_to_float",
                "invert_bool",
                "string_to_float",
                "string_to_int",
                "to_string"
            ]
        );
        let adapter = registry.create("invert_bool", &AdapterOptions::new()).unwrap();
        assert_eq!(adapter.id(), "invert_bool");
        assert!(matches!(
            registry.create("rot13", &AdapterOptions::new()),
            Err(BindError::UnknownAdapter { .. })
        ));
    }

    #[test]
    fn registry_instance_is_shared() {
        let mut registry = AdapterRegistry::new();
        let adapter: Rc<dyn ValueAdapter> = Rc::new(FnAdapter::new("id", Ok));
        registry.register_instance(Rc::clone(&adapter));
        let a = registry.create("id", &AdapterOptions::new()).unwrap();
        assert!(Rc::ptr_eq(&a, &adapter));
    }

    proptest! {
        #[test]
        fn formatted_int_text_parses_back(n in any::<i64>(), prefix in "[a-z ]{0,4}", suffix in "[a-z ]{0,4}") {
            let format = format!("{prefix}{{}}{suffix}");
            let adapter =
                ToStringAdapter::from_options(&opts(&[("format", format.as_str()), ("back", "int")])).unwrap();
            let text = adapter.convert(Value::Int(n)).unwrap();
            let expected = format!("{prefix}{n}{suffix}");
            prop_assert_eq!(text.as_str(), Some(expected.as_str()));
            prop_assert_eq!(adapter.convert_back(text).unwrap(), Value::Int(n));
        }
    }
}
