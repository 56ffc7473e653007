//! Model capability descriptions.
//!
//! A [`ModelCapabilities`] record names a model and lists the request
//! parameters it accepts, each with the JSON value type(s) it must carry.
//! Parameters absent from `features` are unsupported for that model.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The runtime type of a request parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
    /// Accepts any non-null value (structured schemas, tool lists, modes).
    Any,
}

impl ParamType {
    /// Whether `value` is an instance of this type.
    ///
    /// Integers do not satisfy `Float` and floats do not satisfy `Int`;
    /// callers are expected to send the declared numeric kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::Bool => value.is_boolean(),
            ParamType::Int => value.is_i64() || value.is_u64(),
            ParamType::Float => value.is_f64(),
            ParamType::String => value.is_string(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
            ParamType::Any => !value.is_null(),
        }
    }

    /// Describe the runtime type of an arbitrary JSON value.
    pub fn name_of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_f64() => "float",
            Value::Number(_) => "int",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Bool => write!(f, "bool"),
            ParamType::Int => write!(f, "int"),
            ParamType::Float => write!(f, "float"),
            ParamType::String => write!(f, "string"),
            ParamType::Array => write!(f, "array"),
            ParamType::Object => write!(f, "object"),
            ParamType::Any => write!(f, "any"),
        }
    }
}

impl FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bool" => Ok(ParamType::Bool),
            "int" => Ok(ParamType::Int),
            "float" => Ok(ParamType::Float),
            "string" | "str" => Ok(ParamType::String),
            "array" => Ok(ParamType::Array),
            "object" => Ok(ParamType::Object),
            "any" => Ok(ParamType::Any),
            other => Err(format!("invalid parameter type: '{other}'")),
        }
    }
}

/// One acceptable type, or a set of acceptable types, for a parameter.
///
/// Deserializes from either a single type name (`"float"`) or a list of
/// names (`["float", "int"]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedType {
    One(ParamType),
    OneOf(Vec<ParamType>),
}

impl ExpectedType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ExpectedType::One(t) => t.matches(value),
            ExpectedType::OneOf(types) => types.iter().any(|t| t.matches(value)),
        }
    }
}

impl From<ParamType> for ExpectedType {
    fn from(t: ParamType) -> Self {
        ExpectedType::One(t)
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedType::One(t) => write!(f, "{t}"),
            ExpectedType::OneOf(types) => {
                let names: Vec<String> = types.iter().map(|t| t.to_string()).collect();
                write!(f, "one of ({})", names.join(", "))
            }
        }
    }
}

/// Parameters every chat completion model accepts.
pub fn default_features() -> HashMap<String, ExpectedType> {
    HashMap::from([
        ("seed".to_string(), ParamType::Int.into()),
        ("response_format".to_string(), ParamType::Any.into()),
        ("max_tokens".to_string(), ParamType::Int.into()),
        ("stream".to_string(), ParamType::Bool.into()),
        ("max_completion_tokens".to_string(), ParamType::Int.into()),
    ])
}

/// Metadata and supported request parameters for one model.
///
/// Constructed once at startup and shared read-only between adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Model identifier, sent as the `model` field of every request.
    pub name: String,
    /// Informational revision tag (API version the entry was written against).
    #[serde(default)]
    pub version: String,
    /// Parameter name to expected value type(s).
    #[serde(default)]
    pub features: HashMap<String, ExpectedType>,
}

impl ModelCapabilities {
    /// Create a record with exactly the given features.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        features: HashMap<String, ExpectedType>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            features,
        }
    }

    /// Create a record whose features are [`default_features`] overlaid with `extra`.
    pub fn with_defaults<I, K>(name: impl Into<String>, version: impl Into<String>, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, ExpectedType)>,
        K: Into<String>,
    {
        let mut features = default_features();
        features.extend(extra.into_iter().map(|(k, v)| (k.into(), v)));
        Self::new(name, version, features)
    }

    /// Whether the model accepts the named parameter.
    pub fn supports(&self, feature: &str) -> bool {
        self.features.contains_key(feature)
    }

    /// Expected type(s) for a parameter, if supported.
    pub fn expected(&self, feature: &str) -> Option<&ExpectedType> {
        self.features.get(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_type_matches_numbers_strictly() {
        assert!(ParamType::Float.matches(&json!(0.7)));
        assert!(!ParamType::Float.matches(&json!(1)));
        assert!(ParamType::Int.matches(&json!(100)));
        assert!(!ParamType::Int.matches(&json!(0.5)));
    }

    #[test]
    fn test_any_rejects_only_null() {
        assert!(ParamType::Any.matches(&json!({"type": "json_object"})));
        assert!(ParamType::Any.matches(&json!("json")));
        assert!(!ParamType::Any.matches(&Value::Null));
    }

    #[test]
    fn test_expected_one_of() {
        let expected = ExpectedType::OneOf(vec![ParamType::String, ParamType::Object]);
        assert!(expected.matches(&json!("auto")));
        assert!(expected.matches(&json!({"type": "function"})));
        assert!(!expected.matches(&json!(true)));
        assert_eq!(expected.to_string(), "one of (string, object)");
    }

    #[test]
    fn test_with_defaults_merges_extra() {
        let caps = ModelCapabilities::with_defaults(
            "gpt-4o",
            "2024-12-01",
            [("temperature", ExpectedType::from(ParamType::Float))],
        );
        assert!(caps.supports("temperature"));
        assert!(caps.supports("seed"));
        assert!(caps.supports("max_completion_tokens"));
        assert!(!caps.supports("top_p"));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml_str = r#"
name = "custom"
version = "2025-01-01"

[features]
temperature = "float"
tool_choice = ["string", "object"]
"#;
        let caps: ModelCapabilities = toml::from_str(toml_str).unwrap();
        assert_eq!(caps.name, "custom");
        assert_eq!(caps.expected("temperature"), Some(&ExpectedType::One(ParamType::Float)));
        assert_eq!(
            caps.expected("tool_choice"),
            Some(&ExpectedType::OneOf(vec![ParamType::String, ParamType::Object]))
        );
    }

    #[test]
    fn test_name_of() {
        assert_eq!(ParamType::name_of(&json!(1)), "int");
        assert_eq!(ParamType::name_of(&json!(1.5)), "float");
        assert_eq!(ParamType::name_of(&json!("x")), "string");
    }
}
