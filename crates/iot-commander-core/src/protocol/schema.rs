//! Command schema published by a device at `GET /commands`.
//!
//! The schema is a JSON object mapping each command name to an object that
//! maps parameter names to type tags:
//!
//! ```json
//! {"setTemp": {"value": "int"}, "toggle": {"power": "boolean"}}
//! ```
//!
//! Parsing is fail-closed: any shape other than the above is an error, never
//! a partial result.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

/// Type of a command parameter as declared by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Boolean,
    Int,
    Float,
    Text,
}

impl ParameterType {
    pub const ALL: [ParameterType; 4] = [
        ParameterType::Boolean,
        ParameterType::Int,
        ParameterType::Float,
        ParameterType::Text,
    ];

    /// Parse a wire tag. Returns `None` for anything but the four known tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_tag() == tag)
    }

    /// Wire tag of this type
    pub fn as_tag(&self) -> &'static str {
        match self {
            ParameterType::Boolean => "boolean",
            ParameterType::Int => "int",
            ParameterType::Float => "float",
            ParameterType::Text => "text",
        }
    }

    /// Check that `value` has exactly this semantic type.
    pub fn validate(&self, value: &ParamValue) -> bool {
        matches!(
            (self, value),
            (ParameterType::Boolean, ParamValue::Bool(_))
                | (ParameterType::Int, ParamValue::Int(_))
                | (ParameterType::Float, ParamValue::Float(_))
                | (ParameterType::Text, ParamValue::Text(_))
        )
    }
}

impl FromStr for ParameterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unknown parameter type '{}'", s))
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A value supplied for a command parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Coerce user-entered text into the declared type.
    ///
    /// Text that does not parse as `ty` is kept as `Text` so validation can
    /// report the mismatch instead of silently dropping the value.
    pub fn parse_as(ty: ParameterType, raw: &str) -> Self {
        let parsed = match ty {
            ParameterType::Boolean => raw.parse::<bool>().ok().map(ParamValue::Bool),
            ParameterType::Int => raw.parse::<i64>().ok().map(ParamValue::Int),
            ParameterType::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(ParamValue::Float),
            ParameterType::Text => None,
        };
        parsed.unwrap_or_else(|| ParamValue::Text(raw.to_string()))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            // Debug keeps the fractional part, so 3.0 is sent as "3.0" not "3"
            ParamValue::Float(v) => write!(f, "{:?}", v),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ParameterDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParameterType,
}

impl ParameterDescription {
    pub fn new(name: impl Into<String>, ty: ParameterType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A command the device accepts, with its parameters in published order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CommandDescription {
    pub name: String,
    pub params: Vec<ParameterDescription>,
}

impl CommandDescription {
    pub fn new(name: impl Into<String>, params: Vec<ParameterDescription>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParameterDescription> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// JSON object kept in document order. Duplicate keys are rejected.
struct OrderedEntries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedEntries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, V)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(de::Error::custom(format_args!("duplicate key `{}`", key)));
                    }
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Parse a `/commands` response body.
pub fn parse_schema(body: &str) -> Result<Vec<CommandDescription>, serde_json::Error> {
    let raw: OrderedEntries<OrderedEntries<ParameterType>> = serde_json::from_str(body)?;

    Ok(raw
        .0
        .into_iter()
        .map(|(name, params)| CommandDescription {
            name,
            params: params
                .0
                .into_iter()
                .map(|(name, ty)| ParameterDescription { name, ty })
                .collect(),
        })
        .collect())
}
