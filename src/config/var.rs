//! A single typed configuration variable and its string casting rules.

use crate::error::ConfigError;
use std::fmt;

/// The type a configuration variable holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfType {
    Str,
    Int,
    Float,
    Bool,
}

impl fmt::Display for ConfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfType::Str => "str",
            ConfType::Int => "int",
            ConfType::Float => "float",
            ConfType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// A configuration value.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ConfValue {
    pub fn conf_type(&self) -> ConfType {
        match self {
            ConfValue::Str(_) => ConfType::Str,
            ConfValue::Int(_) => ConfType::Int,
            ConfValue::Float(_) => ConfType::Float,
            ConfValue::Bool(_) => ConfType::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ConfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfValue::Str(s) => f.write_str(s),
            ConfValue::Int(n) => write!(f, "{}", n),
            ConfValue::Float(n) => write!(f, "{}", n),
            ConfValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ConfValue {
    fn from(s: &str) -> Self {
        ConfValue::Str(s.to_string())
    }
}

impl From<String> for ConfValue {
    fn from(s: String) -> Self {
        ConfValue::Str(s)
    }
}

impl From<i64> for ConfValue {
    fn from(n: i64) -> Self {
        ConfValue::Int(n)
    }
}

impl From<f64> for ConfValue {
    fn from(n: f64) -> Self {
        ConfValue::Float(n)
    }
}

impl From<bool> for ConfValue {
    fn from(b: bool) -> Self {
        ConfValue::Bool(b)
    }
}

pub const TRUE_STRINGS: &[&str] = &["t", "true", "yes", "on"];
pub const FALSE_STRINGS: &[&str] = &["f", "false", "no", "off"];

/// How strings are cast to booleans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastPolicy {
    /// Integer strings are truthy when nonzero ("5" is true, "0" is false).
    pub nonzero_ints_are_true: bool,
    /// Strings outside the true/false token sets are false instead of an error.
    pub unknown_strings_are_false: bool,
}

impl Default for CastPolicy {
    fn default() -> Self {
        CastPolicy {
            nonzero_ints_are_true: true,
            unknown_strings_are_false: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Slot {
    NotSet,
    Set(Option<ConfValue>),
}

/// A configuration variable: name, optional typed default, and a value that
/// stays unset until loaded from the environment or set explicitly.
///
/// A variable declared with neither default nor type is untyped: it can only
/// ever hold an absent value.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfVar {
    name: String,
    default: Option<ConfValue>,
    conf_type: Option<ConfType>,
    slot: Slot,
}

impl ConfVar {
    /// Declare a variable. Without `conf_type` the type is inferred from `default`.
    pub fn new(
        name: impl Into<String>,
        default: Option<ConfValue>,
        conf_type: Option<ConfType>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let conf_type = match (&default, conf_type) {
            (Some(d), Some(t)) if d.conf_type() != t => {
                return Err(ConfigError::InvalidConfVarType(format!(
                    "{}: default {} is not an instance of {}",
                    name, d, t
                )))
            }
            (_, Some(t)) => Some(t),
            (Some(d), None) => Some(d.conf_type()),
            (None, None) => None,
        };
        Ok(ConfVar {
            name,
            default,
            conf_type,
            slot: Slot::NotSet,
        })
    }

    /// Shorthand for a variable whose type is inferred from its default.
    pub fn with_default(name: impl Into<String>, default: impl Into<ConfValue>) -> Self {
        let default = default.into();
        let conf_type = Some(default.conf_type());
        ConfVar {
            name: name.into(),
            default: Some(default),
            conf_type,
            slot: Slot::NotSet,
        }
    }

    /// Shorthand for a variable with no default.
    pub fn typed(name: impl Into<String>, conf_type: ConfType) -> Self {
        ConfVar {
            name: name.into(),
            default: None,
            conf_type: Some(conf_type),
            slot: Slot::NotSet,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` for an untyped variable.
    pub fn conf_type(&self) -> Option<ConfType> {
        self.conf_type
    }

    pub fn default_value(&self) -> Option<&ConfValue> {
        self.default.as_ref()
    }

    pub fn is_set(&self) -> bool {
        matches!(self.slot, Slot::Set(_))
    }

    /// The set value, or the default while unset.
    pub fn value(&self) -> Option<&ConfValue> {
        match &self.slot {
            Slot::NotSet => self.default.as_ref(),
            Slot::Set(v) => v.as_ref(),
        }
    }

    /// Assign a value. It must match the variable's type: typed variables
    /// reject an absent value and untyped variables accept nothing else.
    pub fn set(&mut self, value: Option<ConfValue>) -> Result<(), ConfigError> {
        match (&value, self.conf_type) {
            (Some(v), Some(t)) if v.conf_type() == t => {}
            (None, None) => {}
            (Some(v), t) => {
                return Err(ConfigError::InvalidConfVarType(format!(
                    "{}: {} is not an instance of {}",
                    self.name,
                    v,
                    type_name(t)
                )))
            }
            (None, Some(t)) => {
                return Err(ConfigError::InvalidConfVarType(format!(
                    "{}: an absent value is not an instance of {}",
                    self.name, t
                )))
            }
        }
        self.slot = Slot::Set(value);
        Ok(())
    }

    /// Cast a raw string (usually from the environment) to this variable's type.
    pub fn cast(&self, raw: &str, policy: CastPolicy) -> Result<ConfValue, ConfigError> {
        let invalid = |what: &str| {
            ConfigError::InvalidConfVarValue(format!("{}: {} is not a valid {} value", self.name, raw, what))
        };
        match self.conf_type {
            Some(ConfType::Bool) => cast_bool(raw, policy).ok_or_else(|| invalid("boolean")),
            Some(ConfType::Int) => raw.trim().parse::<i64>().map(ConfValue::Int).map_err(|_| invalid("integer")),
            Some(ConfType::Float) => raw.trim().parse::<f64>().map(ConfValue::Float).map_err(|_| invalid("float")),
            Some(ConfType::Str) => Ok(ConfValue::Str(raw.to_string())),
            None => Err(invalid("untyped")),
        }
    }

    /// Environment key: `PREFIX_NAME` uppercased, or `NAME` without a prefix.
    pub fn env_key(&self, prefix: Option<&str>) -> String {
        match prefix {
            Some(p) if !p.is_empty() => format!("{}_{}", p, self.name).to_uppercase(),
            _ => self.name.to_uppercase(),
        }
    }
}

fn type_name(conf_type: Option<ConfType>) -> String {
    conf_type.map_or_else(|| "none".to_string(), |t| t.to_string())
}

fn cast_bool(raw: &str, policy: CastPolicy) -> Option<ConfValue> {
    if policy.nonzero_ints_are_true {
        if let Ok(n) = raw.trim().parse::<i64>() {
            return Some(ConfValue::Bool(n != 0));
        }
    }
    let lowered = raw.trim().to_lowercase();
    if TRUE_STRINGS.contains(&lowered.as_str()) {
        Some(ConfValue::Bool(true))
    } else if FALSE_STRINGS.contains(&lowered.as_str()) {
        Some(ConfValue::Bool(false))
    } else if policy.unknown_strings_are_false {
        Some(ConfValue::Bool(false))
    } else {
        None
    }
}
