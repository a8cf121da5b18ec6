//! An ordered group of configuration variables sharing an environment prefix.

use crate::config::var::{CastPolicy, ConfType, ConfValue, ConfVar};
use crate::error::ConfigError;

/// Configuration variables pulled from the environment, falling back to defaults.
///
/// Variables keep their declaration order. With a prefix, each variable is read
/// from `{PREFIX}_{NAME}` (uppercased).
#[derive(Clone, Debug, Default)]
pub struct Config {
    prefix: Option<String>,
    vars: Vec<ConfVar>,
    policy: CastPolicy,
}

impl Config {
    pub fn new(vars: impl IntoIterator<Item = ConfVar>) -> Self {
        let mut config = Config::default();
        for var in vars {
            config.insert(var);
        }
        config
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_cast_policy(mut self, policy: CastPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Add a variable, replacing any variable with the same name in place.
    fn insert(&mut self, var: ConfVar) {
        match self.vars.iter_mut().find(|v| v.name() == var.name()) {
            Some(existing) => *existing = var,
            None => self.vars.push(var),
        }
    }

    fn var(&self, name: &str) -> Result<&ConfVar, ConfigError> {
        self.vars
            .iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| ConfigError::NoSuchConfVar(name.to_string()))
    }

    /// Load values from the process environment.
    pub fn load(&mut self) -> Result<(), ConfigError> {
        self.load_from(|key| std::env::var(key).ok())
    }

    /// Load values from `lookup`, which maps an environment key to its raw value.
    pub fn load_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = self.prefix.clone();
        let policy = self.policy;
        for var in &mut self.vars {
            let key = var.env_key(prefix.as_deref());
            if let Some(raw) = lookup(&key) {
                let value = var.cast(&raw, policy)?;
                tracing::debug!(key = %key, "config value loaded from environment");
                var.set(Some(value))?;
            }
        }
        Ok(())
    }

    /// Current value of a declared variable (`None` when it has no value).
    pub fn get(&self, name: &str) -> Result<Option<&ConfValue>, ConfigError> {
        Ok(self.var(name)?.value())
    }

    pub fn get_str(&self, name: &str) -> Result<Option<&str>, ConfigError> {
        match self.get(name)? {
            None => Ok(None),
            Some(v) => v.as_str().map(Some).ok_or_else(|| mismatch(name, v, ConfType::Str)),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        match self.get(name)? {
            None => Ok(None),
            Some(v) => v.as_bool().map(Some).ok_or_else(|| mismatch(name, v, ConfType::Bool)),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<Option<i64>, ConfigError> {
        match self.get(name)? {
            None => Ok(None),
            Some(v) => v.as_int().map(Some).ok_or_else(|| mismatch(name, v, ConfType::Int)),
        }
    }

    /// Set a variable, declaring it first if it does not exist. A new variable
    /// takes `value` as its default and `conf_type` as its type; with neither
    /// it is untyped and holds only an absent value.
    pub fn set(
        &mut self,
        name: &str,
        value: Option<ConfValue>,
        conf_type: Option<ConfType>,
    ) -> Result<(), ConfigError> {
        if self.var(name).is_err() {
            self.vars.push(ConfVar::new(name, value.clone(), conf_type)?);
        }
        match self.vars.iter_mut().find(|v| v.name() == name) {
            Some(var) => var.set(value),
            None => Err(ConfigError::NoSuchConfVar(name.to_string())),
        }
    }

    /// Name/value pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ConfValue>)> {
        self.vars.iter().map(|v| (v.name(), v.value()))
    }

    pub fn env_keys(&self) -> Vec<String> {
        self.vars.iter().map(|v| v.env_key(self.prefix.as_deref())).collect()
    }
}

fn mismatch(name: &str, value: &ConfValue, expected: ConfType) -> ConfigError {
    ConfigError::InvalidConfVarType(format!("{}: {} is not an instance of {}", name, value, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn db() -> Config {
        Config::new([
            ConfVar::typed("user", ConfType::Str),
            ConfVar::with_default("host", "local/local.sqlite"),
            ConfVar::with_default("engine", "sqlite"),
        ])
        .with_prefix("DB")
    }

    #[test]
    fn get_unknown_name_fails() {
        let err = db().get("nope").unwrap_err();
        assert_eq!(err, ConfigError::NoSuchConfVar("nope".into()));
    }

    #[test]
    fn load_reads_prefixed_keys_only() {
        let vars = env(&[("DB_USER", "reader"), ("HOST", "ignored")]);
        let mut conf = db();
        conf.load_from(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(conf.get_str("user").unwrap(), Some("reader"));
        assert_eq!(conf.get_str("host").unwrap(), Some("local/local.sqlite"));
    }

    #[test]
    fn load_casts_booleans() {
        let vars = env(&[("FLASK_DEBUG", "yes"), ("FLASK_TESTING", "0")]);
        let mut conf = Config::new([
            ConfVar::with_default("DEBUG", false),
            ConfVar::with_default("TESTING", true),
        ])
        .with_prefix("FLASK");
        conf.load_from(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(conf.get_bool("DEBUG").unwrap(), Some(true));
        assert_eq!(conf.get_bool("TESTING").unwrap(), Some(false));
    }

    #[test]
    fn load_rejects_bad_boolean() {
        let vars = env(&[("FLASK_DEBUG", "sometimes")]);
        let mut conf = Config::new([ConfVar::with_default("DEBUG", false)]).with_prefix("FLASK");
        let err = conf.load_from(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfVarValue(_)));
    }

    #[test]
    fn set_declares_missing_vars() {
        let mut conf = db();
        conf.set("port", Some(ConfValue::Int(5432)), None).unwrap();
        assert_eq!(conf.get_int("port").unwrap(), Some(5432));
        assert!(conf.set("engine", Some(ConfValue::Bool(true)), None).is_err());
    }

    #[test]
    fn set_declares_untyped_absent_vars() {
        let mut conf = Config::new([]);
        conf.set("socket", None, None).unwrap();
        assert_eq!(conf.get("socket").unwrap(), None);
        assert!(matches!(
            conf.set("socket", Some(ConfValue::from("/tmp/db.sock")), None),
            Err(ConfigError::InvalidConfVarType(_))
        ));
    }

    #[test]
    fn set_rejects_absent_value_on_typed_vars() {
        let mut conf = db();
        let err = conf.set("user", None, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfVarType(_)));
        assert_eq!(conf.get_str("host").unwrap(), Some("local/local.sqlite"));

        let err = conf.set("socket", None, Some(ConfType::Str)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfVarType(_)));
        assert_eq!(conf.get("socket").unwrap(), None);
    }

    #[test]
    fn iter_keeps_declaration_order() {
        let names: Vec<_> = db().iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["user", "host", "engine"]);
        assert_eq!(db().env_keys(), ["DB_USER", "DB_HOST", "DB_ENGINE"]);
    }
}
