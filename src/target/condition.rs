//! Declarative guard conditions
//!
//! A [`Condition`] is evaluated against an [`Environment`] snapshot that is
//! captured once when the process starts. Guards built from conditions are
//! therefore free of side effects and return the same answer every time
//! they are asked within one run.

#![allow(clippy::must_use_candidate)]

use super::errors::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;

/// Immutable snapshot of environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Environment {
    /// Variables as key-value pairs.
    #[serde(flatten)]
    pub vars: HashMap<String, String>,
}

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are left out.
    #[must_use]
    pub fn capture() -> Self {
        Self::from_vars_os(std::env::vars_os())
    }

    pub(crate) fn from_vars_os<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let vars = vars
            .into_iter()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (key, _) => {
                    let key = match &key {
                        Ok(key) => key.clone(),
                        Err(raw) => raw.to_string_lossy().into_owned(),
                    };
                    tracing::debug!(%key, "Skipping non-Unicode environment variable");
                    None
                }
            })
            .collect();
        Self { vars }
    }

    /// Sets a variable.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Gets a variable by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Gets a variable only when it is present and not blank.
    #[must_use]
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }
}

/// Guard conditions for targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Variable is present and non-empty
    EnvSet {
        /// Variable name
        name: String,
    },

    /// Variable equals the given value
    EnvEquals {
        /// Variable name
        name: String,
        /// Expected value
        value: String,
    },

    /// Inverts the inner condition
    Not {
        /// Condition to invert
        condition: Box<Condition>,
    },

    /// All conditions must be true
    AllOf {
        /// List of conditions
        conditions: Vec<Condition>,
    },

    /// At least one condition must be true
    AnyOf {
        /// List of conditions
        conditions: Vec<Condition>,
    },
}

impl Condition {
    /// Creates an env-set condition
    pub fn env_set(name: impl Into<String>) -> Self {
        Self::EnvSet { name: name.into() }
    }

    /// Creates an env-equals condition
    pub fn env_equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::EnvEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a negated condition
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not {
            condition: Box::new(condition),
        }
    }

    /// Creates an all-of condition
    pub fn all_of(conditions: Vec<Condition>) -> Self {
        Self::AllOf { conditions }
    }

    /// Creates an any-of condition
    pub fn any_of(conditions: Vec<Condition>) -> Self {
        Self::AnyOf { conditions }
    }

    /// Evaluates the condition against an environment snapshot.
    pub fn evaluate(&self, env: &Environment) -> bool {
        match self {
            Self::EnvSet { name } => env.non_empty(name).is_some(),
            Self::EnvEquals { name, value } => env.get(name) == Some(value.as_str()),
            Self::Not { condition } => !condition.evaluate(env),
            Self::AllOf { conditions } => conditions.iter().all(|c| c.evaluate(env)),
            Self::AnyOf { conditions } => conditions.iter().any(|c| c.evaluate(env)),
        }
    }

    /// Checks that every variable name in the condition is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidTarget`] naming `target` on an empty name.
    pub fn validate(&self, target: &str) -> Result<(), GraphError> {
        match self {
            Self::EnvSet { name } | Self::EnvEquals { name, .. } => {
                if name.trim().is_empty() {
                    return Err(GraphError::InvalidTarget {
                        id: target.to_string(),
                        reason: "environment variable name cannot be empty".to_string(),
                    });
                }
            }
            Self::Not { condition } => condition.validate(target)?,
            Self::AllOf { conditions } | Self::AnyOf { conditions } => {
                for cond in conditions {
                    cond.validate(target)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvSet { name } => write!(f, "${name} is set"),
            Self::EnvEquals { name, value } => write!(f, "${name} == '{value}'"),
            Self::Not { condition } => write!(f, "not ({condition})"),
            Self::AllOf { conditions } => write_joined(f, conditions, " and "),
            Self::AnyOf { conditions } => write_joined(f, conditions, " or "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, conditions: &[Condition], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, cond) in conditions.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{cond}")?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sees_process_environment() {
        let env = Environment::capture();
        assert_eq!(env.get("PATH").is_some(), std::env::var_os("PATH").is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_skips_non_unicode_variables() {
        use std::os::unix::ffi::OsStringExt;

        let env = Environment::from_vars_os([
            (OsString::from("CI"), OsString::from("true")),
            (OsString::from("RAW_VALUE"), OsString::from_vec(vec![0xff, 0xfe])),
            (OsString::from_vec(vec![b'K', 0xff]), OsString::from("x")),
        ]);

        assert_eq!(env.get("CI"), Some("true"));
        assert_eq!(env.get("RAW_VALUE"), None);
        assert_eq!(env.vars.len(), 1);
    }

    fn env() -> Environment {
        Environment::new()
            .set("DIST_ROOT", "/srv/dist")
            .set("BLANK", "  ")
            .set("CI", "true")
    }

    #[test]
    fn test_env_set() {
        assert!(Condition::env_set("DIST_ROOT").evaluate(&env()));
        assert!(!Condition::env_set("BLANK").evaluate(&env()));
        assert!(!Condition::env_set("MISSING").evaluate(&env()));
    }

    #[test]
    fn test_env_equals() {
        assert!(Condition::env_equals("CI", "true").evaluate(&env()));
        assert!(!Condition::env_equals("CI", "false").evaluate(&env()));
        assert!(!Condition::env_equals("MISSING", "").evaluate(&env()));
    }

    #[test]
    fn test_composite_conditions() {
        let all = Condition::all_of(vec![
            Condition::env_set("DIST_ROOT"),
            Condition::not(Condition::env_set("CI")),
        ]);
        assert!(!all.evaluate(&env()));

        let any = Condition::any_of(vec![
            Condition::env_set("MISSING"),
            Condition::env_equals("CI", "true"),
        ]);
        assert!(any.evaluate(&env()));

        assert!(Condition::all_of(vec![]).evaluate(&env()));
        assert!(!Condition::any_of(vec![]).evaluate(&env()));
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let cond = Condition::env_set("DIST_ROOT");
        let snapshot = env();
        let first = cond.evaluate(&snapshot);
        assert_eq!(first, cond.evaluate(&snapshot));
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let cond = Condition::any_of(vec![Condition::env_set("OK"), Condition::env_set("")]);
        assert!(matches!(
            cond.validate("Publish"),
            Err(GraphError::InvalidTarget { id, .. }) if id == "Publish"
        ));
        assert!(Condition::env_set("OK").validate("Publish").is_ok());
    }

    #[test]
    fn test_display() {
        let cond = Condition::all_of(vec![
            Condition::env_set("A"),
            Condition::not(Condition::env_equals("B", "x")),
        ]);
        assert_eq!(cond.to_string(), "($A is set and not ($B == 'x'))");
    }

    #[test]
    fn test_condition_serialize() {
        let cond = Condition::env_set("DIST_ROOT");
        let json = serde_json::to_string(&cond).unwrap();
        assert_eq!(json, r#"{"env_set":{"name":"DIST_ROOT"}}"#);
    }
}
