//! Target definition and builder

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::condition::{Condition, Environment};
use super::errors::{ActionError, GraphError};
use std::fmt;

/// Maximum length of a target identifier.
pub const MAX_ID_LEN: usize = 100;

/// Side-effect free predicate deciding whether a target's action runs.
pub type Guard<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// Side-effecting body of a target.
pub type Action<C> = Box<dyn Fn(&C) -> Result<(), ActionError> + Send + Sync>;

/// Contexts that expose an environment snapshot to declarative guards.
pub trait HasEnvironment {
    /// The environment captured at process start.
    fn environment(&self) -> &Environment;
}

/// A named build step with dependencies, an optional guard, and an action.
///
/// Targets are immutable once built; the per-run "completed" state lives in
/// the graph's executor, not here.
pub struct Target<C> {
    id: String,
    description: Option<String>,
    depends_on: Vec<String>,
    guard: Option<Guard<C>>,
    guard_label: Option<String>,
    action: Action<C>,
}

impl<C> Target<C> {
    /// Starts building a target with the given identifier.
    pub fn new(id: impl Into<String>) -> TargetBuilder<C> {
        TargetBuilder::new(id)
    }

    /// Target identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// One-line description, if any
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared dependencies in declaration order
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Human-readable form of the guard, if any
    pub fn guard_label(&self) -> Option<&str> {
        self.guard_label.as_deref()
    }

    /// Returns true if the target has a guard
    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    /// Evaluates the guard; unguarded targets always run.
    pub fn should_run(&self, ctx: &C) -> bool {
        self.guard.as_ref().is_none_or(|guard| guard(ctx))
    }

    /// Runs the action.
    ///
    /// # Errors
    ///
    /// Propagates whatever the action returns.
    pub fn execute(&self, ctx: &C) -> Result<(), ActionError> {
        (self.action)(ctx)
    }

    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        validate_id(&self.id)?;
        for dep in &self.depends_on {
            validate_id(dep).map_err(|_| GraphError::InvalidTarget {
                id: self.id.clone(),
                reason: format!("invalid dependency identifier '{dep}'"),
            })?;
        }
        Ok(())
    }
}

fn validate_id(id: &str) -> Result<(), GraphError> {
    let invalid = |reason: String| GraphError::InvalidTarget {
        id: id.to_string(),
        reason,
    };

    if id.is_empty() {
        return Err(invalid("identifier cannot be empty".to_string()));
    }
    if id.len() > MAX_ID_LEN {
        return Err(invalid(format!(
            "identifier too long: max {MAX_ID_LEN} characters, got {}",
            id.len()
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(invalid("identifier contains invalid characters".to_string()));
    }
    Ok(())
}

impl<C> fmt::Debug for Target<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("depends_on", &self.depends_on)
            .field("guard", &self.guard_label)
            .finish_non_exhaustive()
    }
}

impl<C> fmt::Display for Target<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.id)?;
        if !self.depends_on.is_empty() {
            write!(f, " <- [{}]", self.depends_on.join(", "))?;
        }
        Ok(())
    }
}

/// Builder for creating targets
pub struct TargetBuilder<C> {
    id: String,
    description: Option<String>,
    depends_on: Vec<String>,
    guard: Option<Guard<C>>,
    guard_label: Option<String>,
}

impl<C> TargetBuilder<C> {
    /// Creates a new target builder
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            depends_on: Vec::new(),
            guard: None,
            guard_label: None,
        }
    }

    /// Sets the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a dependency; dependencies run in the order they are declared
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.depends_on.push(id.into());
        self
    }

    /// Sets a predicate guard
    pub fn only_when<F>(mut self, guard: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Box::new(guard));
        self.guard_label = Some("custom predicate".to_string());
        self
    }

    /// Sets the action and finishes the target
    pub fn executes<F>(self, action: F) -> Target<C>
    where
        F: Fn(&C) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        Target {
            id: self.id,
            description: self.description,
            depends_on: self.depends_on,
            guard: self.guard,
            guard_label: self.guard_label,
            action: Box::new(action),
        }
    }

    /// Finishes a target that only aggregates its dependencies
    pub fn build(self) -> Target<C> {
        self.executes(|_| Ok(()))
    }
}

impl<C: HasEnvironment> TargetBuilder<C> {
    /// Sets a declarative guard evaluated against the context's environment
    pub fn only_when_condition(mut self, condition: Condition) -> Self {
        self.guard_label = Some(condition.to_string());
        self.guard = Some(Box::new(move |ctx: &C| {
            condition.evaluate(ctx.environment())
        }));
        self
    }
}
