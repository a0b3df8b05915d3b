//! Target graph: registration, resolution and execution
//!
//! Targets live in an arena and refer to each other by identifier. Resolution
//! is a depth-first topological sort starting from the requested terminal
//! target: dependencies are visited left to right in declaration order and a
//! target is emitted after all of its dependencies, so the result is fully
//! deterministic for a given registration.
//!
//! Identifiers are matched case-insensitively and reported with the casing
//! they were registered with.

use super::errors::{GraphError, RunError};
use super::target_def::Target;
use super::types::{PlanEntry, RunReport, TargetOutcome, TargetStatus};
use ahash::AHashMap;
use std::time::Instant;
use uuid::Uuid;

/// A set of targets indexed by identifier
pub struct TargetGraph<C> {
    targets: Vec<Target<C>>,
    index: AHashMap<String, usize>,
}

impl<C> TargetGraph<C> {
    /// Creates an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Adds a target.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateTarget`] if the identifier is taken and
    /// [`GraphError::InvalidTarget`] if the target is malformed.
    pub fn register(&mut self, target: Target<C>) -> Result<(), GraphError> {
        target.validate()?;

        let key = normalize(target.id());
        if self.index.contains_key(&key) {
            return Err(GraphError::DuplicateTarget {
                id: target.id().to_string(),
            });
        }

        tracing::trace!(id = target.id(), deps = ?target.depends_on(), "Registered target");
        self.index.insert(key, self.targets.len());
        self.targets.push(target);
        Ok(())
    }

    /// Looks up a target by identifier
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Target<C>> {
        self.index.get(&normalize(id)).map(|&i| &self.targets[i])
    }

    /// Returns true if a target with this identifier exists
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(&normalize(id))
    }

    /// Iterates targets in registration order
    pub fn targets(&self) -> impl Iterator<Item = &Target<C>> {
        self.targets.iter()
    }

    /// Number of registered targets
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if no target is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns the identifiers required to reach `terminal`, in execution order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownTarget`] if `terminal` or any transitive
    /// dependency is not registered, and [`GraphError::CycleDetected`] if the
    /// dependencies loop back onto the resolution stack.
    pub fn resolve(&self, terminal: &str) -> Result<Vec<String>, GraphError> {
        Ok(self
            .resolve_indices(terminal)?
            .into_iter()
            .map(|i| self.targets[i].id().to_string())
            .collect())
    }

    /// Resolves `terminal` and reports which targets would run right now.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub fn plan(&self, terminal: &str, ctx: &C) -> Result<Vec<PlanEntry>, GraphError> {
        Ok(self
            .resolve_indices(terminal)?
            .into_iter()
            .map(|i| {
                let target = &self.targets[i];
                PlanEntry {
                    target: target.id().to_string(),
                    depends_on: target.depends_on().to_vec(),
                    will_run: target.should_run(ctx),
                }
            })
            .collect())
    }

    /// Resolves `terminal` and executes each required target once, in order.
    ///
    /// A target whose guard is false is skipped but counts as completed, so
    /// its dependents still run. The first failing action aborts the run and
    /// later targets are left unexecuted.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Graph`] before any action runs if resolution
    /// fails, or [`RunError::TargetExecution`] naming the failed target.
    pub fn run(&self, terminal: &str, ctx: &C) -> Result<RunReport, RunError> {
        let order = self.resolve_indices(terminal)?;
        let run_id = Uuid::new_v4().to_string();
        let terminal_id = self
            .get(terminal)
            .map_or_else(|| terminal.to_string(), |t| t.id().to_string());

        tracing::info!(
            run_id = %run_id,
            terminal = %terminal_id,
            targets = order.len(),
            "Starting run"
        );

        let mut completed = vec![false; self.targets.len()];
        let mut outcomes = Vec::with_capacity(order.len());

        for idx in order {
            if completed[idx] {
                continue;
            }
            let target = &self.targets[idx];
            let span = tracing::info_span!("target", id = target.id());
            let _enter = span.enter();
            let start = Instant::now();

            let status = if target.should_run(ctx) {
                tracing::info!("Executing target");
                if let Err(cause) = target.execute(ctx) {
                    tracing::error!(error = %cause, "Target failed, aborting run");
                    return Err(RunError::TargetExecution {
                        target: target.id().to_string(),
                        cause,
                    });
                }
                TargetStatus::Executed
            } else {
                tracing::info!(
                    guard = target.guard_label().unwrap_or_default(),
                    "Guard is false, skipping target"
                );
                TargetStatus::Skipped
            };

            let duration = start.elapsed();
            tracing::info!(
                status = %status,
                duration_ms = duration.as_millis(),
                "Target completed"
            );
            completed[idx] = true;
            outcomes.push(TargetOutcome {
                target: target.id().to_string(),
                status,
                duration,
            });
        }

        Ok(RunReport {
            run_id,
            terminal: terminal_id,
            outcomes,
        })
    }

    fn lookup(&self, id: &str, required_by: Option<&str>) -> Result<usize, GraphError> {
        self.index
            .get(&normalize(id))
            .copied()
            .ok_or_else(|| GraphError::UnknownTarget {
                id: id.to_string(),
                required_by: required_by.map(str::to_string),
            })
    }

    fn resolve_indices(&self, terminal: &str) -> Result<Vec<usize>, GraphError> {
        let root = self.lookup(terminal, None)?;
        let mut walk = Walk {
            done: vec![false; self.targets.len()],
            stack: Vec::new(),
            order: Vec::new(),
        };
        self.visit(root, &mut walk)?;
        Ok(walk.order)
    }

    fn visit(&self, idx: usize, walk: &mut Walk) -> Result<(), GraphError> {
        if walk.done[idx] {
            return Ok(());
        }
        if let Some(pos) = walk.stack.iter().position(|&i| i == idx) {
            let mut path: Vec<String> = walk.stack[pos..]
                .iter()
                .map(|&i| self.targets[i].id().to_string())
                .collect();
            path.push(self.targets[idx].id().to_string());
            return Err(GraphError::CycleDetected { path });
        }

        walk.stack.push(idx);
        let target = &self.targets[idx];
        for dep in target.depends_on() {
            let dep_idx = self.lookup(dep, Some(target.id()))?;
            self.visit(dep_idx, walk)?;
        }
        walk.stack.pop();

        walk.done[idx] = true;
        walk.order.push(idx);
        Ok(())
    }
}

impl<C> Default for TargetGraph<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for TargetGraph<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetGraph")
            .field("targets", &self.targets)
            .finish()
    }
}

/// Per-resolution traversal state
struct Walk {
    done: Vec<bool>,
    stack: Vec<usize>,
    order: Vec<usize>,
}

fn normalize(id: &str) -> String {
    id.to_ascii_lowercase()
}
