//! Version derivation
//!
//! A [`VersionDescriptor`] is computed once at process start from the build
//! counter and the capture timestamp, then handed to every target that needs
//! it. Nothing re-samples the clock afterwards, so every artifact of a run
//! carries the same version.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Turns a build counter and a timestamp into version strings
pub trait VersionScheme {
    /// Derives the descriptor; must be deterministic
    fn compute(&self, build_counter: u16, captured_at: DateTime<Utc>) -> VersionDescriptor;
}

/// Calendar versioning: `YEAR.MMDD.COUNTER`.
///
/// The month and day are folded into one component (`1015` for October
/// 15th, `105` for January 5th) so every component also fits the 16-bit
/// limits of assembly versions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarScheme;

impl VersionScheme for CalendarScheme {
    fn compute(&self, build_counter: u16, captured_at: DateTime<Utc>) -> VersionDescriptor {
        let year = captured_at.year();
        let month_day = captured_at.month() * 100 + captured_at.day();
        // Two-second resolution keeps the revision below 65535.
        let revision = captured_at.num_seconds_from_midnight() / 2;

        let sem_version = format!("{year}.{month_day}.{build_counter}");
        VersionDescriptor {
            build_counter,
            captured_at,
            assembly_version: format!("{sem_version}.0"),
            file_version: format!("{sem_version}.{revision}"),
            informational_version: format!(
                "{sem_version}+{}",
                captured_at.format("%Y%m%d.%H%M%S")
            ),
            package_version: sem_version.clone(),
            sem_version,
        }
    }
}

/// Version strings stamped into every artifact of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    /// Caller-supplied build counter
    pub build_counter: u16,
    /// Instant captured once at process start
    pub captured_at: DateTime<Utc>,
    /// Semantic version
    pub sem_version: String,
    /// Four-part assembly version
    pub assembly_version: String,
    /// Four-part file version
    pub file_version: String,
    /// Informational version with build metadata
    pub informational_version: String,
    /// Package version
    pub package_version: String,
}

impl VersionDescriptor {
    /// Computes a descriptor with the default [`CalendarScheme`]
    #[must_use]
    pub fn compute(build_counter: u16, captured_at: DateTime<Utc>) -> Self {
        CalendarScheme.compute(build_counter, captured_at)
    }
}

impl fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.informational_version)
    }
}
