//! Admission configuration.
//!
//! Configuration values should be provided by the application, not hardcoded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default number of concurrently open tickets per desk.
pub const DEFAULT_CAPACITY_LIMIT: u32 = 5;

/// Default page size for ticket listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default upper bound on requested page sizes.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// How a serial number already on file for the *same* customer is treated.
///
/// Tickets from a different customer are always rejected unless the prior
/// ticket is `Resolved`; this policy only covers the same-customer branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SerialConflictPolicy {
    /// Conflict when the prior ticket is no longer `Open`.
    ///
    /// Matches the legacy system. Note that this lets the same customer file
    /// a second ticket while the first is still open.
    #[default]
    Literal,
    /// Conflict while the prior ticket is still `Open`.
    WhileOpen,
}

impl fmt::Display for SerialConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Literal => "literal",
            Self::WhileOpen => "while-open",
        })
    }
}

/// Returned when a policy name is not recognized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown serial conflict policy: {0} (expected `literal` or `while-open`)")]
pub struct ParsePolicyError(pub String);

impl FromStr for SerialConflictPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "literal" => Ok(Self::Literal),
            "while-open" | "while_open" => Ok(Self::WhileOpen),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Admission engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum active assignments per desk.
    ///
    /// Default: 5
    pub capacity_limit: u32,

    /// Largest page a listing may return.
    ///
    /// Default: 100
    pub max_page_size: u32,

    /// Same-customer serial conflict rule.
    ///
    /// Default: [`SerialConflictPolicy::Literal`]
    pub serial_conflict_policy: SerialConflictPolicy,

    /// Serialize admissions per desk so the capacity check and the
    /// assignment write cannot interleave.
    ///
    /// Default: `false`
    pub serialize_per_desk: bool,
}

impl AdmissionConfig {
    /// Configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity_limit: DEFAULT_CAPACITY_LIMIT,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            serial_conflict_policy: SerialConflictPolicy::Literal,
            serialize_per_desk: false,
        }
    }

    /// Set the per-desk capacity limit.
    #[must_use]
    pub const fn with_capacity_limit(mut self, limit: u32) -> Self {
        self.capacity_limit = limit;
        self
    }

    /// Set the maximum page size.
    #[must_use]
    pub const fn with_max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = size;
        self
    }

    /// Set the same-customer serial conflict rule.
    #[must_use]
    pub const fn with_serial_conflict_policy(mut self, policy: SerialConflictPolicy) -> Self {
        self.serial_conflict_policy = policy;
        self
    }

    /// Enable or disable per-desk admission serialization.
    #[must_use]
    pub const fn with_serialize_per_desk(mut self, enabled: bool) -> Self {
        self.serialize_per_desk = enabled;
        self
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdmissionConfig::default();
        assert_eq!(config.capacity_limit, 5);
        assert_eq!(config.max_page_size, 100);
        assert_eq!(config.serial_conflict_policy, SerialConflictPolicy::Literal);
        assert!(!config.serialize_per_desk);
    }

    #[test]
    fn test_builder() {
        let config = AdmissionConfig::new()
            .with_capacity_limit(2)
            .with_max_page_size(20)
            .with_serial_conflict_policy(SerialConflictPolicy::WhileOpen)
            .with_serialize_per_desk(true);

        assert_eq!(config.capacity_limit, 2);
        assert_eq!(config.max_page_size, 20);
        assert_eq!(config.serial_conflict_policy, SerialConflictPolicy::WhileOpen);
        assert!(config.serialize_per_desk);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("literal".parse::<SerialConflictPolicy>(), Ok(SerialConflictPolicy::Literal));
        assert_eq!("While-Open".parse::<SerialConflictPolicy>(), Ok(SerialConflictPolicy::WhileOpen));
        assert!("strict".parse::<SerialConflictPolicy>().is_err());
    }
}
