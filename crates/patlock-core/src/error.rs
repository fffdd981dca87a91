#![forbid(unsafe_code)]

//! Error types for configuration and rule evaluation.
//!
//! The core performs no I/O on the input path, so the taxonomy is narrow:
//! configuration problems fail fast at construction ([`ConfigError`]), and
//! failures inside an injected rule evaluator ([`RuleError`]) are folded into
//! a failed match by [`SequenceValidator`](crate::validate::SequenceValidator)
//! rather than propagated.

use std::fmt;

/// Invalid or unreadable lock configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// `nodeCount` must be greater than zero.
    ZeroNodes,
    /// `positions` length differs from `nodeCount`.
    PositionCountMismatch { expected: usize, actual: usize },
    /// `radii` length differs from `nodeCount`.
    RadiusCountMismatch { expected: usize, actual: usize },
    /// A hit radius is non-finite or not strictly positive.
    InvalidRadius { index: usize, radius: f32 },
    /// A node position has a non-finite coordinate.
    NonFinitePosition { index: usize },
    /// The reference sequence has no entries.
    EmptyReference,
    /// A reference entry names a node outside `0..node_count`.
    ReferenceOutOfRange {
        position: usize,
        node: usize,
        node_count: usize,
    },
    /// A feedback duration is negative or non-finite.
    InvalidDuration { field: &'static str, value: f32 },
    /// I/O error reading a configuration file.
    Io(std::io::Error),
    /// JSON parse error.
    #[cfg(feature = "config-files")]
    Json(serde_json::Error),
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    Toml(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroNodes => write!(f, "node count must be greater than zero"),
            Self::PositionCountMismatch { expected, actual } => {
                write!(f, "expected {expected} node positions, got {actual}")
            }
            Self::RadiusCountMismatch { expected, actual } => {
                write!(f, "expected {expected} node radii, got {actual}")
            }
            Self::InvalidRadius { index, radius } => {
                write!(f, "node {index} has invalid hit radius {radius} (must be > 0)")
            }
            Self::NonFinitePosition { index } => {
                write!(f, "node {index} has a non-finite position")
            }
            Self::EmptyReference => write!(f, "reference sequence must not be empty"),
            Self::ReferenceOutOfRange {
                position,
                node,
                node_count,
            } => write!(
                f,
                "reference entry {position} names node {node}, but only {node_count} nodes exist"
            ),
            Self::InvalidDuration { field, value } => {
                write!(f, "invalid {field} {value} (must be finite and >= 0)")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Json(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure inside a sequence rule evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The rule description could not be parsed.
    Parse { directive: String },
    /// The rule could not produce an outcome.
    Evaluation { reason: String },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { directive } => write!(f, "unknown rule directive {directive:?}"),
            Self::Evaluation { reason } => write!(f, "rule evaluation failed: {reason}"),
        }
    }
}

impl std::error::Error for RuleError {}
