#![forbid(unsafe_code)]

//! Load-time lock configuration.
//!
//! [`LockConfig`] carries everything the widget needs at startup: the node
//! layout, the reference sequence, and feedback timing. It can be built in
//! code or loaded from TOML or JSON (feature `config-files`).
//!
//! ```json
//! {
//!   "nodeCount": 3,
//!   "positions": [{"x": 0, "y": 0}, {"x": 100, "y": 0}, {"x": 200, "y": 0}],
//!   "radii": [30, 30, 30],
//!   "referenceSequence": [0, 1, 2],
//!   "feedbackHoldDuration": 2.0,
//!   "feedbackFadeDuration": 0.5
//! }
//! ```
//!
//! Loading always validates; an invalid configuration is an error, never
//! silently coerced.

#[cfg(feature = "config-files")]
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Point;
use crate::node_field::{NodeField, grid_positions};
use crate::sequence::Sequence;

/// Default fade-in / fade-out duration in seconds.
pub const DEFAULT_FADE_SECS: f32 = 0.5;
/// Default hold duration in seconds.
pub const DEFAULT_HOLD_SECS: f32 = 2.0;

/// Static widget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockConfig {
    pub node_count: usize,
    pub positions: Vec<Point>,
    pub radii: Vec<f32>,
    pub reference_sequence: Sequence,
    /// Seconds the result banner stays fully visible.
    #[serde(default = "default_hold")]
    pub feedback_hold_duration: f32,
    /// Seconds for each of the fade-in and fade-out phases.
    #[serde(default = "default_fade")]
    pub feedback_fade_duration: f32,
}

fn default_hold() -> f32 {
    DEFAULT_HOLD_SECS
}

fn default_fade() -> f32 {
    DEFAULT_FADE_SECS
}

impl LockConfig {
    /// A `cols x rows` grid (row-major, `spacing` apart, uniform `radius`)
    /// with default feedback timing.
    #[must_use]
    pub fn grid(
        cols: usize,
        rows: usize,
        spacing: f32,
        radius: f32,
        reference: impl Into<Sequence>,
    ) -> Self {
        let positions = grid_positions(cols, rows, spacing);
        Self {
            node_count: positions.len(),
            radii: vec![radius; positions.len()],
            positions,
            reference_sequence: reference.into(),
            feedback_hold_duration: DEFAULT_HOLD_SECS,
            feedback_fade_duration: DEFAULT_FADE_SECS,
        }
    }

    /// Override feedback timing (builder pattern).
    #[must_use]
    pub fn with_feedback_timing(mut self, hold_secs: f32, fade_secs: f32) -> Self {
        self.feedback_hold_duration = hold_secs;
        self.feedback_fade_duration = fade_secs;
        self
    }

    /// Check every field, failing on the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Layout checks live in NodeField::layout.
        self.node_field()?;

        if self.reference_sequence.is_empty() {
            return Err(ConfigError::EmptyReference);
        }
        if let Some((position, node)) = self
            .reference_sequence
            .iter()
            .enumerate()
            .find(|(_, node)| node.get() >= self.node_count)
        {
            return Err(ConfigError::ReferenceOutOfRange {
                position,
                node: node.get(),
                node_count: self.node_count,
            });
        }
        check_duration("feedbackHoldDuration", self.feedback_hold_duration)?;
        check_duration("feedbackFadeDuration", self.feedback_fade_duration)?;
        Ok(())
    }

    /// Build the node field described by this configuration.
    pub fn node_field(&self) -> Result<NodeField, ConfigError> {
        NodeField::layout(self.node_count, &self.positions, &self.radii)
    }

    /// Hold duration as a [`Duration`]. Assumes a validated config.
    #[must_use]
    pub fn hold(&self) -> Duration {
        secs(self.feedback_hold_duration)
    }

    /// Fade duration as a [`Duration`]. Assumes a validated config.
    #[must_use]
    pub fn fade(&self) -> Duration {
        secs(self.feedback_fade_duration)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }
}

fn check_duration(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDuration { field, value })
    }
}

/// Seconds to a [`Duration`], saturating values too large to represent.
fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}
