//! # textdelta
//!
//! Diff, fuzzy match and patch for plain text. Two texts are compared into an
//! edit script, the script is bundled into context-padded patches, and those
//! patches can be applied to a text that has drifted since they were made.
//!
//! ## Core Components
//!
//! - [`Engine`] - Diff, match and patch operations
//! - [`EngineConfig`] - Tunables shared by every operation
//! - [`diff`] - Diff types, cleanup passes and text helpers
//! - [`patch::Patch`] - One hunk of edits with its context
//! - [`protocol`] - Delta, patch text and HTML formats
//!
//! All offsets and lengths count Unicode scalar values.
//!
//! ## Example Usage
//!
//! ```rust
//! use textdelta::{Engine, EngineConfig};
//! use textdelta::protocol::patch_text::{patch_from_text, patch_to_text};
//!
//! # fn example() -> Result<(), textdelta::Error> {
//! let engine = Engine::builder()
//!     .config(EngineConfig::default())
//!     .build()?;
//!
//! let patches = engine.patch_make_from_texts("The quick brown fox.", "The quick red fox.");
//! let text = patch_to_text(&patches);
//!
//! let (patched, applied) = engine.patch_apply(&patch_from_text(&text)?, "The quick brown fox.");
//! assert_eq!(patched, "The quick red fox.");
//! assert!(applied.iter().all(|&ok| ok));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod diff;
pub mod matcher;
pub mod patch;
pub mod protocol;

pub use diff::{Diff, Operation};
pub use matcher::{MATCH_MAX_BITS, MatchError};
pub use patch::Patch;
pub use protocol::DecodeError;

/// Configuration for an [`Engine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Time budget for one diff, zero for unlimited
    ///
    /// In JSON this is a number of seconds; negative values mean unlimited.
    #[serde(with = "duration_secs")]
    pub diff_timeout: Duration,
    /// Cost of an empty edit in chars, used by efficiency cleanup
    pub diff_edit_cost: usize,
    /// Worst match score still accepted (0.0 exact only, 1.0 anything)
    pub match_threshold: f64,
    /// How far from the expected location a match may be before its score
    /// reaches 1.0; zero accepts only the exact location
    pub match_distance: usize,
    /// Largest normalised edit distance at which a long patch still applies
    pub patch_delete_threshold: f64,
    /// Chunk of context added around each patch
    pub patch_margin: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            diff_timeout: Duration::from_secs(1),
            diff_edit_cost: 4,
            match_threshold: 0.5,
            match_distance: 1000,
            patch_delete_threshold: 0.5,
            patch_margin: 4,
        }
    }
}

impl EngineConfig {
    /// Load a config from JSON, taking defaults for missing fields
    ///
    /// # Example
    /// ```
    /// use textdelta::EngineConfig;
    ///
    /// let config = EngineConfig::from_json(r#"{"diff_timeout": 0.25, "patch_margin": 8}"#).unwrap();
    /// assert_eq!(config.patch_margin, 8);
    /// assert_eq!(config.match_distance, 1000);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every tunable is within range
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("match_threshold", self.match_threshold),
            ("patch_delete_threshold", self.patch_delete_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { field, value });
            }
        }

        if self.patch_margin.saturating_mul(2) >= MATCH_MAX_BITS {
            return Err(ConfigError::PatchMarginTooLarge {
                margin: self.patch_margin,
                max_bits: MATCH_MAX_BITS,
            });
        }

        Ok(())
    }
}

mod duration_secs {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if secs <= 0.0 {
            return Ok(Duration::ZERO);
        }
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Threshold outside `0.0..=1.0`
    #[error("Invalid {field}: {value} (must be between 0.0 and 1.0)")]
    ThresholdOutOfRange {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Patch context would not leave room for the pattern in a match
    #[error("Patch margin too large: {margin} (twice the margin must be below {max_bits})")]
    PatchMarginTooLarge {
        /// Rejected margin
        margin: usize,
        /// Matcher bit width
        max_bits: usize,
    },

    /// Config JSON could not be read
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Main textdelta errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Malformed delta or patch text
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Pattern cannot be matched
    #[error(transparent)]
    Match(#[from] MatchError),
}

/// Diff, match and patch engine
///
/// Holds only configuration, so one engine can be shared freely between
/// threads.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Get engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Builder for configuring an [`Engine`]
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set the whole configuration, replacing any field set before
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the diff time budget, zero for unlimited
    pub fn diff_timeout(mut self, timeout: Duration) -> Self {
        self.config.diff_timeout = timeout;
        self
    }

    /// Set the efficiency cleanup edit cost
    pub fn diff_edit_cost(mut self, cost: usize) -> Self {
        self.config.diff_edit_cost = cost;
        self
    }

    /// Set the worst accepted match score
    pub fn match_threshold(mut self, threshold: f64) -> Self {
        self.config.match_threshold = threshold;
        self
    }

    /// Set the match proximity scale
    pub fn match_distance(mut self, distance: usize) -> Self {
        self.config.match_distance = distance;
        self
    }

    /// Set the edit distance limit for long patches
    pub fn patch_delete_threshold(mut self, threshold: f64) -> Self {
        self.config.patch_delete_threshold = threshold;
        self
    }

    /// Set the patch context chunk size
    pub fn patch_margin(mut self, margin: usize) -> Self {
        self.config.patch_margin = margin;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<Engine, ConfigError> {
        self.config.validate()?;
        Ok(Engine {
            config: self.config,
        })
    }
}
