#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! Every tunable of the engine lives in one [`EngineConfig`] that can be
//! loaded from TOML or JSON at startup.
//!
//! ```toml
//! min_column_span = 1
//! update_hysteresis_px = 2.0
//!
//! [defaults]
//! removable = true
//! droppable_in = true
//! droppable_out = true
//! ```
//!
//! ```rust,ignore
//! let config = EngineConfig::from_toml_file("griddrag.toml")?;
//! ```
//!
//! `EngineConfig::default()` gives the behavior of a grid that declares
//! nothing: blocks drag and resize, nothing is removable, nothing transfers.

use std::path::Path;

use griddrag_layout::CapabilityDefaults;
use serde::{Deserialize, Serialize};

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capabilities used where no cascade level declares one.
    pub defaults: CapabilityDefaults,
    /// Smallest column count a resize may shrink a block to.
    pub min_column_span: u32,
    /// Smallest row count a resize may shrink a block to.
    pub min_row_span: u32,
    /// Pointer travel (px, manhattan) required before a move is re-evaluated.
    pub update_hysteresis_px: f64,
    /// Escape cancels every active gesture.
    pub cancel_on_escape: bool,
    /// A root grid's `debug` flag disables expansion in nested grids.
    pub debug_disables_nested_expansion: bool,
    /// A rejected transfer puts the block back at its pre-gesture span;
    /// otherwise it stays at the last preview accepted in its own grid.
    pub restore_on_transfer_reject: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            defaults: CapabilityDefaults::default(),
            min_column_span: 1,
            min_row_span: 1,
            update_hysteresis_px: 0.0,
            cancel_on_escape: true,
            debug_disables_nested_expansion: true,
            restore_on_transfer_reject: true,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.min_column_span == 0 {
            errors.push("min_column_span must be > 0".into());
        }
        if self.min_row_span == 0 {
            errors.push("min_row_span must be > 0".into());
        }
        if !self.update_hysteresis_px.is_finite() || self.update_hysteresis_px < 0.0 {
            errors.push(format!(
                "update_hysteresis_px must be finite and >= 0, got {}",
                self.update_hysteresis_px
            ));
        }
        if self
            .defaults
            .drag_handler
            .as_deref()
            .is_some_and(|selector| selector.trim().is_empty())
        {
            errors.push("defaults.drag_handler must not be blank".into());
        }

        errors
    }

    /// `validate` as a `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors that can occur when loading an engine configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
