//! Editor and generator settings.
//!
//! Both sections can be loaded from a TOML file; anything left out keeps its
//! default.
//!
//! ```toml
//! [editor]
//! max_undo_levels = 100
//!
//! [generator]
//! include_run = false
//! ```

use crate::model::GridPoint;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for an editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo depth; the oldest entry is dropped beyond this.
    pub max_undo_levels: usize,
    /// Offset applied to duplicated components.
    pub duplicate_offset: GridPoint,
    /// Prefix of ids handed out to new components and wires.
    pub id_prefix: String,
    /// Manhattan radius within which a dragged wire end snaps to a port.
    pub snap_distance: i32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: 50,
            duplicate_offset: GridPoint::new(2, 2),
            id_prefix: "c".to_string(),
            snap_distance: 1,
        }
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_undo_levels(mut self, levels: usize) -> Self {
        self.max_undo_levels = levels;
        self
    }

    pub fn with_duplicate_offset(mut self, offset: GridPoint) -> Self {
        self.duplicate_offset = offset;
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }
}

/// Settings for program text generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Variable holding the engine circuit object.
    pub circuit_var: String,
    /// Append `<circuit_var>.run()` at the end.
    pub include_run: bool,
    /// Pass `js_logging=True` to the circuit constructor.
    pub js_logging: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            circuit_var: "circuit0".to_string(),
            include_run: true,
            js_logging: true,
        }
    }
}

impl GeneratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run(mut self, include_run: bool) -> Self {
        self.include_run = include_run;
        self
    }

    pub fn with_circuit_var(mut self, var: impl Into<String>) -> Self {
        self.circuit_var = var.into();
        self
    }

    pub fn with_js_logging(mut self, enabled: bool) -> Self {
        self.js_logging = enabled;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub generator: GeneratorOptions,
}

impl Config {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
