//! Explicitly owned registry of loaded format sets

use super::format::{Format, FormatSet};
use crate::error::{IsaTabError, Result};
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Identifier of the built-in ISA-Tab format set
pub const ISATAB_FORMAT_SET: &str = "isatab";

/// Identifier of the built-in MAGE-TAB format set
pub const MAGETAB_FORMAT_SET: &str = "magetab";

const BUILTIN_ISATAB: &str = include_str!("../../definitions/isatab.yaml");
const BUILTIN_MAGETAB: &str = include_str!("../../definitions/magetab.yaml");

/// Holds the format sets used by one pipeline.
///
/// Definitions are immutable once loaded; the registry is owned by whoever
/// orchestrates processing and is dropped (or [`cleared`](Self::clear)) with it.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    sets: IndexMap<String, Arc<FormatSet>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the ISA-Tab and MAGE-TAB definitions
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in definition fails to load.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.load_builtin()?;
        Ok(registry)
    }

    /// Load the built-in definitions
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in definition fails to parse or check.
    pub fn load_builtin(&mut self) -> Result<()> {
        self.load_str(BUILTIN_ISATAB)?;
        self.load_str(BUILTIN_MAGETAB)?;
        Ok(())
    }

    /// Load a format set from YAML text. A set with the same id is replaced.
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::SerializationError` on malformed YAML and
    /// `IsaTabError::ConfigError` on inconsistent definitions.
    pub fn load_str(&mut self, yaml: &str) -> Result<Arc<FormatSet>> {
        let set: FormatSet = serde_yaml::from_str(yaml)?;
        set.check()?;
        let set = Arc::new(set);
        debug!(
            format_set = %set.id,
            formats = set.formats.len(),
            "Loaded format set"
        );
        self.sets.insert(set.id.clone(), Arc::clone(&set));
        Ok(set)
    }

    /// Load a format set from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::IoError` if the file cannot be read, otherwise as
    /// [`load_str`](Self::load_str).
    pub fn load_file(&mut self, path: &Path) -> Result<Arc<FormatSet>> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            IsaTabError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {e}", path.display()),
            ))
        })?;
        let set = self.load_str(&contents)?;
        info!("Loaded format set '{}' from {}", set.id, path.display());
        Ok(set)
    }

    /// Get a loaded format set
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` if no such set is loaded.
    pub fn format_set(&self, id: &str) -> Result<Arc<FormatSet>> {
        self.sets
            .get(id)
            .cloned()
            .ok_or_else(|| IsaTabError::config(format!("format set '{id}' is not loaded")))
    }

    /// Get one format of a loaded set
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` if the set is not loaded or has no
    /// such format.
    pub fn format(&self, set_id: &str, format_id: &str) -> Result<Arc<Format>> {
        self.format_set(set_id)?.require_format(format_id).cloned()
    }

    /// Identifiers of the loaded sets
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    /// Drop every loaded definition
    pub fn clear(&mut self) {
        self.sets.clear();
    }

    /// Number of loaded sets
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether no set is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
