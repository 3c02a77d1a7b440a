//! Filesystem layout helpers and atomic write operations
//!
//! Manages the `.tickloop/` directory: the runtime config and a `scripts/`
//! directory holding one JSON reel per named script.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::RuntimeConfig;
use super::error::StorageError;
use super::registry::ScriptCatalog;
use super::snapshot::{Reel, Snapshot};

const SCRIPT_EXTENSION: &str = "json";

/// Storage manager for recorded scripts
#[derive(Debug, Clone)]
pub struct ScriptStore {
    root: PathBuf,
}

impl ScriptStore {
    /// Create a new storage manager
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the config file path
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Get the scripts directory path
    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    /// Path of the file holding script `name`
    ///
    /// Names must be a single path component: empty names, `.`/`..` and
    /// names containing a separator are rejected.
    pub fn script_path(&self, name: &str) -> Result<PathBuf> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\']);
        if invalid {
            return Err(StorageError::InvalidScriptName(name.to_string()).into());
        }
        Ok(self
            .scripts_dir()
            .join(format!("{}.{}", name, SCRIPT_EXTENSION)))
    }

    /// Write a reel as pretty JSON under `name`
    pub fn save<S: Snapshot>(&self, name: &str, reel: &Reel<S>) -> Result<PathBuf> {
        let path = self.script_path(name)?;
        let json = reel
            .to_json_pretty()
            .with_context(|| format!("Failed to encode script '{}'", name))?;
        self.create_dir_all(&self.scripts_dir())?;
        self.write_atomic(&path, json.as_bytes())?;
        tracing::info!(script = name, frames = reel.len(), path = %path.display(), "script saved");
        Ok(path)
    }

    /// Read and decode the reel stored under `name`
    pub fn load<S: Snapshot>(&self, name: &str) -> Result<Reel<S>> {
        let path = self.script_path(name)?;
        let data = self.read_file(&path)?;
        let text = String::from_utf8(data)
            .with_context(|| format!("Script '{}' is not valid UTF-8", name))?;
        let reel = Reel::from_json(&text)
            .with_context(|| format!("Failed to decode script '{}'", name))?;
        Ok(reel)
    }

    /// Names of all stored scripts, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let dir = self.scripts_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = self
            .list_dir(&dir)?
            .into_iter()
            .filter(|path| path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION))
            .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Register every stored script as a file-backed entry in `catalog`
    pub fn register_all(&self, catalog: &ScriptCatalog) -> Result<usize> {
        let names = self.list()?;
        for name in &names {
            catalog.register_file(name, self.script_path(name)?);
        }
        Ok(names.len())
    }

    /// Write data atomically to a file
    ///
    /// Creates a temporary file, writes the data, syncs, then renames
    pub fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        let temp_path = path.with_extension("tmp");

        let mut file = File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

        file.write_all(data).context("Failed to write data")?;
        file.sync_all().context("Failed to sync file")?;
        drop(file);

        fs::rename(&temp_path, path).map_err(|e| StorageError::AtomicWriteFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        if let Some(parent) = path.parent() {
            let dir = OpenOptions::new()
                .read(true)
                .open(parent)
                .with_context(|| format!("Failed to open directory: {:?}", parent))?;

            dir.sync_all().context("Failed to sync directory")?;
        }

        Ok(())
    }

    /// Read a file
    pub fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.exists() {
            return Err(StorageError::PathNotFound(path.to_path_buf()).into());
        }
        fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))
    }

    /// Create a directory and all parent directories
    pub fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))
    }

    /// List files in a directory
    pub fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();

        for entry in
            fs::read_dir(path).with_context(|| format!("Failed to read directory: {:?}", path))?
        {
            let entry = entry?;
            entries.push(entry.path());
        }

        Ok(entries)
    }
}

/// Initialize storage directories for a new runtime
pub fn init_storage(root: &Path) -> Result<()> {
    let store = ScriptStore::new(root.to_path_buf());

    store.create_dir_all(root)?;
    store.create_dir_all(&store.scripts_dir())?;

    Ok(())
}

/// Write runtime configuration
pub fn write_config(config: &RuntimeConfig) -> Result<()> {
    let store = ScriptStore::new(config.root.clone());
    let config_path = store.config_path();

    let json = serde_json::to_vec_pretty(config).context("Failed to serialize config")?;

    store.write_atomic(&config_path, &json)?;

    Ok(())
}

/// Load runtime configuration
pub fn load_config(root: &Path) -> Result<RuntimeConfig> {
    let store = ScriptStore::new(root.to_path_buf());
    let config_path = store.config_path();

    let data = store.read_file(&config_path)?;
    let config: RuntimeConfig =
        serde_json::from_slice(&data).context("Failed to deserialize config")?;
    config.validate()?;

    Ok(config)
}
