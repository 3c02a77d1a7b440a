//! Named script catalog
//!
//! Scripts are registered by name before the host starts, either as inline
//! JSON text, as an in-memory reel, or as a path to a JSON file. Each host
//! takes an immutable [`ScriptRegistry`] snapshot of the global catalog and
//! looks scripts up by name when a run mode needs one.
//!
//! Every registry contains the [`EMPTY_SCRIPT`] sentinel, which is also the
//! default selection.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

use super::error::{ScriptError, ScriptResult};
use super::snapshot::{Reel, Snapshot};

/// Name of the always-present empty script
pub const EMPTY_SCRIPT: &str = "EMPTY";

/// Where a named script's text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// JSON text held in memory; decoding failures are reported
    Inline(Arc<str>),
    /// JSON file; a missing or unreadable file yields an empty reel
    File(PathBuf),
}

impl ScriptSource {
    /// Decode the reel this source describes
    pub fn load<S: Snapshot>(&self, name: &str) -> ScriptResult<Reel<S>> {
        match self {
            Self::Inline(text) => Reel::from_json(text).map_err(|e| rename(e, name)),
            Self::File(path) => {
                let text = match std::fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(script = name, path = %path.display(), error = %e, "script file unavailable, using empty reel");
                        return Ok(Reel::new());
                    }
                };
                match Reel::from_json(&text) {
                    Ok(reel) => Ok(reel),
                    Err(e) => {
                        warn!(script = name, path = %path.display(), error = %e, "script file corrupt, using empty reel");
                        Ok(Reel::new())
                    }
                }
            }
        }
    }
}

fn rename(error: ScriptError, name: &str) -> ScriptError {
    match error {
        ScriptError::Decode { detail, .. } => ScriptError::Decode {
            name: name.to_string(),
            detail,
        },
        other => other,
    }
}

/// Global catalog of named scripts.
pub struct ScriptCatalog {
    scripts: RwLock<BTreeMap<String, ScriptSource>>,
}

static CATALOG: LazyLock<ScriptCatalog> = LazyLock::new(ScriptCatalog::new);

impl ScriptCatalog {
    /// Create a catalog holding only the empty sentinel
    pub fn new() -> Self {
        let mut scripts = BTreeMap::new();
        scripts.insert(EMPTY_SCRIPT.to_string(), ScriptSource::Inline(Arc::from("[]")));
        Self {
            scripts: RwLock::new(scripts),
        }
    }

    /// Access the global catalog singleton.
    pub fn global() -> &'static Self {
        &CATALOG
    }

    /// Register JSON text under `name`, replacing any previous entry
    pub fn register_text(&self, name: &str, json: &str) {
        self.insert(name, ScriptSource::Inline(Arc::from(json)));
    }

    /// Register an encoded copy of `reel` under `name`
    pub fn register_reel<S: Snapshot>(&self, name: &str, reel: &Reel<S>) -> ScriptResult<()> {
        let json = reel.to_json()?;
        self.register_text(name, &json);
        Ok(())
    }

    /// Register a JSON file under `name`; the file is read on lookup
    pub fn register_file(&self, name: &str, path: impl Into<PathBuf>) {
        self.insert(name, ScriptSource::File(path.into()));
    }

    fn insert(&self, name: &str, source: ScriptSource) {
        let mut scripts = self.scripts.write();
        if scripts.insert(name.to_string(), source).is_some() {
            info!(script = name, "script registration replaced");
        }
    }

    /// Produce an immutable snapshot for a host instance.
    pub fn snapshot(&self) -> ScriptRegistry {
        let scripts = self.scripts.read();
        ScriptRegistry {
            scripts: Arc::new(scripts.clone()),
        }
    }
}

impl Default for ScriptCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable view of registered scripts.
#[derive(Debug, Clone)]
pub struct ScriptRegistry {
    scripts: Arc<BTreeMap<String, ScriptSource>>,
}

impl ScriptRegistry {
    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.scripts.keys().map(String::as_str).collect()
    }

    /// Whether a script is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// The name selected when nothing else is chosen
    pub fn default_name(&self) -> &'static str {
        EMPTY_SCRIPT
    }

    /// Source registered under `name`
    pub fn source(&self, name: &str) -> ScriptResult<&ScriptSource> {
        self.scripts
            .get(name)
            .ok_or_else(|| ScriptError::NotFound(name.to_string()))
    }

    /// Look up and decode the script registered under `name`
    pub fn get_script<S: Snapshot>(&self, name: &str) -> ScriptResult<Reel<S>> {
        let reel = self.source(name)?.load(name)?;
        info!(script = name, frames = reel.len(), "script loaded");
        Ok(reel)
    }
}
