//! State snapshots and the reel that holds them
//!
//! A snapshot is everything that must be reproduced on replay. The runtime
//! never looks inside one; it only needs independent copies (`Clone` of an
//! owned value) and a text encoding for storage and transport.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{ScriptError, ScriptResult};

/// Capability required of recorded state.
///
/// Copies must be deep: a snapshot handed out by the recorder shares nothing
/// with the one stored in the reel.
pub trait Snapshot: Clone + Serialize + DeserializeOwned {}

impl<T> Snapshot for T where T: Clone + Serialize + DeserializeOwned {}

/// Ordered list of snapshots, recorded or waiting to be replayed.
///
/// Encodes as a JSON array of snapshots; the empty reel encodes to `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reel<S> {
    frames: Vec<S>,
}

impl<S> Default for Reel<S> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<S> Reel<S> {
    /// Create an empty reel
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every snapshot
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Append a snapshot
    pub fn add(&mut self, snapshot: S) {
        self.frames.push(snapshot);
    }

    /// Snapshot at `index`, if present
    pub fn get(&self, index: usize) -> Option<&S> {
        self.frames.get(index)
    }

    /// Remove and return the snapshot at `index`, shifting later ones down
    pub fn remove(&mut self, index: usize) -> Option<S> {
        if index < self.frames.len() {
            Some(self.frames.remove(index))
        } else {
            None
        }
    }

    /// Number of snapshots
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the reel holds no snapshots
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate snapshots in order
    pub fn iter(&self) -> std::slice::Iter<'_, S> {
        self.frames.iter()
    }
}

impl<S: Snapshot> Reel<S> {
    /// Append independent copies of every snapshot in `other`
    pub fn extend_from(&mut self, other: &Reel<S>) {
        self.frames.extend(other.frames.iter().cloned());
    }

    /// Compact JSON encoding
    pub fn to_json(&self) -> ScriptResult<String> {
        serde_json::to_string(self).map_err(|e| ScriptError::Encode(e.to_string()))
    }

    /// Pretty-printed JSON encoding, used for files meant to be read by people
    pub fn to_json_pretty(&self) -> ScriptResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScriptError::Encode(e.to_string()))
    }

    /// Decode a reel from JSON text
    pub fn from_json(text: &str) -> ScriptResult<Self> {
        serde_json::from_str(text).map_err(|e| ScriptError::Decode {
            name: "<inline>".to_string(),
            detail: e.to_string(),
        })
    }

    /// Hex BLAKE3 digest of the compact encoding.
    ///
    /// Two runs that produced byte-identical reels have equal fingerprints.
    pub fn fingerprint(&self) -> ScriptResult<String> {
        let encoded = self.to_json()?;
        Ok(blake3::hash(encoded.as_bytes()).to_hex().to_string())
    }
}

impl<S> FromIterator<S> for Reel<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<'a, S> IntoIterator for &'a Reel<S> {
    type Item = &'a S;
    type IntoIter = std::slice::Iter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
