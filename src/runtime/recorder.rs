//! Record and replay of machine state, one snapshot per tick
//!
//! While recording, [`Recorder::record`] appends a copy of the caller's
//! current state to the reel. While playing back, [`Recorder::playback`]
//! hands back a copy of the next stored state and advances the cursor.
//! Running off the end of the reel is a normal stop, not an error.

use tracing::{debug, info};

use super::activity::Activity;
use super::error::{RecorderError, RecorderResult, ScriptResult};
use super::snapshot::{Reel, Snapshot};

/// Current recorder mode, derived from the two mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderMode {
    /// Neither recording nor playing back
    Idle,
    /// Appending one snapshot per `record()` call
    Recording,
    /// Emitting one snapshot per `playback()` call
    Playing,
}

/// Owns the reel plus the recording/playback flags and the playback cursor.
///
/// `recording` and `playing_back` are never both set, and the cursor always
/// stays within `0..=script.len()`.
#[derive(Debug)]
pub struct Recorder<S> {
    script: Reel<S>,
    recording: bool,
    playing_back: bool,
    playback_position: usize,
}

impl<S> Default for Recorder<S> {
    fn default() -> Self {
        Self {
            script: Reel::new(),
            recording: false,
            playing_back: false,
            playback_position: 0,
        }
    }
}

impl<S: Snapshot> Recorder<S> {
    /// Create an idle recorder with an empty reel
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording, continuing after whatever the reel already holds
    pub fn start_recording(&mut self) -> RecorderResult<()> {
        if self.playing_back {
            return Err(RecorderError::PlaybackActive);
        }
        self.recording = true;
        debug!(frames = self.script.len(), "recording started");
        Ok(())
    }

    /// Stop recording; the reel is kept
    pub fn stop_recording(&mut self) {
        if self.recording {
            debug!(frames = self.script.len(), "recording stopped");
        }
        self.recording = false;
    }

    /// Stop recording and clear the reel
    pub fn reset_recording(&mut self) {
        self.stop_recording();
        self.script.clear();
        self.clamp_cursor();
    }

    /// Start playback from the current cursor, which is not rewound
    pub fn start_playback(&mut self) -> RecorderResult<()> {
        if self.recording {
            return Err(RecorderError::RecordingActive);
        }
        self.playing_back = true;
        debug!(
            position = self.playback_position,
            frames = self.script.len(),
            "playback started"
        );
        Ok(())
    }

    /// Stop playback, leaving the cursor where it is
    pub fn stop_playback(&mut self) {
        if self.playing_back {
            debug!(position = self.playback_position, "playback stopped");
        }
        self.playing_back = false;
    }

    /// Stop playback and rewind the cursor to the start of the reel
    pub fn reset_playback(&mut self) {
        self.stop_playback();
        self.playback_position = 0;
    }

    /// Replace the reel with a copy of `script`, stopping recording and playback.
    ///
    /// The cursor is kept but clamped to the new reel; call
    /// [`reset_playback`](Self::reset_playback) to start from the beginning.
    pub fn set_script(&mut self, script: &Reel<S>) {
        self.stop_recording();
        self.stop_playback();
        self.script.clear();
        self.script.extend_from(script);
        self.clamp_cursor();
        debug!(frames = self.script.len(), "script loaded");
    }

    /// The current reel
    pub fn script(&self) -> &Reel<S> {
        &self.script
    }

    /// Whether `record()` will append
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Whether `playback()` will emit
    pub fn is_playing_back(&self) -> bool {
        self.playing_back
    }

    /// Index of the next snapshot `playback()` will emit
    pub fn playback_position(&self) -> usize {
        self.playback_position
    }

    /// Current mode
    pub fn mode(&self) -> RecorderMode {
        match (self.recording, self.playing_back) {
            (true, _) => RecorderMode::Recording,
            (false, true) => RecorderMode::Playing,
            (false, false) => RecorderMode::Idle,
        }
    }

    /// Append a copy of `state` if recording
    pub fn record(&mut self, state: &S) {
        if self.recording {
            self.script.add(state.clone());
        }
    }

    /// Copy of the next snapshot if playing back.
    ///
    /// At the end of the reel playback stops and `None` is returned.
    pub fn playback(&mut self) -> Option<S> {
        if !self.playing_back {
            return None;
        }
        match self.script.get(self.playback_position) {
            Some(state) => {
                self.playback_position += 1;
                Some(state.clone())
            }
            None => {
                self.stop_playback();
                None
            }
        }
    }

    /// Log the reel as JSON and return the text
    pub fn dump_recording(&self) -> ScriptResult<String> {
        let json = self.script.to_json()?;
        info!(frames = self.script.len(), script = %json, "recording dump");
        Ok(json)
    }

    fn clamp_cursor(&mut self) {
        self.playback_position = self.playback_position.min(self.script.len());
    }
}

/// Activity that replays a reel by consuming it front to back.
///
/// Each step removes the first remaining snapshot and passes it to `apply`.
/// The activity completes once the reel is empty, so it can be pushed on a
/// [`Stack`](super::stack::Stack) or queued in a [`Sequence`](super::sequence::Sequence).
pub struct PlaybackActivity<S, F> {
    remaining: Reel<S>,
    apply: F,
}

impl<S: Snapshot, F: FnMut(S)> PlaybackActivity<S, F> {
    /// Create a playback activity over a copy of `script`
    pub fn new(script: &Reel<S>, apply: F) -> Self {
        let mut remaining = Reel::new();
        remaining.extend_from(script);
        Self { remaining, apply }
    }

    /// Snapshots not yet applied
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

impl<S: Snapshot, F: FnMut(S)> Activity for PlaybackActivity<S, F> {
    fn step(&mut self) -> bool {
        if let Some(state) = self.remaining.remove(0) {
            (self.apply)(state);
        }
        self.remaining.is_empty()
    }
}
