//! Persistence layer.
//!
//! Saves and loads the durable part of the game (`{wins, losses, streak,
//! balance}`) to a single named key-value slot. The bet amount and the
//! in-flight fields are never written, so a restart always resumes between
//! flips.
//!
//! `StateSlot` is the raw durable key; `PersistenceAdapter` is the
//! best-effort layer on top of it that never lets a storage problem reach
//! the player.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::types::{GameState, Tally};

/// Default slot key.
pub const DEFAULT_SLOT_KEY: &str = "coinFlipGameData";

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

/// The record written to the slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub wins: u64,
    pub losses: u64,
    pub streak: u32,
    pub balance: Decimal,
}

impl PersistedState {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            wins: state.tally.wins,
            losses: state.tally.losses,
            streak: state.streak,
            balance: state.balance,
        }
    }

    pub fn tally(&self) -> Tally {
        Tally {
            wins: self.wins,
            losses: self.losses,
        }
    }
}

/// Shapes accepted on load: the current flat record, or the nested
/// `{score: {wins, losses}, streak, balance}` written by the old web client.
#[derive(Deserialize)]
#[serde(untagged)]
enum SlotRecord {
    Flat(PersistedState),
    Nested {
        score: Tally,
        streak: u32,
        balance: Decimal,
    },
}

impl From<SlotRecord> for PersistedState {
    fn from(record: SlotRecord) -> Self {
        match record {
            SlotRecord::Flat(state) => state,
            SlotRecord::Nested {
                score,
                streak,
                balance,
            } => PersistedState {
                wins: score.wins,
                losses: score.losses,
                streak,
                balance,
            },
        }
    }
}

/// Decode a slot value. Rejects anything that would break the
/// non-negative balance invariant.
pub fn decode(raw: &str) -> Result<PersistedState> {
    let record: SlotRecord =
        serde_json::from_str(raw).context("Failed to parse persisted game state")?;
    let state = PersistedState::from(record);
    if state.balance < Decimal::ZERO {
        anyhow::bail!("Persisted balance is negative: {}", state.balance);
    }
    Ok(state)
}

pub fn encode(state: &PersistedState) -> Result<String> {
    serde_json::to_string(state).context("Failed to serialise game state")
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// A durable string slot addressed by key.
#[cfg_attr(test, mockall::automock)]
pub trait StateSlot: Send + Sync {
    /// `Ok(None)` if the key has never been written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state from {}", path.display()))?;
        Ok(Some(raw))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if !self.dir.as_os_str().is_empty() && !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).with_context(|| {
                format!("Failed to create state directory {}", self.dir.display())
            })?;
        }
        let path = self.path_for(key);
        // Write-then-rename so a crash never leaves a half-written slot.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write state to {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move state into {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if Path::new(&path).exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to delete state file {}", path.display()))?;
        }
        Ok(())
    }
}

/// In-process slot, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySlot {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key, e.g. with a corrupt value.
    pub fn with_value(key: &str, value: &str) -> Self {
        let slot = Self::default();
        if let Ok(mut values) = slot.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        slot
    }
}

impl StateSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory slot lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory slot lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory slot lock poisoned"))?;
        values.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Best-effort save/load of game state under a fixed key.
pub struct PersistenceAdapter {
    slot: Box<dyn StateSlot>,
    key: String,
}

impl PersistenceAdapter {
    pub fn new(slot: Box<dyn StateSlot>, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
        }
    }

    /// Ephemeral adapter over a `MemorySlot`.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySlot::new()), DEFAULT_SLOT_KEY)
    }

    /// Write the durable fields. Failures are logged and swallowed.
    pub fn save(&self, state: &GameState) {
        let record = PersistedState::from_state(state);
        match encode(&record).and_then(|json| self.slot.write(&self.key, &json)) {
            Ok(()) => debug!(key = %self.key, balance = %record.balance, "State saved"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to save state"),
        }
    }

    /// Read the slot. Absent, unreadable, or malformed data all yield `None`.
    pub fn load(&self) -> Option<PersistedState> {
        let raw = match self.slot.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!(key = %self.key, "No saved state found, starting fresh");
                return None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read saved state, starting fresh");
                return None;
            }
        };

        match decode(&raw) {
            Ok(state) => {
                info!(
                    key = %self.key,
                    balance = %state.balance,
                    streak = state.streak,
                    wins = state.wins,
                    losses = state.losses,
                    "State loaded"
                );
                Some(state)
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding malformed saved state");
                None
            }
        }
    }

    /// Delete the slot. Failures are logged and swallowed.
    pub fn clear(&self) {
        if let Err(e) = self.slot.remove(&self.key) {
            warn!(key = %self.key, error = %e, "Failed to clear saved state");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
