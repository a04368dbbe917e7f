//! Calculation history and the saved scenario.
//!
//! Every explicit calculation is recorded in a bounded, newest-first
//! [`History`].  Once the history is full the oldest entry is dropped.
//! Separately, one scenario can be saved as the starting point for the
//! next session.  Both go through the [`ScenarioStore`] trait so the
//! backing (memory or JSON files) is interchangeable.

use crate::error::{Error, Result};
use crate::models::{CalculationResult, Scenario};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Number of entries kept when no limit is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// One recorded calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub scenario: Scenario,
    pub calculation: CalculationResult,
    pub timestamp: DateTime<Utc>,
}

/// Bounded list of recent calculations, newest first.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    /// Rebuild a history from stored entries, keeping at most `capacity`
    /// of the newest.
    pub fn from_entries(entries: Vec<HistoryEntry>, capacity: usize) -> Self {
        let mut entries = VecDeque::from(entries);
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    /// Add an entry at the front, evicting the oldest beyond capacity.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Persistence for the saved scenario and the calculation history.
pub trait ScenarioStore: Send + Sync {
    /// The saved scenario, if any.
    fn load_scenario(&self) -> Result<Option<Scenario>>;
    fn save_scenario(&self, scenario: &Scenario) -> Result<()>;
    /// Stored history entries, newest first.  Empty when nothing is stored.
    fn load_history(&self) -> Result<Vec<HistoryEntry>>;
    fn save_history(&self, entries: &[HistoryEntry]) -> Result<()>;
}

/// Keeps everything in process memory.  Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    scenario: Mutex<Option<Scenario>>,
    history: Mutex<Vec<HistoryEntry>>,
}

impl ScenarioStore for MemoryStore {
    fn load_scenario(&self) -> Result<Option<Scenario>> {
        Ok(lock(&self.scenario).clone())
    }

    fn save_scenario(&self, scenario: &Scenario) -> Result<()> {
        *lock(&self.scenario) = Some(scenario.clone());
        Ok(())
    }

    fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(lock(&self.history).clone())
    }

    fn save_history(&self, entries: &[HistoryEntry]) -> Result<()> {
        *lock(&self.history) = entries.to_vec();
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // A poisoned lock still holds consistent data: every write replaces
    // the value wholesale.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Stores `scenario.json` and `history.json` in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    const SCENARIO_FILE: &'static str = "scenario.json";
    const HISTORY_FILE: &'static str = "history.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.dir.join(file);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::Io { path, source }),
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| Error::Json { path, source })
    }

    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| Error::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(file);
        let data = serde_json::to_string_pretty(value).map_err(|source| Error::Json {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, data).map_err(|source| Error::Io { path, source })
    }
}

impl ScenarioStore for JsonFileStore {
    fn load_scenario(&self) -> Result<Option<Scenario>> {
        self.read(Self::SCENARIO_FILE)
    }

    fn save_scenario(&self, scenario: &Scenario) -> Result<()> {
        self.write(Self::SCENARIO_FILE, scenario)
    }

    fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.read(Self::HISTORY_FILE)?.unwrap_or_default())
    }

    fn save_history(&self, entries: &[HistoryEntry]) -> Result<()> {
        self.write(Self::HISTORY_FILE, entries)
    }
}
