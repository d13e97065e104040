//! Saving and loading game state
//!
//! The whole state is written as one pretty-printed JSON document. Saves go to
//! a sibling temporary file first and are then renamed over the real file, so
//! an interrupted save leaves the previous file intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::api::Pokemon;
use crate::discovery::DiscoveryTracker;
use crate::error::{PokedexError, Result};
use crate::party::{self, PartyMember};

/// Default save file name
pub const DATA_FILE_NAME: &str = "pokedata.json";

/// Save directory created inside a writable working directory
pub const WORKDIR_DATA_DIR: &str = ".pokedexclidata";

/// Save directory created inside the home directory as a fallback
pub const HOME_DATA_DIR: &str = ".pokedexcli";

/// Durable image of the player's progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedState {
    /// Every Pokemon ever caught, keyed by name
    #[serde(default)]
    pub caught_pokemon: BTreeMap<String, Pokemon>,
    #[serde(default)]
    pub party_members: Vec<PartyMember>,
    #[serde(default)]
    pub discoveries: DiscoveryTracker,
}

impl PersistedState {
    pub fn is_empty(&self) -> bool {
        self.caught_pokemon.is_empty()
            && self.party_members.is_empty()
            && self.discoveries.is_empty()
    }
}

/// Reads and writes `PersistedState` at a fixed path
#[derive(Debug)]
pub struct Persistence {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl Persistence {
    /// Uses `path` as the save file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    /// Resolves the save file location from the process environment
    ///
    /// Prefers `.pokedexclidata/` in the working directory; falls back to
    /// `.pokedexcli/` in the home directory if the working directory is not
    /// writable.
    pub fn resolve(file_name: &str) -> Result<Self> {
        let work_dir = std::env::current_dir().ok();
        let base_dirs = BaseDirs::new();
        let home_dir = base_dirs.as_ref().map(BaseDirs::home_dir);
        Self::resolve_in(work_dir.as_deref(), home_dir, file_name)
    }

    /// Same as [`Persistence::resolve`] with explicit candidate directories
    pub fn resolve_in(
        work_dir: Option<&Path>,
        home_dir: Option<&Path>,
        file_name: &str,
    ) -> Result<Self> {
        if let Some(work_dir) = work_dir {
            let dir = work_dir.join(WORKDIR_DATA_DIR);
            match ensure_writable(&dir) {
                Ok(()) => {
                    let path = dir.join(file_name);
                    info!(path = %path.display(), "using save file");
                    return Ok(Self::with_path(path));
                }
                Err(err) => {
                    debug!(dir = %dir.display(), %err, "working directory not writable");
                }
            }
        }

        let home_dir = home_dir.ok_or_else(|| {
            PokedexError::persistence(
                Path::new(file_name),
                "no writable working directory and no home directory",
            )
        })?;
        let dir = home_dir.join(HOME_DATA_DIR);
        ensure_writable(&dir).map_err(|err| PokedexError::persistence(&dir, err))?;
        let path = dir.join(file_name);
        info!(path = %path.display(), "using save file in home directory");
        Ok(Self::with_path(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved state
    ///
    /// A missing file yields an empty state. An unreadable or malformed file,
    /// including one with unknown top-level fields or a party of more than six
    /// or with a repeated Pokemon, is an error.
    pub fn load(&self) -> Result<PersistedState> {
        let _guard = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "save file not found, starting fresh");
                return Ok(PersistedState::default());
            }
            Err(err) => {
                error!(path = %self.path.display(), %err, "failed to read save file");
                return Err(PokedexError::persistence(&self.path, err));
            }
        };

        let state: PersistedState = serde_json::from_slice(&content).map_err(|err| {
            error!(path = %self.path.display(), %err, "failed to decode save file");
            PokedexError::persistence(&self.path, format!("corrupt save file: {err}"))
        })?;
        party::check_members(&state.party_members).map_err(|err| {
            error!(path = %self.path.display(), %err, "saved party breaks the party rules");
            PokedexError::persistence(&self.path, format!("corrupt save file: {err}"))
        })?;

        debug!(
            caught = state.caught_pokemon.len(),
            party = state.party_members.len(),
            discoveries = state.discoveries.total_discoveries(),
            "save file loaded"
        );
        Ok(state)
    }

    /// Overwrites the save file with `state`
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        let _guard = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let json = serde_json::to_vec_pretty(state)
            .map_err(|err| PokedexError::persistence(&self.path, err))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| PokedexError::persistence(parent, err))?;
        }

        let tmp_path = temp_path(&self.path);
        if let Err(err) = fs::write(&tmp_path, &json) {
            let _ = fs::remove_file(&tmp_path);
            error!(path = %tmp_path.display(), %err, "failed to write save file");
            return Err(PokedexError::persistence(&tmp_path, err));
        }
        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            error!(path = %self.path.display(), %err, "failed to replace save file");
            return Err(PokedexError::persistence(&self.path, err));
        }

        info!(path = %self.path.display(), "data saved");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Creates `dir` if needed and checks a file can be written inside it
fn ensure_writable(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let probe = dir.join(".write_test");
    fs::write(&probe, b"test")?;
    fs::remove_file(&probe)
}
