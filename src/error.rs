//! Error types shared across the Pokedex core
//!
//! The cache and discovery tracker have total contracts and never fail. Only the
//! API client, the party and the persistence gateway produce these errors.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors surfaced by the API client, party and persistence layers
#[derive(Debug, Error)]
pub enum PokedexError {
    /// An identifier or command argument was empty or malformed
    #[error("invalid input: {0}")]
    Validation(String),

    /// A party member or caught Pokemon does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Network failure, non-2xx status or timeout
    #[error("request failed: {0}")]
    Transport(String),

    /// A response body or cached payload could not be decoded
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// The party already holds the maximum number of members
    #[error("party is full (maximum {0} Pokemon)")]
    Capacity(usize),

    /// The Pokemon is already a member of the party
    #[error("{0} is already in the party")]
    Conflict(String),

    /// Reading or writing the save file failed
    #[error("save file {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },
}

impl PokedexError {
    pub(crate) fn persistence(path: &Path, message: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

impl From<reqwest::Error> for PokedexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("timed out: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PokedexError>;
