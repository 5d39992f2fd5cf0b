//! Level template fragments
//!
//! A new level entry is assembled as `ham + bur + objects + ger`: `ham` opens
//! the level dictionary (key, name and description), `bur` opens the level
//! string with its header, and `ger` closes the string and the dictionary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

const BUILTIN: &str = include_str!("../../assets/leveldata.json");

/// Error type for loading fragments
#[derive(Debug, Error)]
pub enum FragmentsError {
    #[error("Failed to read fragments file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid fragments file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The literal text surrounding generated objects in a new level entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragments {
    pub ham: String,
    pub bur: String,
    pub ger: String,
}

impl Fragments {
    /// Fragments shipped with the binary.
    pub fn builtin() -> Result<Self, FragmentsError> {
        Ok(serde_json::from_str(BUILTIN)?)
    }

    /// Load fragments from a JSON file with `ham`, `bur` and `ger` fields.
    pub fn load(path: &Path) -> Result<Self, FragmentsError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load from `path` if given, otherwise use the built-in fragments.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, FragmentsError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }
}
