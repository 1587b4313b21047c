//! Save/Load of floor bookkeeping
//!
//! Uses bincode for a compact binary snapshot of every floor's seed, visited
//! flag and cached layout. Room instances are never saved; a revisited floor
//! is rebuilt from its cached layout.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

use crate::cache::MemoryFloorStore;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the floor store
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub store: MemoryFloorStore,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Save the floor store to a writer
pub fn save_floors<W: Write>(writer: W, store: &MemoryFloorStore) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        store: store.clone(),
    };
    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a floor store from a reader
pub fn load_floors<R: Read>(reader: R) -> Result<MemoryFloorStore, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    Ok(save_data.store)
}
