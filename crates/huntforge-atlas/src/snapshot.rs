//! Durable three-file save format.
//!
//! A save directory holds `data.json` (position-keyed hint map),
//! `nameIdData.json` (name registry) and `excludedCoordinates.json`
//! (excluded key list). File names and shapes are shared with the other
//! tools consuming these dumps, so they must not drift.
//!
//! The three files are written sequentially; a crash in the middle of a save
//! can leave them inconsistent. Accepted: saves happen once, at shutdown.

use crate::{Atlas, NameRegistry, PositionRecord};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// Position-keyed hint map.
pub const POSITIONS_FILE: &str = "data.json";
/// Name registry.
pub const NAMES_FILE: &str = "nameIdData.json";
/// Excluded coordinate keys.
pub const EXCLUDED_FILE: &str = "excludedCoordinates.json";

/// Snapshot I/O failures.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("cannot {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed save file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// True when `dir` already holds a save.
#[must_use]
pub fn exists(dir: &Path) -> bool {
    dir.join(POSITIONS_FILE).exists()
}

/// Write all three save files under `dir`, creating it if needed.
pub fn save(dir: &Path, atlas: &Atlas) -> Result<(), SnapshotError> {
    fs::create_dir_all(dir).map_err(|source| SnapshotError::Io {
        op: "create save directory",
        path: dir.to_path_buf(),
        source,
    })?;

    write_json(dir.join(POSITIONS_FILE), atlas.positions())?;
    write_json(dir.join(NAMES_FILE), atlas.names())?;
    let excluded: Vec<&String> = atlas.excluded().iter().collect();
    write_json(dir.join(EXCLUDED_FILE), &excluded)?;

    tracing::info!(path = %dir.display(), "snapshot written");
    Ok(())
}

/// Load a full save from `dir` into a clean atlas.
pub fn load(dir: &Path) -> Result<Atlas, SnapshotError> {
    tracing::info!(path = %dir.display(), "loading snapshot");

    let positions: IndexMap<String, PositionRecord> = read_json(dir.join(POSITIONS_FILE))?;
    let names: NameRegistry = read_json(dir.join(NAMES_FILE))?;
    let excluded: Vec<String> = read_json(dir.join(EXCLUDED_FILE))?;

    Ok(Atlas::from_parts(
        positions,
        names,
        excluded.into_iter().collect::<BTreeSet<_>>(),
    ))
}

fn write_json<T: Serialize>(path: PathBuf, value: &T) -> Result<(), SnapshotError> {
    let body = serde_json::to_vec(value).map_err(|source| SnapshotError::Malformed {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, body).map_err(|source| SnapshotError::Io {
        op: "write",
        path,
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: PathBuf) -> Result<T, SnapshotError> {
    let body = fs::read(&path).map_err(|source| SnapshotError::Io {
        op: "read",
        path: path.clone(),
        source,
    })?;
    serde_json::from_slice(&body).map_err(|source| SnapshotError::Malformed { path, source })
}
