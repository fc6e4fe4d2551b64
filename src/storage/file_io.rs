//! Document file helpers
//!
//! Every document is a single pretty-printed JSON file. Writes go through a
//! sibling `.tmp` file that is synced and renamed over the target, so readers
//! only ever see a complete document.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{TallyError, TallyResult};

/// Read a document; `None` when the file does not exist
pub fn read_document<T: DeserializeOwned>(path: &Path) -> TallyResult<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(TallyError::Storage(format!(
                "Cannot read {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| TallyError::Storage(format!("Corrupt document {}: {}", path.display(), e)))
}

/// Replace a document atomically, creating its directory if needed
pub fn write_document<T: Serialize>(path: &Path, document: &T) -> TallyResult<()> {
    let storage_err =
        |what: &str, e: std::io::Error| TallyError::Storage(format!("{} {}: {}", what, path.display(), e));

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| storage_err("Cannot create directory for", e))?;
    }

    let body = serde_json::to_vec_pretty(document)?;
    let staging = path.with_extension("json.tmp");

    let mut file =
        fs::File::create(&staging).map_err(|e| storage_err("Cannot stage write for", e))?;
    file.write_all(&body)
        .and_then(|()| file.sync_all())
        .map_err(|e| storage_err("Cannot write", e))?;

    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(storage_err("Cannot replace", e));
    }

    Ok(())
}

/// Delete a document, returning whether there was one
pub fn remove_document(path: &Path) -> TallyResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(TallyError::Storage(format!(
            "Cannot remove {}: {}",
            path.display(),
            e
        ))),
    }
}
