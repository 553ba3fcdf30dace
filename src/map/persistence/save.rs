//! Writing map documents.

use std::path::Path;

use tracing::info;

use crate::map::{MapDocument, SavedMap};

use super::PersistenceError;

/// Serialize a document as pretty-printed JSON
pub fn serialize_map(doc: &MapDocument) -> Result<Vec<u8>, PersistenceError> {
    Ok(serde_json::to_vec_pretty(&SavedMap::from_document(doc))?)
}

/// Write a document to `path` and clear its dirty flag.
///
/// Missing parent directories are created.
pub fn save_map(doc: &mut MapDocument, path: &Path) -> Result<(), PersistenceError> {
    let json = serialize_map(doc)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, json).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    doc.mark_saved();
    info!("Map saved to {:?}", path);
    Ok(())
}
