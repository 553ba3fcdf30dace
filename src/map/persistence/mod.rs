//! Map persistence: JSON save files for map documents.
//!
//! ## Module Structure
//!
//! - [`save`] - Serializing documents and writing them to disk
//! - [`load`] - Reading save files and rebuilding validated documents
//!
//! Loading never trusts the file: ids, bounds and cell occupancy are checked
//! before a document is handed back. History is not saved.

mod load;
mod save;


use std::path::PathBuf;

use thiserror::Error;

pub use load::{deserialize_map, load_map};
pub use save::{save_map, serialize_map};

/// Reasons a map could not be saved or loaded
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed map file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported save format version {found} (expected at most {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("invalid map: {0}")]
    Invalid(String),
}
