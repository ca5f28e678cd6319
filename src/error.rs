//! Errors for structural rack edits and patch handling.
//!
//! Per-frame processing has no error path; everything here happens between
//! epochs.

use thiserror::Error;

use crate::model::Model;

#[derive(Debug, Error)]
pub enum RackError {
    /// Another module already sits in the column
    #[error("column {0} is already occupied")]
    ColumnOccupied(i32),

    /// The module was removed, or the id came from another rack
    #[error("module handle is stale")]
    StaleHandle,

    /// A typed operation was asked of the wrong kind of module
    #[error("expected a {expected} module, found {found}")]
    WrongModel {
        expected: Model,
        found: Model,
    },

    /// A saved patch names a module this crate does not know
    #[error("unknown module model '{0}'")]
    UnknownModel(String),

    /// Patch JSON could not be read or written
    #[error("patch serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
