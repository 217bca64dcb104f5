use std::path::PathBuf;
use thiserror::Error;

/// Per-file conversion failures surfaced to the batch driver. Everything
/// else (missing nested files, unknown node types, failed asset lookups)
/// degrades in place and never crosses a builder or walker boundary.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to parse scene document {path}")]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to persist converted asset {path}")]
    Persist {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}
