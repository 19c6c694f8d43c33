use thiserror::Error;

use crate::store::StoreError;

/// Failures inside capture and read paths.
///
/// These never reach callers of [`crate::LeadSource`]; they are logged and
/// turned into "nothing captured" or "no data".
#[derive(Debug, Error)]
pub enum LeadSourceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to serialize lead source record: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("stored lead source under {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, LeadSourceError>;
