//! Store-level errors.

use thiserror::Error;

/// Errors from the backing plan/usage store.
///
/// The gate converts these at its boundary according to the fail-open
/// policy; policy denials are never errors (they are [`Decision`] data).
///
/// [`Decision`]: crate::gate::Decision
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
