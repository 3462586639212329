//! Protocol error types.

use crate::codec::MessageFormat;
use thiserror::Error;

/// Errors produced while encoding or decoding wire frames.
///
/// These never cross a node's public boundary; nodes report them on their
/// log channel and drop the offending frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported message format: {0}")]
    UnsupportedFormat(MessageFormat),
}
