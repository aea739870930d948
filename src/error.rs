// Broadcast errors — failure kinds surfaced by a broadcast run.
//
// Everything below the pipeline reports through `anyhow`; the pipeline
// boundary sorts those errors into the kinds callers act on differently.
// An empty segment is not here: it is a successful run that sent nothing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The caller lacks the admin session. Checked before any other work.
    #[error("Unauthorized")]
    Unauthorized,

    /// A registry read failed while resolving the segment, including the
    /// referrer projection.
    #[error("Registry query failed: {0:#}")]
    SegmentQueryFailed(anyhow::Error),

    /// The delivery provider rejected or failed the batch.
    #[error("Failed to send batch emails: {0:#}")]
    DispatchFailed(anyhow::Error),
}

impl BroadcastError {
    /// Short machine-readable name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            BroadcastError::Unauthorized => "unauthorized",
            BroadcastError::SegmentQueryFailed(_) => "segment_query_failed",
            BroadcastError::DispatchFailed(_) => "dispatch_failed",
        }
    }
}
