use crate::audit::AuditStatus;
use thiserror::Error;

/// Why a refresh did not publish a new snapshot.
#[derive(Debug, Error)]
pub enum RefreshFailure {
    #[error("network unavailable: {0}")]
    Transport(anyhow::Error),

    #[error("invalid data format: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(AuditStatus),
}
