//! Validation and filtering applied to a snapshot before it is trusted.

pub mod freshness;
pub mod items;
pub mod rates;
pub mod snapshot;

pub use freshness::{Freshness, classify, parse_last_update};
pub use snapshot::{AuditOutcome, AuditStatus, audit_snapshot};
