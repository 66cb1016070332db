//! Error taxonomy for the catalog subsystem.
//!
//! "Not found" and "stale version" are not errors here: they surface as
//! `None` from resolution so a batch restore can skip individual items.
//! Sandbox refusals stay loud and distinguishable from ordinary corruption.

use thiserror::Error;

/// Failure while serializing an item into a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The item cannot represent itself as a snapshot. Callers degrade to a
    /// best-effort reference instead of aborting.
    #[error("snapshot unsupported: {0}")]
    Unsupported(String),
    /// Resource-exhaustion-class failure. Always propagates.
    #[error("snapshot resource failure: {0}")]
    Resource(#[from] std::io::Error),
}

/// Failure inside the sandboxed deserializer.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The payload asked for something the policy does not trust. Signals
    /// possibly-hostile persisted data.
    #[error("deserialization refused: {0}")]
    Refused(String),
    /// The payload bytes do not parse as a snapshot envelope.
    #[error("malformed snapshot payload: {0}")]
    Malformed(String),
    /// Module and symbol passed the policy, but no decoder is registered
    /// under the tag.
    #[error("no decoder registered for type tag {0}")]
    UnknownType(String),
}

/// Failure surfaced by the identity resolver.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// The resolve walk was cancelled through its token.
    #[error("resolution cancelled")]
    Cancelled,
}
