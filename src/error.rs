//! Error type for clock operations.

use thiserror::Error;

/// Errors surfaced by clock operations.
///
/// Everything else on the clock is total: `tick`, `run`, `stop`, and
/// `reset` cannot fail. A voice abandoned at the barrier by a clock that
/// is stopped and never restarted is a liveness hazard for the caller to
/// avoid, not an error value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConductorError {
    /// A symbolic id did not name any known meter.
    #[error("unknown time signature `{0}`")]
    UnknownTimeSignature(String),

    /// A host-supplied dependency was never injected before use.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),
}
