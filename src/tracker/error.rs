use thiserror::Error;

/// Errors surfaced by the tracking components.
///
/// These stay internal to a frame: the tracker logs and recovers, so
/// callers only ever observe a (possibly unchanged) roster.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The assignment solver only accepts nonnegative cost matrices.
    #[error("cost matrix contains negative entries")]
    NegativeCost,
    /// Position-only gating is exposed in the interface but has no
    /// implemented code path.
    #[error("position-only gating is not supported")]
    PositionOnlyGating,
}
