/// Track state enumeration for the object tracking lifecycle.
///
/// Newly created tracks are `Tentative` until enough consecutive updates
/// have been collected. Tracks that are gone for good become `Deleted`
/// and are removed from the roster at the end of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Newly created track, not yet confirmed
    #[default]
    Tentative,
    /// Track with enough evidence to count as a stable identity
    Confirmed,
    /// Track scheduled for removal
    Deleted,
}
