mod deep_sort;
mod error;
mod hungarian;
mod kalman_filter;
mod matching;
mod rect;
mod track;
mod track_state;

pub use deep_sort::DeepSort;
pub use error::Error;
pub use rect::Rect;
pub use track::Track;
pub use track_state::TrackState;
