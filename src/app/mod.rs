mod snapshot;

pub use snapshot::{AppSnapshot, TrackSummary};
