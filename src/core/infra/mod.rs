mod preload;
mod request_tracker;

pub use preload::{PreloadManager, PreloadStatus, PreloadView};
pub use request_tracker::{RequestKey, RequestTracker};
