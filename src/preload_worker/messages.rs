use serde::Serialize;

use crate::domain::TrackId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadCommand {
    /// 为曲目创建预热句柄（同一曲目的旧句柄会先被释放）
    Prime {
        track_id: TrackId,
        generation: u64,
        uri: String,
    },
    Release {
        track_id: TrackId,
    },
    ReleaseAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadEvent {
    Primed {
        track_id: TrackId,
        generation: u64,
        metadata: SourceMetadata,
    },
    Failed {
        track_id: TrackId,
        generation: u64,
        message: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceMetadata {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}
