use crate::app::AppSnapshot;
use crate::domain::TrackId;
use crate::error::PlaybackError;

/// 用户意图
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    SelectTrack { id: TrackId },
    PlayPause,
    Next,
    Prev,
    Seek { fraction: f64 },
    SetVolume { volume: f32 },
    Retry,
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    State(Box<AppSnapshot>),
    Toast(String),
    Error(PlaybackError),
}
