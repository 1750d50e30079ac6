use serde::Serialize;

use crate::core::infra::{PreloadManager, PreloadView};
use crate::domain::TrackId;
use crate::error::PlaybackError;
use crate::features::player::{PlaybackPhase, PlaybackSession};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub id: TrackId,
    pub title: String,
}

/// UI 渲染快照
///
/// Core 任务持有会话状态，界面只拿到拥有所有权的快照，
/// 通过 `AppEvent::State(Box<AppSnapshot>)` 跨通道传递。
#[derive(Debug, Clone, Serialize)]
pub struct AppSnapshot {
    pub active_track: Option<TrackSummary>,
    pub phase: PlaybackPhase,
    pub is_playing: bool,
    pub is_buffering: bool,
    pub load_progress: f64,
    pub played_fraction: f64,
    /// 秒，未知时为 0
    pub duration: f64,
    pub active_source_uri: Option<String>,
    /// 只有需要展示的错误；格式回退中的单次失败留在会话内部
    pub last_error: Option<PlaybackError>,
    pub exhausted: bool,
    /// 出错或缓冲中时播放按钮不可用
    pub play_pause_enabled: bool,
    pub volume: f32,
    pub preload: Vec<PreloadView>,
    pub status: String,
}

impl AppSnapshot {
    pub fn from_parts(session: &PlaybackSession, preload: &PreloadManager) -> Self {
        let phase = session.phase();
        Self {
            active_track: session.active_track().map(|t| TrackSummary {
                id: t.id,
                title: t.title.clone(),
            }),
            phase,
            is_playing: session.is_playing(),
            is_buffering: session.is_buffering(),
            load_progress: session.load_progress(),
            played_fraction: session.played_fraction(),
            duration: session.duration(),
            active_source_uri: session.active_source_uri().map(str::to_owned),
            last_error: session
                .last_error()
                .filter(|e| e.is_user_facing())
                .cloned(),
            exhausted: session.is_exhausted(),
            play_pause_enabled: session.last_error().is_none() && !session.is_buffering(),
            volume: session.volume(),
            preload: preload.entries(),
            status: status_line(session, phase),
        }
    }

    /// 需要展示给用户的错误
    pub fn visible_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    /// 已播放的秒数
    pub fn elapsed_secs(&self) -> f64 {
        self.played_fraction * self.duration
    }
}

fn status_line(session: &PlaybackSession, phase: PlaybackPhase) -> String {
    match phase {
        PlaybackPhase::Idle => "未选择曲目".to_owned(),
        PlaybackPhase::Loading => "加载中...".to_owned(),
        PlaybackPhase::Ready => "就绪".to_owned(),
        PlaybackPhase::Playing => "播放中".to_owned(),
        PlaybackPhase::Paused => "已暂停".to_owned(),
        PlaybackPhase::Errored if session.is_exhausted() => "播放失败".to_owned(),
        PlaybackPhase::Errored => format!(
            "播放出错，正在尝试备用格式 ({})",
            session.active_source_uri().unwrap_or("-")
        ),
    }
}
