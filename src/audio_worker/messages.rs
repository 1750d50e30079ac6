use serde::Serialize;
use std::time::Duration;

/// 加载选项
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// 偏好格式（如 "mp3"），仅作为解码提示
    pub preferred_format: Option<String>,
    /// 就绪后是否立即播放
    pub autoplay: bool,
}

/// 发给媒体引擎的命令（发出即忘，结果通过 `AudioEvent` 回报）
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    /// 绑定新音源；`generation` 会原样出现在该音源的所有事件里
    Load {
        generation: u64,
        uri: String,
        options: LoadOptions,
    },
    Play,
    Pause,
    /// `offset` = fraction × duration（时长未知时为 0）
    SeekTo {
        fraction: f64,
        offset: Duration,
    },
    SetVolume(f32),
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaErrorInfo {
    pub uri: String,
    pub message: String,
}

impl MediaErrorInfo {
    pub fn new(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            message: message.into(),
        }
    }
}

/// 媒体引擎回报的异步事件，均带有所属的 generation
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Progress {
        generation: u64,
        played: f64,
        loaded: f64,
    },
    Duration {
        generation: u64,
        seconds: f64,
    },
    BufferStart {
        generation: u64,
    },
    BufferEnd {
        generation: u64,
    },
    Ready {
        generation: u64,
    },
    Ended {
        generation: u64,
    },
    Error {
        generation: u64,
        info: MediaErrorInfo,
    },
}

impl AudioEvent {
    pub fn generation(&self) -> u64 {
        match self {
            AudioEvent::Progress { generation, .. }
            | AudioEvent::Duration { generation, .. }
            | AudioEvent::BufferStart { generation }
            | AudioEvent::BufferEnd { generation }
            | AudioEvent::Ready { generation }
            | AudioEvent::Ended { generation }
            | AudioEvent::Error { generation, .. } => *generation,
        }
    }
}
