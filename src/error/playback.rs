//! 播放控制错误

use serde::Serialize;

use crate::domain::TrackId;

/// 播放会话错误
///
/// `PlaybackFailure` 由格式回退策略在本地处理，只有升级为
/// `ExhaustedFormats` 时才展示给用户。
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PlaybackError {
    /// 引擎无法播放当前绑定的音源（可通过切换格式恢复）
    #[error("播放失败({uri}): {message}")]
    PlaybackFailure { uri: String, message: String },

    /// 该曲目的所有候选音源均已失败
    #[error("曲目 {track_id} 的所有音源均播放失败（共尝试 {attempts} 个）")]
    ExhaustedFormats { track_id: TrackId, attempts: usize },

    /// 跳转位置越界（会被钳制，不展示）
    #[error("无效的跳转位置: {0}")]
    InvalidSeekTarget(f64),

    #[error("曲目查找失败: {0}")]
    CatalogLookupFailure(TrackId),

    /// 出错状态下禁止播放/暂停
    #[error("播放出错，请切换曲目或重试")]
    ControlsLocked,
}

impl PlaybackError {
    /// 是否需要在界面上展示
    pub fn is_user_facing(&self) -> bool {
        matches!(self, PlaybackError::ExhaustedFormats { .. })
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlaybackError::PlaybackFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exhausted_is_user_facing() {
        let failure = PlaybackError::PlaybackFailure {
            uri: "/a.mp3".to_owned(),
            message: "decode".to_owned(),
        };
        assert!(!failure.is_user_facing());
        assert!(failure.is_recoverable());

        let exhausted = PlaybackError::ExhaustedFormats {
            track_id: TrackId(2),
            attempts: 2,
        };
        assert!(exhausted.is_user_facing());
        assert!(!exhausted.is_recoverable());
    }

    #[test]
    fn test_playback_error_display() {
        let err = PlaybackError::ExhaustedFormats {
            track_id: TrackId(2),
            attempts: 2,
        };
        assert!(err.to_string().contains("曲目 2"));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let err = PlaybackError::ExhaustedFormats {
            track_id: TrackId(2),
            attempts: 2,
        };
        let v = serde_json::to_value(&err).expect("json");
        assert_eq!(v["kind"], "exhausted_formats");
        assert_eq!(v["detail"]["track_id"], 2);

        let v = serde_json::to_value(PlaybackError::InvalidSeekTarget(1.5)).expect("json");
        assert_eq!(v["kind"], "invalid_seek_target");
        assert_eq!(v["detail"], 1.5);

        let v = serde_json::to_value(PlaybackError::ControlsLocked).expect("json");
        assert_eq!(v["kind"], "controls_locked");
    }
}
