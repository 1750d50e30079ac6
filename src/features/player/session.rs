//! 播放会话：当前曲目、播放/缓冲状态、进度与错误
//!
//! 概念状态 `Idle → Loading → Ready ⇄ Playing ⇄ Paused`，外加正交的出错状态，
//! 由 [`PlaybackSession::phase`] 从字段推导，不单独存储。
//! 每次向引擎发 `Load` 都会分配新的 generation，只接受当前 generation 的事件。

use std::time::Duration;

use serde::Serialize;

use super::recovery::{RecoveryChain, RecoveryDecision};
use crate::audio_worker::{AudioCommand, LoadOptions, MediaErrorInfo};
use crate::core::effects::CoreEffects;
use crate::core::infra::{RequestKey, RequestTracker};
use crate::core::utils::next_id;
use crate::domain::Track;
use crate::error::PlaybackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Errored,
}

pub struct PlaybackSession {
    active_track: Option<Track>,
    is_playing: bool,
    is_buffering: bool,
    /// 当前音源已被引擎确认可播放
    ready: bool,
    ended: bool,
    load_progress: f64,
    played_fraction: f64,
    duration: f64,
    active_source_uri: Option<String>,
    last_error: Option<PlaybackError>,
    volume: f32,

    recovery: Option<RecoveryChain>,
    req_id: u64,
    request_tracker: RequestTracker<RequestKey>,
    preferred_format: Option<String>,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(None, 1.0)
    }
}

impl PlaybackSession {
    pub fn new(preferred_format: Option<String>, volume: f32) -> Self {
        Self {
            active_track: None,
            is_playing: false,
            is_buffering: false,
            ready: false,
            ended: false,
            load_progress: 0.0,
            played_fraction: 0.0,
            duration: 0.0,
            active_source_uri: None,
            last_error: None,
            volume: if volume.is_finite() {
                volume.clamp(0.0, 1.0)
            } else {
                1.0
            },
            recovery: None,
            req_id: 1,
            request_tracker: RequestTracker::new(),
            preferred_format: preferred_format.filter(|f| !f.is_empty()),
        }
    }

    pub fn active_track(&self) -> Option<&Track> {
        self.active_track.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_buffering(&self) -> bool {
        self.is_buffering
    }

    pub fn load_progress(&self) -> f64 {
        self.load_progress
    }

    pub fn played_fraction(&self) -> f64 {
        self.played_fraction
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn active_source_uri(&self) -> Option<&str> {
        self.active_source_uri.as_deref()
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// 本次选曲中已失败的音源数
    pub fn recovery_attempts(&self) -> usize {
        self.recovery.as_ref().map_or(0, RecoveryChain::attempts)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(
            self.last_error,
            Some(PlaybackError::ExhaustedFormats { .. })
        )
    }

    /// 当前加载请求的 generation（耗尽或停止后为 None）
    pub fn generation(&self) -> Option<u64> {
        self.request_tracker.get_pending(&RequestKey::MediaLoad)
    }

    /// 事件是否属于当前加载请求
    pub fn accepts(&self, generation: u64) -> bool {
        self.request_tracker
            .is_current(&RequestKey::MediaLoad, generation)
    }

    pub fn phase(&self) -> PlaybackPhase {
        if self.active_track.is_none() {
            PlaybackPhase::Idle
        } else if self.last_error.is_some() {
            PlaybackPhase::Errored
        } else if self.is_buffering || !self.ready {
            PlaybackPhase::Loading
        } else if self.is_playing {
            PlaybackPhase::Playing
        } else if self.played_fraction > 0.0 {
            PlaybackPhase::Paused
        } else {
            PlaybackPhase::Ready
        }
    }

    /// 用户选中曲目：重置该曲目的状态，从主音源开始加载并播放
    pub fn select_track(&mut self, track: &Track, effects: &mut CoreEffects) {
        tracing::info!(track_id = %track.id, title = %track.title, "选择曲目");
        self.bind_track(track, true, effects);
    }

    /// 启动时预备第一首曲目（默认不自动播放）
    pub fn cue_initial(&mut self, track: &Track, autoplay: bool, effects: &mut CoreEffects) {
        tracing::info!(track_id = %track.id, autoplay, "预备初始曲目");
        self.bind_track(track, autoplay, effects);
    }

    fn bind_track(&mut self, track: &Track, autoplay: bool, effects: &mut CoreEffects) {
        self.active_track = Some(track.clone());
        self.duration = 0.0;
        self.played_fraction = 0.0;
        self.load_progress = 0.0;
        self.last_error = None;
        self.recovery = None;
        self.ready = false;
        self.ended = false;
        self.active_source_uri = Some(track.primary_uri.clone());
        self.is_playing = autoplay;
        self.is_buffering = true;
        self.issue_load(track.primary_uri.clone(), autoplay, effects);
    }

    fn issue_load(&mut self, uri: String, autoplay: bool, effects: &mut CoreEffects) {
        let generation = self
            .request_tracker
            .issue(RequestKey::MediaLoad, || next_id(&mut self.req_id));
        tracing::debug!(generation, uri = %uri, autoplay, "发出加载请求");
        effects.send_audio_warn(
            AudioCommand::Load {
                generation,
                uri,
                options: LoadOptions {
                    preferred_format: self.preferred_format.clone(),
                    autoplay,
                },
            },
            "AudioWorker 通道已关闭：Load 发送失败",
        );
    }

    /// 切换播放/暂停；出错期间拒绝，状态不变
    pub fn toggle_play_pause(&mut self, effects: &mut CoreEffects) -> Result<(), PlaybackError> {
        if self.last_error.is_some() {
            tracing::debug!(error = ?self.last_error, "出错状态下忽略播放/暂停");
            return Err(PlaybackError::ControlsLocked);
        }
        if self.active_track.is_none() {
            return Ok(());
        }

        if self.is_playing {
            self.is_playing = false;
            effects.send_audio_warn(AudioCommand::Pause, "AudioWorker 通道已关闭：Pause 发送失败");
        } else {
            if self.ended {
                self.ended = false;
                self.played_fraction = 0.0;
            }
            self.is_playing = true;
            effects.send_audio_warn(AudioCommand::Play, "AudioWorker 通道已关闭：Play 发送失败");
        }
        Ok(())
    }

    /// 跳转到 `fraction`（钳制到 [0,1]，NaN 视为 0），立即更新进度
    pub fn seek(&mut self, fraction: f64, effects: &mut CoreEffects) -> f64 {
        let target = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        if fraction.is_nan() || target != fraction {
            let err = PlaybackError::InvalidSeekTarget(fraction);
            tracing::debug!(err = %err, target, "跳转位置已钳制");
        }

        if self.active_track.is_none() {
            return target;
        }

        self.played_fraction = target;
        if target < 1.0 {
            self.ended = false;
        }
        let offset = Duration::try_from_secs_f64(target * self.duration).unwrap_or_default();
        effects.send_audio_warn(
            AudioCommand::SeekTo {
                fraction: target,
                offset,
            },
            "AudioWorker 通道已关闭：SeekTo 发送失败",
        );
        target
    }

    pub fn set_volume(&mut self, volume: f32, effects: &mut CoreEffects) -> f32 {
        if !volume.is_finite() {
            tracing::debug!(volume, "忽略无效音量");
            return self.volume;
        }
        self.volume = volume.clamp(0.0, 1.0);
        effects.send_audio_warn(
            AudioCommand::SetVolume(self.volume),
            "AudioWorker 通道已关闭：SetVolume 发送失败",
        );
        self.volume
    }

    /// 引擎进度回报：唯一推进播放/加载进度的路径
    pub fn on_progress(&mut self, played: f64, loaded: f64) {
        if loaded.is_finite() {
            self.load_progress = loaded.clamp(0.0, 1.0);
        }
        if self.duration <= 0.0 {
            self.played_fraction = 0.0;
        } else if played.is_finite() {
            self.played_fraction = played.clamp(0.0, 1.0);
        }
    }

    pub fn on_duration_known(&mut self, seconds: f64) {
        if !seconds.is_finite() || seconds < 0.0 {
            tracing::debug!(seconds, "忽略无效时长");
            return;
        }
        self.duration = seconds;
    }

    pub fn on_buffer_start(&mut self) {
        self.is_buffering = true;
    }

    pub fn on_buffer_end(&mut self) {
        self.is_buffering = false;
        self.load_progress = 1.0;
        self.ready = true;
        self.confirm_recovery();
    }

    pub fn on_ready(&mut self) {
        self.is_buffering = false;
        self.load_progress = 1.0;
        self.ready = true;
        self.confirm_recovery();
    }

    /// 重试的音源加载成功：清除错误，恢复失败前的播放意图；失败链保留到下一次选曲
    fn confirm_recovery(&mut self) {
        let Some(chain) = self.recovery.as_mut().filter(|c| !c.is_confirmed()) else {
            return;
        };
        chain.confirm();
        tracing::info!(
            track_id = %chain.track_id(),
            uri = ?self.active_source_uri,
            attempts = chain.attempts(),
            "格式回退成功"
        );
        self.last_error = None;
        self.is_playing = chain.resume_playing();
    }

    pub fn on_ended(&mut self) {
        self.is_playing = false;
        self.ended = true;
        self.played_fraction = 1.0;
        self.load_progress = 1.0;
    }

    /// 引擎报错：记录错误并交给回退策略；耗尽时返回需要展示的错误
    pub fn on_error(
        &mut self,
        info: MediaErrorInfo,
        effects: &mut CoreEffects,
    ) -> Option<PlaybackError> {
        let track = self.active_track.clone()?;
        let failed = self
            .active_source_uri
            .clone()
            .unwrap_or_else(|| info.uri.clone());
        tracing::warn!(track_id = %track.id, uri = %failed, err = %info.message, "音源播放失败");

        let intent = self.is_playing;
        let chain = self
            .recovery
            .get_or_insert_with(|| RecoveryChain::start(&track, intent));
        if chain.is_confirmed() {
            chain.rearm(intent);
        }
        let decision = chain.advance(&failed);

        self.last_error = Some(PlaybackError::PlaybackFailure {
            uri: failed,
            message: info.message,
        });
        self.is_buffering = false;
        self.is_playing = false;

        match decision {
            RecoveryDecision::Retry { uri, attempt } => {
                tracing::info!(track_id = %track.id, uri = %uri, attempt, "尝试备用格式");
                let autoplay = chain.resume_playing();
                self.active_source_uri = Some(uri.clone());
                self.ready = false;
                self.ended = false;
                self.duration = 0.0;
                self.played_fraction = 0.0;
                self.load_progress = 0.0;
                self.issue_load(uri, autoplay, effects);
                None
            }
            RecoveryDecision::Exhausted { attempts } => {
                let err = PlaybackError::ExhaustedFormats {
                    track_id: track.id,
                    attempts,
                };
                tracing::error!(track_id = %track.id, attempts, "所有音源均播放失败");
                self.recovery = None;
                self.request_tracker.clear(&RequestKey::MediaLoad);
                self.last_error = Some(err.clone());
                Some(err)
            }
        }
    }

    /// 退出前停止引擎；之后的事件一律丢弃
    pub fn stop(&mut self, effects: &mut CoreEffects) {
        self.is_playing = false;
        self.is_buffering = false;
        self.recovery = None;
        self.request_tracker.clear(&RequestKey::MediaLoad);
        effects.send_audio_warn(AudioCommand::Stop, "AudioWorker 通道已关闭：Stop 发送失败");
    }
}
