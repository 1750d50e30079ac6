//! 播放失败后的格式回退策略
//!
//! 候选音源 = 主音源 + 备用音源（按顺序去重）。每次失败取失败音源的下一个候选
//! （环绕）；若下一个就是失败音源本身，或在本次选曲中已尝试过，则判定耗尽。
//! 备用音源加载成功后失败链保留，之后再失败不会回到已失败的音源。

use crate::domain::{Track, TrackId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryDecision {
    /// 改用该音源重新加载
    Retry { uri: String, attempt: usize },
    /// 所有候选都已失败
    Exhausted { attempts: usize },
}

/// 失败链：从选中曲目后的第一次失败开始，到下一次选曲为止
#[derive(Debug, Clone)]
pub struct RecoveryChain {
    track_id: TrackId,
    candidates: Vec<String>,
    tried: Vec<String>,
    resume_playing: bool,
    /// 当前重试的音源已加载成功
    confirmed: bool,
}

impl RecoveryChain {
    /// `resume_playing`：失败前的播放意图，恢复成功后还原
    pub fn start(track: &Track, resume_playing: bool) -> Self {
        Self {
            track_id: track.id,
            candidates: track
                .candidate_sources()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            tried: Vec::new(),
            resume_playing,
            confirmed: false,
        }
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn resume_playing(&self) -> bool {
        self.resume_playing
    }

    pub fn attempts(&self) -> usize {
        self.tried.len()
    }

    pub fn tried(&self) -> &[String] {
        &self.tried
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// 重试的音源加载成功；已尝试的音源仍然记录在案
    pub fn confirm(&mut self) {
        self.confirmed = true;
    }

    /// 成功后又出错：沿用已尝试列表，以新的播放意图继续回退
    pub fn rearm(&mut self, resume_playing: bool) {
        self.confirmed = false;
        self.resume_playing = resume_playing;
    }

    /// 记录 `failed` 失败，并决定下一步
    pub fn advance(&mut self, failed: &str) -> RecoveryDecision {
        if !self.tried.iter().any(|u| u == failed) {
            self.tried.push(failed.to_owned());
        }

        let Some(pos) = self.candidates.iter().position(|u| u == failed) else {
            // 失败音源不在候选列表中，只能放弃
            return RecoveryDecision::Exhausted {
                attempts: self.attempts(),
            };
        };

        let next = &self.candidates[(pos + 1) % self.candidates.len()];
        if next == failed || self.tried.iter().any(|u| u == next) {
            return RecoveryDecision::Exhausted {
                attempts: self.attempts(),
            };
        }

        RecoveryDecision::Retry {
            uri: next.clone(),
            attempt: self.attempts() + 1,
        }
    }
}
