//! 媒体引擎适配器
//!
//! 核心只依赖 `AudioCommand` / `AudioEvent` 契约；具体引擎有两种：
//! 基于 rodio 的真实引擎，以及用于无音频环境的模拟引擎。

mod download;
mod engine;
mod messages;
mod null_engine;
mod player;

use tokio::sync::mpsc;

use crate::settings::EngineSettings;

pub use messages::{AudioCommand, AudioEvent, LoadOptions, MediaErrorInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioBackend {
    Real,
    Null,
}

pub fn spawn_audio_worker(
    backend: AudioBackend,
    settings: EngineSettings,
) -> (mpsc::Sender<AudioCommand>, mpsc::Receiver<AudioEvent>) {
    let (tx_cmd, rx_cmd) = mpsc::channel::<AudioCommand>(64);
    let (tx_evt, rx_evt) = mpsc::channel::<AudioEvent>(256);

    match backend {
        AudioBackend::Real => engine::spawn(rx_cmd, tx_evt, settings),
        AudioBackend::Null => null_engine::spawn(rx_cmd, tx_evt, settings),
    }

    (tx_cmd, rx_evt)
}
