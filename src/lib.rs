//! trackdeck：固定曲目目录的音频播放控制器
//!
//! Core 任务持有播放会话、预热管理器和曲目目录；界面只通过
//! `AppCommand` 发送意图、通过 `AppEvent` 接收快照。

pub mod app;
pub mod audio_worker;
pub mod core;
pub mod domain;
pub mod error;
pub mod features;
pub mod logging;
pub mod messages;
pub mod preload_worker;
pub mod settings;
pub mod ui;
