use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub player: PlayerSettings,
    pub preload: PreloadSettings,
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// 传给引擎的偏好格式提示
    pub preferred_format: String,
    /// 启动时直接播放第一首（默认只就绪不播放）
    pub autoplay: bool,
    pub volume: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            preferred_format: "mp3".to_owned(),
            autoplay: false,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadSettings {
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub http_timeout_secs: u64,
    pub http_connect_timeout_secs: u64,
    pub download_retries: u32,
    pub download_retry_backoff_ms: u64,
    pub download_retry_backoff_max_ms: u64,
    /// 播放进度上报间隔
    pub progress_interval_ms: u64,

    // 模拟引擎（--no-audio）
    pub simulated_duration_secs: f64,
    /// 模拟引擎中会加载失败的音源
    pub simulated_failures: Vec<String>,
    /// 模拟引擎中能加载、但开始播放后出错的音源
    pub simulated_playback_failures: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            http_timeout_secs: 30,
            http_connect_timeout_secs: 10,
            download_retries: 2,
            download_retry_backoff_ms: 250,
            download_retry_backoff_max_ms: 2000,
            progress_interval_ms: 500,
            simulated_duration_secs: 180.0,
            simulated_failures: Vec::new(),
            simulated_playback_failures: Vec::new(),
        }
    }
}

pub fn load_settings(data_dir: &Path) -> AppSettings {
    let p = settings_path(data_dir);
    let Ok(text) = fs::read_to_string(&p) else {
        return AppSettings::default();
    };
    match toml::from_str(&text) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = %p.display(), err = %e, "设置文件解析失败，使用默认设置");
            AppSettings::default()
        }
    }
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.toml")
}
