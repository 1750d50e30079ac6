use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "trackdeck", version, about = "固定曲目目录的音频播放控制台")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// 覆盖数据目录（默认走系统 data_local_dir）
    #[arg(long, env = "TRACKDECK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// 曲目目录文件（TOML，默认使用内置目录）
    #[arg(long, env = "TRACKDECK_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// 覆盖日志目录（默认 `{data_dir}/logs`）
    #[arg(long, env = "TRACKDECK_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// 覆盖日志过滤（等价于设置 RUST_LOG）
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// 使用模拟引擎，不输出声音
    #[arg(long)]
    pub no_audio: bool,

    /// 以 JSON 行输出状态快照
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 运行交互式控制台（默认）
    Console,

    /// 打印曲目目录后退出
    Tracks,
}

impl Cli {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "trackdeck", "trackdeck")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("trackdeck"))
}

/// `TRACKDECK_NO_AUDIO=1|true|yes|on`
pub fn no_audio_from_env(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v, "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_subcommand() {
        let cli = Cli::try_parse_from([
            "trackdeck",
            "--data-dir",
            "/tmp/td",
            "--no-audio",
            "--json",
            "tracks",
        ])
        .expect("parse");
        assert_eq!(cli.data_dir(), PathBuf::from("/tmp/td"));
        assert!(cli.no_audio);
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Command::Tracks)));
    }

    #[test]
    fn no_audio_env_values() {
        for v in ["1", "true", "yes", "on"] {
            assert!(no_audio_from_env(Some(v)));
        }
        assert!(!no_audio_from_env(Some("0")));
        assert!(!no_audio_from_env(None));
    }
}
