use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "trackdeck.log";
const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";

/// 持有非阻塞写入线程；进程结束前不能 drop，否则尾部日志会丢失
pub struct LogGuard(#[allow(dead_code)] Option<WorkerGuard>);

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub dir: Option<PathBuf>,
    pub filter: Option<String>,
}

/// 日志目录：显式指定 > `{data_dir}/logs`；无法创建时退回临时目录
fn resolve_log_dir(data_dir: &Path, dir: Option<PathBuf>) -> PathBuf {
    let log_dir = dir.unwrap_or_else(|| data_dir.join("logs"));
    match fs::create_dir_all(&log_dir) {
        Ok(()) => log_dir,
        Err(_) => {
            let fallback = std::env::temp_dir().join("trackdeck-logs");
            let _ = fs::create_dir_all(&fallback);
            fallback
        }
    }
}

fn build_filter(filter: Option<String>) -> EnvFilter {
    match filter {
        Some(s) if !s.trim().is_empty() => {
            EnvFilter::try_new(&s).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

pub fn init(data_dir: &Path, cfg: LogConfig) -> LogGuard {
    let log_dir = resolve_log_dir(data_dir, cfg.dir);

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer);

    let subscriber = tracing_subscriber::registry()
        .with(build_filter(cfg.filter))
        .with(file_layer);

    let _ = subscriber.try_init();
    tracing::info!(log_dir = %log_dir.display(), "tracing 已初始化");

    LogGuard(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_dir_is_under_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolved = resolve_log_dir(dir.path(), None);
        assert_eq!(resolved, dir.path().join("logs"));
        assert!(resolved.is_dir());
    }

    #[test]
    fn explicit_log_dir_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let custom = dir.path().join("custom");
        assert_eq!(resolve_log_dir(dir.path(), Some(custom.clone())), custom);
    }

    #[test]
    fn uncreatable_dir_falls_back_to_temp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("not-a-dir");
        fs::write(&file, b"x").expect("write");
        let resolved = resolve_log_dir(dir.path(), Some(file.join("logs")));
        assert_eq!(resolved, std::env::temp_dir().join("trackdeck-logs"));
    }
}
