use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::MediaError;
use crate::settings::EngineSettings;

#[derive(Debug, Clone, Copy)]
pub(super) struct RetryPolicy {
    pub retries: u32,
    pub backoff_ms: u64,
    pub backoff_max_ms: u64,
}

impl From<&EngineSettings> for RetryPolicy {
    fn from(s: &EngineSettings) -> Self {
        Self {
            retries: s.download_retries,
            backoff_ms: s.download_retry_backoff_ms,
            backoff_max_ms: s.download_retry_backoff_max_ms,
        }
    }
}

pub(super) fn is_remote(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// 下载远程音源到本地文件，`on_loaded` 回报已加载比例（0..=1）
pub(super) async fn download_to_path(
    http: &reqwest::Client,
    out_path: &Path,
    uri: &str,
    policy: RetryPolicy,
    mut on_loaded: impl FnMut(f64),
) -> Result<(), MediaError> {
    let mut attempt = 0u32;
    loop {
        match download_once(http, out_path, uri, &mut on_loaded).await {
            Ok(()) => {
                on_loaded(1.0);
                return Ok(());
            }
            Err(e) if attempt < policy.retries && e.is_retryable() => {
                tracing::debug!(uri, attempt, err = %e, "下载失败，准备重试");
                sleep_backoff(attempt, policy.backoff_ms, policy.backoff_max_ms).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn download_once(
    http: &reqwest::Client,
    out_path: &Path,
    uri: &str,
    on_loaded: &mut impl FnMut(f64),
) -> Result<(), MediaError> {
    // 每次尝试都从空文件开始
    let _ = tokio::fs::remove_file(out_path).await;

    let resp = http.get(uri).send().await.map_err(|source| MediaError::Http {
        uri: uri.to_owned(),
        source,
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(MediaError::Status {
            uri: uri.to_owned(),
            status,
        });
    }

    let total = resp.content_length().filter(|n| *n > 0);
    let mut file = tokio::fs::File::create(out_path)
        .await
        .map_err(|source| MediaError::Write {
            uri: uri.to_owned(),
            source,
        })?;

    let mut received = 0u64;
    let mut last_reported = 0.0f64;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|source| MediaError::Http {
            uri: uri.to_owned(),
            source,
        })?;
        file.write_all(&bytes)
            .await
            .map_err(|source| MediaError::Write {
                uri: uri.to_owned(),
                source,
            })?;
        received = received.saturating_add(bytes.len() as u64);

        if let Some(total) = total {
            let loaded = (received as f64 / total as f64).clamp(0.0, 1.0);
            // 每增加 1% 上报一次
            if loaded - last_reported >= 0.01 {
                last_reported = loaded;
                on_loaded(loaded);
            }
        }
    }

    file.flush().await.map_err(|source| MediaError::Write {
        uri: uri.to_owned(),
        source,
    })?;
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

async fn sleep_backoff(attempt: u32, base_ms: u64, max_ms: u64) {
    let exp = base_ms.saturating_mul(2u64.saturating_pow(attempt.min(6)));
    let mut ms = exp.min(max_ms);

    // 0..=250ms 抖动
    let jitter = now_ms() % 251;
    ms = ms.saturating_add(jitter).min(max_ms);

    tokio::time::sleep(Duration::from_millis(ms)).await;
}
