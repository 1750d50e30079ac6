use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::{PreloadCommand, PreloadEvent};
use super::probe::probe_metadata;
use crate::domain::TrackId;
use crate::settings::{EngineSettings, PreloadSettings};

struct PreloadWorker {
    rx_cmd: mpsc::Receiver<PreloadCommand>,
    tx_evt: mpsc::Sender<PreloadEvent>,
    http: reqwest::Client,
    timeout: Duration,
    handles: HashMap<TrackId, JoinHandle<()>>,
}

impl PreloadWorker {
    async fn run(mut self) {
        while let Some(cmd) = self.rx_cmd.recv().await {
            match cmd {
                PreloadCommand::Prime {
                    track_id,
                    generation,
                    uri,
                } => self.prime(track_id, generation, uri),
                PreloadCommand::Release { track_id } => self.release(track_id),
                PreloadCommand::ReleaseAll => self.release_all(),
            }
        }
        tracing::debug!("PreloadWorker 通道关闭，退出");
    }

    fn prime(&mut self, track_id: TrackId, generation: u64, uri: String) {
        self.release(track_id);

        let http = self.http.clone();
        let timeout = self.timeout;
        let tx_evt = self.tx_evt.clone();
        tracing::debug!(%track_id, generation, uri = %uri, "开始预热");
        let handle = tokio::spawn(async move {
            let evt = match tokio::time::timeout(timeout, probe_metadata(&http, &uri)).await {
                Ok(Ok(metadata)) => PreloadEvent::Primed {
                    track_id,
                    generation,
                    metadata,
                },
                Ok(Err(e)) => PreloadEvent::Failed {
                    track_id,
                    generation,
                    message: e.to_string(),
                },
                Err(_) => PreloadEvent::Failed {
                    track_id,
                    generation,
                    message: format!("预热超时({}s)", timeout.as_secs()),
                },
            };
            let _ = tx_evt.send(evt).await;
        });
        self.handles.insert(track_id, handle);
    }

    fn release(&mut self, track_id: TrackId) {
        if let Some(h) = self.handles.remove(&track_id) {
            h.abort();
            tracing::debug!(%track_id, "预热句柄已释放");
        }
    }

    fn release_all(&mut self) {
        for (_, h) in self.handles.drain() {
            h.abort();
        }
    }
}

impl Drop for PreloadWorker {
    fn drop(&mut self) {
        self.release_all();
    }
}

pub fn spawn_preload_worker(
    preload: &PreloadSettings,
    engine: &EngineSettings,
) -> (mpsc::Sender<PreloadCommand>, mpsc::Receiver<PreloadEvent>) {
    let (tx_cmd, rx_cmd) = mpsc::channel::<PreloadCommand>(16);
    let (tx_evt, rx_evt) = mpsc::channel::<PreloadEvent>(16);

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(engine.http_connect_timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(err = %e, "预热 HTTP 客户端初始化失败，使用默认配置");
            reqwest::Client::new()
        });

    let worker = PreloadWorker {
        rx_cmd,
        tx_evt,
        http,
        timeout: Duration::from_secs(preload.timeout_secs.max(1)),
        handles: HashMap::new(),
    };
    tokio::spawn(worker.run());

    (tx_cmd, rx_evt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn() -> (mpsc::Sender<PreloadCommand>, mpsc::Receiver<PreloadEvent>) {
        spawn_preload_worker(&PreloadSettings::default(), &EngineSettings::default())
    }

    #[tokio::test]
    async fn primes_local_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = dir.path().join("n.mp3");
        std::fs::write(&p, b"abcd").expect("write");

        let (tx, mut rx) = spawn();
        tx.send(PreloadCommand::Prime {
            track_id: TrackId(2),
            generation: 5,
            uri: p.to_string_lossy().into_owned(),
        })
        .await
        .expect("send");

        match rx.recv().await {
            Some(PreloadEvent::Primed {
                track_id,
                generation,
                metadata,
            }) => {
                assert_eq!(track_id, TrackId(2));
                assert_eq!(generation, 5);
                assert_eq!(metadata.content_length, Some(4));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_reports_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (tx, mut rx) = spawn();
        tx.send(PreloadCommand::Prime {
            track_id: TrackId(3),
            generation: 1,
            uri: dir.path().join("nope.ogg").to_string_lossy().into_owned(),
        })
        .await
        .expect("send");

        assert!(matches!(
            rx.recv().await,
            Some(PreloadEvent::Failed {
                track_id: TrackId(3),
                generation: 1,
                ..
            })
        ));
    }
}
