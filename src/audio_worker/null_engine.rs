use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc;

use super::messages::{AudioCommand, AudioEvent, LoadOptions, MediaErrorInfo};
use crate::settings::EngineSettings;

/// 模拟播放进度
struct SimTrack {
    generation: u64,
    duration_secs: f64,
    position_secs: f64,
    playing: bool,
    /// 播放第一拍即报错
    fails_midway: bool,
    uri: String,
}

struct NullEngine {
    tx_evt: mpsc::Sender<AudioEvent>,
    rx_cmd: mpsc::Receiver<AudioCommand>,
    settings: EngineSettings,
    current: Option<SimTrack>,
}

impl NullEngine {
    fn new(
        tx_evt: mpsc::Sender<AudioEvent>,
        rx_cmd: mpsc::Receiver<AudioCommand>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            tx_evt,
            rx_cmd,
            settings,
            current: None,
        }
    }

    fn is_playing(&self) -> bool {
        self.current.as_ref().is_some_and(|t| t.playing)
    }

    async fn run(mut self) {
        let interval = Duration::from_millis(self.settings.progress_interval_ms.max(50));
        let mut tick = tokio::time::interval(interval);

        loop {
            select! {
                maybe_cmd = self.rx_cmd.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        break;
                    };
                    self.handle_audio_command(cmd).await;
                }
                _ = tick.tick(), if self.is_playing() => {
                    self.advance(interval.as_secs_f64()).await;
                }
            }
        }
    }

    async fn handle_audio_command(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Load {
                generation,
                uri,
                options,
            } => self.load(generation, uri, options).await,
            AudioCommand::Play => {
                if let Some(t) = self.current.as_mut() {
                    if t.position_secs >= t.duration_secs {
                        t.position_secs = 0.0;
                    }
                    t.playing = true;
                }
            }
            AudioCommand::Pause => {
                if let Some(t) = self.current.as_mut() {
                    t.playing = false;
                }
            }
            AudioCommand::SeekTo { fraction, .. } => {
                if let Some(t) = self.current.as_mut() {
                    t.position_secs = fraction.clamp(0.0, 1.0) * t.duration_secs;
                }
            }
            AudioCommand::SetVolume(_) => {}
            AudioCommand::Stop => {
                self.current = None;
            }
        }
    }

    async fn load(&mut self, generation: u64, uri: String, options: LoadOptions) {
        self.current = None;
        let _ = self.tx_evt.send(AudioEvent::BufferStart { generation }).await;

        if self.settings.simulated_failures.iter().any(|u| *u == uri) {
            tracing::debug!(generation, uri = %uri, "模拟音源加载失败");
            let _ = self
                .tx_evt
                .send(AudioEvent::Error {
                    generation,
                    info: MediaErrorInfo::new(uri, "模拟加载失败"),
                })
                .await;
            return;
        }

        let duration_secs = self.settings.simulated_duration_secs.max(1.0);
        let _ = self
            .tx_evt
            .send(AudioEvent::Duration {
                generation,
                seconds: duration_secs,
            })
            .await;
        let _ = self.tx_evt.send(AudioEvent::Ready { generation }).await;
        let _ = self.tx_evt.send(AudioEvent::BufferEnd { generation }).await;

        let fails_midway = self
            .settings
            .simulated_playback_failures
            .iter()
            .any(|u| *u == uri);
        self.current = Some(SimTrack {
            generation,
            duration_secs,
            position_secs: 0.0,
            playing: options.autoplay,
            fails_midway,
            uri,
        });
    }

    async fn advance(&mut self, step_secs: f64) {
        let Some(t) = self.current.as_mut() else {
            return;
        };
        if t.fails_midway {
            let generation = t.generation;
            let uri = std::mem::take(&mut t.uri);
            self.current = None;
            tracing::debug!(generation, uri = %uri, "模拟播放中途失败");
            let _ = self
                .tx_evt
                .send(AudioEvent::Error {
                    generation,
                    info: MediaErrorInfo::new(uri, "模拟播放中断"),
                })
                .await;
            return;
        }
        t.position_secs = (t.position_secs + step_secs).min(t.duration_secs);
        let generation = t.generation;
        let played = t.position_secs / t.duration_secs;
        let finished = t.position_secs >= t.duration_secs;
        if finished {
            t.playing = false;
        }

        let _ = self
            .tx_evt
            .send(AudioEvent::Progress {
                generation,
                played,
                loaded: 1.0,
            })
            .await;
        if finished {
            let _ = self.tx_evt.send(AudioEvent::Ended { generation }).await;
        }
    }
}

pub(super) fn spawn(
    rx_cmd: mpsc::Receiver<AudioCommand>,
    tx_evt: mpsc::Sender<AudioEvent>,
    settings: EngineSettings,
) {
    tokio::spawn(async move {
        let engine = NullEngine::new(tx_evt, rx_cmd, settings);
        engine.run().await;
    });
}

#[cfg(test)]
mod tests {
    use super::super::{AudioBackend, spawn_audio_worker};
    use super::*;

    fn load(generation: u64, uri: &str) -> AudioCommand {
        AudioCommand::Load {
            generation,
            uri: uri.to_owned(),
            options: LoadOptions {
                preferred_format: None,
                autoplay: false,
            },
        }
    }

    #[tokio::test]
    async fn load_reports_duration_then_ready() {
        let settings = EngineSettings {
            simulated_duration_secs: 120.0,
            ..EngineSettings::default()
        };
        let (tx, mut rx) = spawn_audio_worker(AudioBackend::Null, settings);
        tx.send(load(7, "/a.mp3")).await.expect("send");

        assert_eq!(rx.recv().await, Some(AudioEvent::BufferStart { generation: 7 }));
        assert_eq!(
            rx.recv().await,
            Some(AudioEvent::Duration {
                generation: 7,
                seconds: 120.0
            })
        );
        assert_eq!(rx.recv().await, Some(AudioEvent::Ready { generation: 7 }));
        assert_eq!(rx.recv().await, Some(AudioEvent::BufferEnd { generation: 7 }));
    }

    #[tokio::test]
    async fn simulated_failure_reports_error() {
        let settings = EngineSettings {
            simulated_failures: vec!["/bad.mp3".to_owned()],
            ..EngineSettings::default()
        };
        let (tx, mut rx) = spawn_audio_worker(AudioBackend::Null, settings);
        tx.send(load(3, "/bad.mp3")).await.expect("send");

        assert_eq!(rx.recv().await, Some(AudioEvent::BufferStart { generation: 3 }));
        match rx.recv().await {
            Some(AudioEvent::Error { generation, info }) => {
                assert_eq!(generation, 3);
                assert_eq!(info.uri, "/bad.mp3");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn playback_failure_fires_after_ready() {
        let settings = EngineSettings {
            simulated_playback_failures: vec!["/flaky.ogg".to_owned()],
            progress_interval_ms: 50,
            ..EngineSettings::default()
        };
        let (tx, mut rx) = spawn_audio_worker(AudioBackend::Null, settings);
        tx.send(AudioCommand::Load {
            generation: 9,
            uri: "/flaky.ogg".to_owned(),
            options: LoadOptions {
                preferred_format: None,
                autoplay: true,
            },
        })
        .await
        .expect("send");

        assert_eq!(rx.recv().await, Some(AudioEvent::BufferStart { generation: 9 }));
        assert!(matches!(rx.recv().await, Some(AudioEvent::Duration { generation: 9, .. })));
        assert_eq!(rx.recv().await, Some(AudioEvent::Ready { generation: 9 }));
        assert_eq!(rx.recv().await, Some(AudioEvent::BufferEnd { generation: 9 }));
        match rx.recv().await {
            Some(AudioEvent::Error { generation, info }) => {
                assert_eq!(generation, 9);
                assert_eq!(info.uri, "/flaky.ogg");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
