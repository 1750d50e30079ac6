use rodio::OutputStreamBuilder;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::select;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::download::{RetryPolicy, download_to_path, is_remote};
use super::messages::{AudioCommand, AudioEvent, LoadOptions, MediaErrorInfo};
use super::player::PlayerState;
use crate::error::MediaError;
use crate::settings::EngineSettings;

/// 当前绑定的音源
struct Bound {
    generation: u64,
    uri: String,
    autoplay: bool,
    /// 远程音源下载到的临时文件，随绑定一起释放
    _temp: Option<NamedTempFile>,
}

enum FetchEvent {
    Done { generation: u64, path: PathBuf },
    Failed { generation: u64, err: MediaError },
}

struct AudioEngine {
    tx_evt: mpsc::Sender<AudioEvent>,
    rx_cmd: mpsc::Receiver<AudioCommand>,
    tx_fetch: mpsc::Sender<FetchEvent>,
    rx_fetch: mpsc::Receiver<FetchEvent>,
    http: reqwest::Client,
    policy: RetryPolicy,
    progress_interval: Duration,
    state: PlayerState,
    bound: Option<Bound>,
    fetch: Option<JoinHandle<()>>,
}

impl AudioEngine {
    fn new(
        tx_evt: mpsc::Sender<AudioEvent>,
        rx_cmd: mpsc::Receiver<AudioCommand>,
        http: reqwest::Client,
        state: PlayerState,
        settings: &EngineSettings,
    ) -> Self {
        let (tx_fetch, rx_fetch) = mpsc::channel(8);
        Self {
            tx_evt,
            rx_cmd,
            tx_fetch,
            rx_fetch,
            http,
            policy: RetryPolicy::from(settings),
            progress_interval: Duration::from_millis(settings.progress_interval_ms.max(50)),
            state,
            bound: None,
            fetch: None,
        }
    }

    async fn run(mut self) {
        let mut progress_tick = tokio::time::interval(self.progress_interval);

        loop {
            select! {
                biased;
                Some(evt) = self.rx_fetch.recv() => {
                    self.handle_fetch_event(evt).await;
                }
                maybe_cmd = self.rx_cmd.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        break;
                    };
                    self.handle_audio_command(cmd).await;
                }
                _ = progress_tick.tick(), if self.state.is_loaded() && !self.state.paused() => {
                    self.report_progress().await;
                }
            }
        }

        self.cancel_fetch();
        self.state.stop();
        tracing::info!("AudioWorker 已退出");
    }

    fn cancel_fetch(&mut self) {
        if let Some(task) = self.fetch.take() {
            task.abort();
        }
    }

    fn set_autoplay(&mut self, autoplay: bool) {
        if let Some(bound) = self.bound.as_mut() {
            bound.autoplay = autoplay;
        }
    }

    fn current_generation(&self) -> Option<u64> {
        self.bound.as_ref().map(|b| b.generation)
    }

    async fn emit(&self, evt: AudioEvent) {
        if let Err(e) = self.tx_evt.send(evt).await {
            tracing::warn!(err = %e, "AudioEvent 通道已关闭");
        }
    }

    async fn handle_audio_command(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Load {
                generation,
                uri,
                options,
            } => self.load(generation, uri, options).await,
            // 仍在下载：记下播放意图，加载完成时生效
            AudioCommand::Play if !self.state.is_loaded() => self.set_autoplay(true),
            AudioCommand::Pause if !self.state.is_loaded() => self.set_autoplay(false),
            AudioCommand::Play => {
                if let Err(e) = self.state.play() {
                    self.fail_current(e).await;
                }
            }
            AudioCommand::Pause => self.state.pause(),
            AudioCommand::SeekTo { fraction, offset } => {
                let target = match self.state.duration() {
                    Some(d) if offset.is_zero() => d.mul_f64(fraction.clamp(0.0, 1.0)),
                    _ => offset,
                };
                if let Err(e) = self.state.seek(target) {
                    tracing::warn!(fraction, err = %e, "Seek 失败");
                }
            }
            AudioCommand::SetVolume(v) => self.state.set_volume(v.clamp(0.0, 1.0)),
            AudioCommand::Stop => {
                self.cancel_fetch();
                self.state.stop();
                self.bound = None;
            }
        }
    }

    async fn load(&mut self, generation: u64, uri: String, options: LoadOptions) {
        tracing::info!(generation, uri = %uri, autoplay = options.autoplay, "加载音源");
        self.cancel_fetch();
        self.state.stop();
        self.bound = None;

        self.emit(AudioEvent::BufferStart { generation }).await;

        if !is_remote(&uri) {
            self.bound = Some(Bound {
                generation,
                uri: uri.clone(),
                autoplay: options.autoplay,
                _temp: None,
            });
            self.finish_load(generation, PathBuf::from(&uri)).await;
            return;
        }

        let suffix = options
            .preferred_format
            .as_deref()
            .map(|f| format!(".{f}"))
            .unwrap_or_default();
        let temp = match tempfile::Builder::new()
            .prefix("trackdeck-")
            .suffix(&suffix)
            .tempfile()
        {
            Ok(t) => t,
            Err(source) => {
                let err = MediaError::Write {
                    uri: uri.clone(),
                    source,
                };
                self.emit(AudioEvent::Error {
                    generation,
                    info: MediaErrorInfo::new(&uri, err.to_string()),
                })
                .await;
                return;
            }
        };
        let path = temp.path().to_path_buf();
        self.bound = Some(Bound {
            generation,
            uri: uri.clone(),
            autoplay: options.autoplay,
            _temp: Some(temp),
        });

        let http = self.http.clone();
        let policy = self.policy;
        let tx_evt = self.tx_evt.clone();
        let tx_fetch = self.tx_fetch.clone();
        self.fetch = Some(tokio::task::spawn_local(async move {
            let on_loaded = move |loaded: f64| {
                let _ = tx_evt.try_send(AudioEvent::Progress {
                    generation,
                    played: 0.0,
                    loaded,
                });
            };
            let evt = match download_to_path(&http, &path, &uri, policy, on_loaded).await {
                Ok(()) => FetchEvent::Done { generation, path },
                Err(err) => FetchEvent::Failed { generation, err },
            };
            let _ = tx_fetch.send(evt).await;
        }));
    }

    async fn handle_fetch_event(&mut self, evt: FetchEvent) {
        match evt {
            FetchEvent::Done { generation, path } => {
                self.fetch = None;
                self.finish_load(generation, path).await;
            }
            FetchEvent::Failed { generation, err } => {
                if self.current_generation() != Some(generation) {
                    return;
                }
                self.fetch = None;
                self.fail_current(err).await;
            }
        }
    }

    async fn finish_load(&mut self, generation: u64, path: PathBuf) {
        let Some(bound) = self.bound.as_ref().filter(|b| b.generation == generation) else {
            tracing::debug!(generation, "音源已被替换，忽略加载结果");
            return;
        };
        let uri = bound.uri.clone();
        let paused = !bound.autoplay;

        match self.state.load(&path, &uri, paused) {
            Ok(duration) => {
                if let Some(d) = duration {
                    self.emit(AudioEvent::Duration {
                        generation,
                        seconds: d.as_secs_f64(),
                    })
                    .await;
                }
                self.emit(AudioEvent::Ready { generation }).await;
                self.emit(AudioEvent::BufferEnd { generation }).await;
            }
            Err(e) => self.fail_current(e).await,
        }
    }

    async fn fail_current(&mut self, err: MediaError) {
        let Some(bound) = self.bound.take() else {
            return;
        };
        tracing::warn!(generation = bound.generation, uri = %bound.uri, err = %err, "音源播放失败");
        self.state.stop();
        self.emit(AudioEvent::Error {
            generation: bound.generation,
            info: MediaErrorInfo::new(&bound.uri, err.to_string()),
        })
        .await;
    }

    async fn report_progress(&mut self) {
        let Some(generation) = self.current_generation() else {
            return;
        };

        if self.state.is_finished() {
            self.state.pause();
            self.emit(AudioEvent::Progress {
                generation,
                played: 1.0,
                loaded: 1.0,
            })
            .await;
            self.emit(AudioEvent::Ended { generation }).await;
            return;
        }

        let played = match self.state.duration() {
            Some(d) if !d.is_zero() => {
                (self.state.position().as_secs_f64() / d.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        };
        self.emit(AudioEvent::Progress {
            generation,
            played,
            loaded: 1.0,
        })
        .await;
    }
}

/// 引擎不可用时，对每个加载请求回报错误，让上层走格式回退直至耗尽
async fn reject_loads(
    mut rx_cmd: mpsc::Receiver<AudioCommand>,
    tx_evt: mpsc::Sender<AudioEvent>,
    message: String,
) {
    while let Some(cmd) = rx_cmd.recv().await {
        if let AudioCommand::Load {
            generation, uri, ..
        } = cmd
        {
            let _ = tx_evt
                .send(AudioEvent::BufferStart { generation })
                .await;
            let _ = tx_evt
                .send(AudioEvent::Error {
                    generation,
                    info: MediaErrorInfo::new(uri, message.clone()),
                })
                .await;
        }
    }
}

pub(super) fn spawn(
    rx_cmd: mpsc::Receiver<AudioCommand>,
    tx_evt: mpsc::Sender<AudioEvent>,
    settings: EngineSettings,
) {
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        let local = tokio::task::LocalSet::new();
        local.block_on(&rt, async move {
            let http = match reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.http_timeout_secs))
                .connect_timeout(Duration::from_secs(settings.http_connect_timeout_secs))
                .build()
            {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(err = %e, "初始化 HTTP 客户端失败");
                    reject_loads(rx_cmd, tx_evt, format!("初始化 HTTP 客户端失败: {e}")).await;
                    return;
                }
            };

            let stream = match OutputStreamBuilder::open_default_stream() {
                Ok(v) => v,
                Err(e) => {
                    let err = MediaError::OutputStream(e.to_string());
                    tracing::error!(err = %err, "初始化音频输出失败");
                    reject_loads(rx_cmd, tx_evt, err.to_string()).await;
                    return;
                }
            };
            let mixer = stream.mixer().clone();
            let state = PlayerState::new(mixer, stream);

            tracing::info!("AudioWorker 已启动");

            let engine = AudioEngine::new(tx_evt, rx_cmd, http, state, &settings);
            engine.run().await;
        });
    });
}
