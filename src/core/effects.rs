use crate::app::AppSnapshot;
use crate::audio_worker::AudioCommand;
use crate::core::infra::PreloadManager;
use crate::error::PlaybackError;
use crate::features::player::PlaybackSession;
use crate::messages::app::AppEvent;
use crate::preload_worker::PreloadCommand;
use tokio::sync::mpsc;

#[derive(Default)]
pub struct CoreEffects {
    pub(super) actions: Vec<CoreEffect>,
}

#[derive(Debug)]
pub enum CoreEffect {
    EmitState(Box<AppSnapshot>),
    EmitToast(String),
    EmitError(PlaybackError),
    SendAudio {
        cmd: AudioCommand,
        warn: Option<&'static str>,
    },
    SendPreload {
        cmd: PreloadCommand,
        warn: Option<&'static str>,
    },
}

impl CoreEffects {
    pub fn actions(&self) -> &[CoreEffect] {
        &self.actions
    }

    /// 本轮发往媒体引擎的命令
    pub fn audio_commands(&self) -> impl Iterator<Item = &AudioCommand> {
        self.actions.iter().filter_map(|a| match a {
            CoreEffect::SendAudio { cmd, .. } => Some(cmd),
            _ => None,
        })
    }

    /// 本轮发往预热 worker 的命令
    pub fn preload_commands(&self) -> impl Iterator<Item = &PreloadCommand> {
        self.actions.iter().filter_map(|a| match a {
            CoreEffect::SendPreload { cmd, .. } => Some(cmd),
            _ => None,
        })
    }

    pub fn emit_state(&mut self, session: &PlaybackSession, preload: &PreloadManager) {
        self.actions.push(CoreEffect::EmitState(Box::new(
            AppSnapshot::from_parts(session, preload),
        )));
    }

    pub fn send_audio(&mut self, cmd: AudioCommand) {
        self.actions.push(CoreEffect::SendAudio { cmd, warn: None });
    }

    pub fn send_audio_warn(&mut self, cmd: AudioCommand, warn: &'static str) {
        self.actions.push(CoreEffect::SendAudio {
            cmd,
            warn: Some(warn),
        });
    }

    pub fn send_preload_warn(&mut self, cmd: PreloadCommand, warn: &'static str) {
        self.actions.push(CoreEffect::SendPreload {
            cmd,
            warn: Some(warn),
        });
    }

    pub fn toast(&mut self, message: impl Into<String>) {
        self.actions.push(CoreEffect::EmitToast(message.into()));
    }

    pub fn error(&mut self, err: PlaybackError) {
        self.actions.push(CoreEffect::EmitError(err));
    }
}

pub struct CoreDispatch<'a> {
    pub(super) tx_audio: &'a mpsc::Sender<AudioCommand>,
    pub(super) tx_preload: &'a mpsc::Sender<PreloadCommand>,
    pub(super) tx_evt: &'a mpsc::Sender<AppEvent>,
}

pub async fn run_effects(effects: CoreEffects, dispatch: &CoreDispatch<'_>) {
    for effect in effects.actions {
        match effect {
            CoreEffect::EmitState(snapshot) => {
                let _ = dispatch.tx_evt.send(AppEvent::State(snapshot)).await;
            }
            CoreEffect::EmitToast(msg) => {
                let _ = dispatch.tx_evt.send(AppEvent::Toast(msg)).await;
            }
            CoreEffect::EmitError(err) => {
                let _ = dispatch.tx_evt.send(AppEvent::Error(err)).await;
            }
            CoreEffect::SendAudio { cmd, warn } => {
                if let Err(e) = dispatch.tx_audio.send(cmd).await
                    && let Some(ctx) = warn
                {
                    tracing::warn!(err = %e, "{ctx}");
                }
            }
            CoreEffect::SendPreload { cmd, warn } => {
                if let Err(e) = dispatch.tx_preload.send(cmd).await
                    && let Some(ctx) = warn
                {
                    tracing::warn!(err = %e, "{ctx}");
                }
            }
        }
    }
}
