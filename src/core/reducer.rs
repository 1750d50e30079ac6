use crate::audio_worker::{AudioBackend, AudioEvent};
use crate::domain::Catalog;
use crate::features::player::PlaybackSession;
use crate::messages::app::{AppCommand, AppEvent};
use crate::preload_worker::PreloadEvent;
use crate::settings::AppSettings;

use tokio::sync::mpsc;

use crate::core::effects::{CoreDispatch, CoreEffects, run_effects};
use crate::core::infra::PreloadManager;

mod player;
mod preload;

enum CoreMsg {
    Ui(AppCommand),
    Audio(AudioEvent),
    Preload(PreloadEvent),
}

struct CoreState {
    catalog: Catalog,
    session: PlaybackSession,
    preload: PreloadManager,
    settings: AppSettings,
}

enum UiAction {
    Handled,
    NotHandled,
    Quit,
}

impl CoreState {
    fn new(catalog: Catalog, settings: AppSettings) -> Self {
        let preferred_format = Some(settings.player.preferred_format.clone());
        Self {
            session: PlaybackSession::new(preferred_format, settings.player.volume),
            preload: PreloadManager::new(settings.preload.enabled),
            catalog,
            settings,
        }
    }

    /// 启动：预备第一首曲目并开始预热其邻居
    fn bootstrap(&mut self, effects: &mut CoreEffects) {
        let first = self.catalog.first().clone();
        let volume = self.session.volume();
        self.session.set_volume(volume, effects);
        self.session
            .cue_initial(&first, self.settings.player.autoplay, effects);
        self.preload.retarget(&self.catalog, first.id, effects);
        effects.emit_state(&self.session, &self.preload);
    }
}

fn reduce(msg: CoreMsg, state: &mut CoreState, effects: &mut CoreEffects) -> bool {
    match msg {
        CoreMsg::Ui(cmd) => match player::handle_ui(&cmd, state, effects) {
            UiAction::Quit => return true,
            UiAction::Handled => {}
            UiAction::NotHandled => {
                tracing::debug!(command = ?cmd, "未处理的命令");
            }
        },
        CoreMsg::Audio(evt) => player::handle_audio_event(evt, state, effects),
        CoreMsg::Preload(evt) => preload::handle_preload_event(evt, state, effects),
    }

    false
}

pub fn spawn_app_actor(
    catalog: Catalog,
    settings: AppSettings,
    audio_backend: AudioBackend,
) -> (mpsc::Sender<AppCommand>, mpsc::Receiver<AppEvent>) {
    let (tx_cmd, mut rx_cmd) = mpsc::channel::<AppCommand>(64);
    let (tx_evt, rx_evt) = mpsc::channel::<AppEvent>(64);

    let (tx_audio, mut rx_audio_evt) =
        crate::audio_worker::spawn_audio_worker(audio_backend, settings.engine.clone());
    let (tx_preload, mut rx_preload_evt) =
        crate::preload_worker::spawn_preload_worker(&settings.preload, &settings.engine);

    tokio::spawn(async move {
        let mut state = CoreState::new(catalog, settings);
        let dispatch = CoreDispatch {
            tx_audio: &tx_audio,
            tx_preload: &tx_preload,
            tx_evt: &tx_evt,
        };

        tracing::info!(
            tracks = state.catalog.len(),
            backend = ?audio_backend,
            preload = state.preload.is_enabled(),
            "Core 已启动"
        );
        let mut effects = CoreEffects::default();
        state.bootstrap(&mut effects);
        run_effects(effects, &dispatch).await;

        loop {
            let msg = tokio::select! {
                maybe_cmd = rx_cmd.recv() => match maybe_cmd {
                    Some(cmd) => CoreMsg::Ui(cmd),
                    // 界面已退出
                    None => CoreMsg::Ui(AppCommand::Quit),
                },
                Some(evt) = rx_audio_evt.recv() => CoreMsg::Audio(evt),
                Some(evt) = rx_preload_evt.recv() => CoreMsg::Preload(evt),
            };

            let mut effects = CoreEffects::default();
            let should_quit = reduce(msg, &mut state, &mut effects);
            run_effects(effects, &dispatch).await;
            if should_quit {
                tracing::info!("Core 已退出");
                break;
            }
        }
    });

    (tx_cmd, rx_evt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_worker::AudioCommand;
    use crate::core::effects::CoreEffect;
    use crate::domain::TrackId;
    use crate::preload_worker::PreloadCommand;

    fn state() -> CoreState {
        CoreState::new(Catalog::builtin(), AppSettings::default())
    }

    #[test]
    fn bootstrap_cues_first_track_without_playing() {
        let mut state = state();
        let mut effects = CoreEffects::default();
        state.bootstrap(&mut effects);

        assert_eq!(
            state.session.active_track().map(|t| t.id),
            Some(state.catalog.first().id)
        );
        assert!(!state.session.is_playing());
        assert!(effects.audio_commands().any(|c| matches!(
            c,
            AudioCommand::Load { options, .. } if !options.autoplay
        )));
        assert_eq!(state.preload.live_handles(), 2);
        assert!(matches!(
            effects.actions().last(),
            Some(CoreEffect::EmitState(_))
        ));
    }

    #[test]
    fn quit_stops_engine_and_releases_preload() {
        let mut state = state();
        state.bootstrap(&mut CoreEffects::default());

        let mut effects = CoreEffects::default();
        assert!(reduce(CoreMsg::Ui(AppCommand::Quit), &mut state, &mut effects));
        assert!(effects.audio_commands().any(|c| *c == AudioCommand::Stop));
        assert!(
            effects
                .preload_commands()
                .any(|c| *c == PreloadCommand::ReleaseAll)
        );
        assert_eq!(state.preload.live_handles(), 0);
    }

    #[test]
    fn commands_emit_state() {
        let mut state = state();
        state.bootstrap(&mut CoreEffects::default());

        let mut effects = CoreEffects::default();
        assert!(!reduce(
            CoreMsg::Ui(AppCommand::SelectTrack { id: TrackId(3) }),
            &mut state,
            &mut effects
        ));
        assert!(
            effects
                .actions()
                .iter()
                .any(|a| matches!(a, CoreEffect::EmitState(s) if s.active_track.as_ref().map(|t| t.id) == Some(TrackId(3))))
        );
    }
}
