use super::{CoreState, UiAction};
use crate::audio_worker::AudioEvent;
use crate::core::effects::CoreEffects;
use crate::features::player;
use crate::messages::app::AppCommand;

pub fn handle_ui(cmd: &AppCommand, state: &mut CoreState, effects: &mut CoreEffects) -> UiAction {
    if matches!(cmd, AppCommand::Quit) {
        tracing::info!("收到退出命令，停止播放并释放预热句柄");
        state.session.stop(effects);
        state.preload.release_all(effects);
        return UiAction::Quit;
    }

    let mut ctx = player::control::TransportCtx {
        catalog: &state.catalog,
        session: &mut state.session,
        preload: &mut state.preload,
        effects: &mut *effects,
    };
    if !player::control::handle_transport_command(cmd, &mut ctx) {
        return UiAction::NotHandled;
    }

    effects.emit_state(&state.session, &state.preload);
    UiAction::Handled
}

pub fn handle_audio_event(evt: AudioEvent, state: &mut CoreState, effects: &mut CoreEffects) {
    if player::audio::handle_audio_event(&mut state.session, evt, effects) {
        effects.emit_state(&state.session, &state.preload);
    }
}
