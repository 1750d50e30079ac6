use super::CoreState;
use crate::core::effects::CoreEffects;
use crate::preload_worker::PreloadEvent;

pub fn handle_preload_event(evt: PreloadEvent, state: &mut CoreState, effects: &mut CoreEffects) {
    if state.preload.on_event(evt) {
        effects.emit_state(&state.session, &state.preload);
    }
}
