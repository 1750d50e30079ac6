use crate::audio_worker::AudioEvent;
use crate::core::effects::CoreEffects;
use crate::features::player::PlaybackSession;

/// 处理音频事件
///
/// 只接受当前 generation 的事件；被替换的曲目或被替换的回退尝试的回调一律丢弃。
/// 返回 false 表示事件已过期。
pub fn handle_audio_event(
    session: &mut PlaybackSession,
    evt: AudioEvent,
    effects: &mut CoreEffects,
) -> bool {
    let generation = evt.generation();
    if !session.accepts(generation) {
        tracing::trace!(generation, current = ?session.generation(), "丢弃过期的音频事件");
        return false;
    }

    match evt {
        AudioEvent::Progress { played, loaded, .. } => session.on_progress(played, loaded),
        AudioEvent::Duration { seconds, .. } => session.on_duration_known(seconds),
        AudioEvent::BufferStart { .. } => session.on_buffer_start(),
        AudioEvent::BufferEnd { .. } => session.on_buffer_end(),
        AudioEvent::Ready { .. } => session.on_ready(),
        AudioEvent::Ended { .. } => {
            tracing::info!(
                track_id = ?session.active_track().map(|t| t.id),
                "曲目播放结束"
            );
            session.on_ended();
        }
        AudioEvent::Error { info, .. } => {
            if let Some(err) = session.on_error(info, effects) {
                effects.error(err);
            }
        }
    }
    true
}
