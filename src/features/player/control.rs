use crate::core::effects::CoreEffects;
use crate::core::infra::PreloadManager;
use crate::domain::{Catalog, Direction, TrackId};
use crate::error::PlaybackError;
use crate::features::player::PlaybackSession;
use crate::messages::app::AppCommand;

pub struct TransportCtx<'a> {
    pub catalog: &'a Catalog,
    pub session: &'a mut PlaybackSession,
    pub preload: &'a mut PreloadManager,
    pub effects: &'a mut CoreEffects,
}

/// 处理播放控制相关的 AppCommand
/// 返回 true 表示命令已处理，false 表示未处理
pub fn handle_transport_command(cmd: &AppCommand, ctx: &mut TransportCtx<'_>) -> bool {
    tracing::debug!(
        command = ?cmd,
        playing = ctx.session.is_playing(),
        track_id = ?ctx.session.active_track().map(|t| t.id),
        "🎵 [Transport] 接收播放控制命令"
    );

    match cmd {
        AppCommand::SelectTrack { id } => select(ctx, *id),
        AppCommand::PlayPause => play_pause(ctx),
        AppCommand::Next => step(ctx, Direction::Next),
        AppCommand::Prev => step(ctx, Direction::Previous),
        AppCommand::Seek { fraction } => {
            ctx.session.seek(*fraction, ctx.effects);
        }
        AppCommand::SetVolume { volume } => {
            ctx.session.set_volume(*volume, ctx.effects);
        }
        AppCommand::Retry => retry(ctx),
        AppCommand::Quit => return false,
    }
    true
}

/// 点选曲目：随时可以打断当前加载或回退
pub fn select(ctx: &mut TransportCtx<'_>, id: TrackId) {
    let catalog = ctx.catalog;
    let track = match catalog.by_id(id) {
        Ok(t) => t,
        Err(e) => {
            let err = PlaybackError::CatalogLookupFailure(id);
            tracing::error!(track_id = %id, err = %e, "{err}");
            ctx.effects.toast(err.to_string());
            return;
        }
    };
    ctx.session.select_track(track, ctx.effects);
    ctx.preload.retarget(catalog, track.id, ctx.effects);
}

/// 上一首/下一首（环绕）；会清除当前错误
pub fn step(ctx: &mut TransportCtx<'_>, direction: Direction) {
    let catalog = ctx.catalog;
    let target = match ctx.session.active_track() {
        Some(current) => match catalog.neighbor(current.id, direction) {
            Ok(t) => t,
            Err(e) => {
                let err = PlaybackError::CatalogLookupFailure(current.id);
                tracing::error!(track_id = %current.id, err = %e, "{err}");
                catalog.first()
            }
        },
        None => catalog.first(),
    };
    let id = target.id;
    select(ctx, id);
}

pub fn play_pause(ctx: &mut TransportCtx<'_>) {
    if let Err(err) = ctx.session.toggle_play_pause(ctx.effects) {
        ctx.effects.toast(err.to_string());
    }
}

/// 重新选择当前曲目：清除错误，从主音源重新开始
pub fn retry(ctx: &mut TransportCtx<'_>) {
    let id = ctx
        .session
        .active_track()
        .map_or_else(|| ctx.catalog.first().id, |t| t.id);
    tracing::info!(track_id = %id, "重试当前曲目");
    select(ctx, id);
}
