use std::collections::HashMap;

use serde::Serialize;

use crate::core::effects::CoreEffects;
use crate::domain::{Catalog, TrackId};
use crate::preload_worker::{PreloadCommand, PreloadEvent, SourceMetadata};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PreloadStatus {
    Priming,
    Primed(SourceMetadata),
    Failed(String),
}

#[derive(Debug, Clone)]
struct PreloadEntry {
    generation: u64,
    uri: String,
    status: PreloadStatus,
}

/// 快照中展示的预热条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadView {
    pub track_id: TrackId,
    pub uri: String,
    #[serde(flatten)]
    pub status: PreloadStatus,
}

/// 邻近曲目的预热句柄池
///
/// 只持有当前曲目的前后两个邻居；切歌时先释放不再需要的句柄，再创建新的，
/// 因此任意时刻最多 2 个存活句柄。
pub struct PreloadManager {
    generation: u64,
    enabled: bool,
    entries: HashMap<TrackId, PreloadEntry>,
}

impl Default for PreloadManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PreloadManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            generation: 0,
            enabled,
            entries: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 当前曲目变化后重新计算预热目标
    pub fn retarget(&mut self, catalog: &Catalog, active: TrackId, effects: &mut CoreEffects) {
        if !self.enabled {
            return;
        }

        let targets = match catalog.neighbors(active) {
            Ok(targets) => targets,
            Err(e) => {
                tracing::error!(track_id = %active, err = %e, "预热目标计算失败");
                self.release_all(effects);
                return;
            }
        };

        let stale: Vec<TrackId> = self
            .entries
            .keys()
            .filter(|id| !targets.iter().any(|t| t.id == **id))
            .copied()
            .collect();
        for track_id in stale {
            self.entries.remove(&track_id);
            tracing::debug!(track_id = %track_id, "释放预热句柄");
            effects.send_preload_warn(
                PreloadCommand::Release { track_id },
                "PreloadWorker 通道已关闭：Release 发送失败",
            );
        }

        for track in targets {
            if self.entries.contains_key(&track.id) {
                continue;
            }
            self.generation = self.generation.wrapping_add(1);
            let generation = self.generation;
            self.entries.insert(
                track.id,
                PreloadEntry {
                    generation,
                    uri: track.primary_uri.clone(),
                    status: PreloadStatus::Priming,
                },
            );
            tracing::debug!(track_id = %track.id, generation, uri = %track.primary_uri, "创建预热句柄");
            effects.send_preload_warn(
                PreloadCommand::Prime {
                    track_id: track.id,
                    generation,
                    uri: track.primary_uri.clone(),
                },
                "PreloadWorker 通道已关闭：Prime 发送失败",
            );
        }
    }

    /// 处理预热结果；已释放或被替换的句柄的结果返回 false
    pub fn on_event(&mut self, evt: PreloadEvent) -> bool {
        let (track_id, generation, status) = match evt {
            PreloadEvent::Primed {
                track_id,
                generation,
                metadata,
            } => (track_id, generation, PreloadStatus::Primed(metadata)),
            PreloadEvent::Failed {
                track_id,
                generation,
                message,
            } => (track_id, generation, PreloadStatus::Failed(message)),
        };

        let Some(entry) = self.entries.get_mut(&track_id) else {
            tracing::trace!(track_id = %track_id, generation, "丢弃已释放句柄的预热结果");
            return false;
        };
        if entry.generation != generation {
            tracing::trace!(
                track_id = %track_id,
                generation,
                current = entry.generation,
                "丢弃过期的预热结果"
            );
            return false;
        }

        if let PreloadStatus::Failed(ref msg) = status {
            tracing::debug!(track_id = %track_id, err = %msg, "预热失败");
        }
        entry.status = status;
        true
    }

    pub fn release_all(&mut self, effects: &mut CoreEffects) {
        self.entries.clear();
        effects.send_preload_warn(
            PreloadCommand::ReleaseAll,
            "PreloadWorker 通道已关闭：ReleaseAll 发送失败",
        );
    }

    pub fn live_handles(&self) -> usize {
        self.entries.len()
    }

    pub fn holds(&self, track_id: TrackId) -> bool {
        self.entries.contains_key(&track_id)
    }

    /// 按曲目 id 排序的条目视图
    pub fn entries(&self) -> Vec<PreloadView> {
        let mut out: Vec<PreloadView> = self
            .entries
            .iter()
            .map(|(id, e)| PreloadView {
                track_id: *id,
                uri: e.uri.clone(),
                status: e.status.clone(),
            })
            .collect();
        out.sort_by_key(|v| v.track_id);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Track;

    fn catalog(n: i64) -> Catalog {
        Catalog::new(
            (1..=n)
                .map(|i| Track::new(i, format!("t{i}"), format!("/audio/{i}.mp3")))
                .collect(),
        )
        .expect("catalog")
    }

    fn primes(effects: &CoreEffects) -> Vec<(TrackId, u64)> {
        effects
            .preload_commands()
            .filter_map(|c| match c {
                PreloadCommand::Prime {
                    track_id,
                    generation,
                    ..
                } => Some((*track_id, *generation)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn retarget_primes_both_neighbors() {
        let cat = catalog(5);
        let mut mgr = PreloadManager::new(true);
        let mut effects = CoreEffects::default();

        mgr.retarget(&cat, TrackId(1), &mut effects);

        let ids: Vec<TrackId> = primes(&effects).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![TrackId(2), TrackId(5)]);
        assert_eq!(mgr.live_handles(), 2);
    }

    #[test]
    fn retarget_releases_before_priming() {
        let cat = catalog(5);
        let mut mgr = PreloadManager::new(true);
        mgr.retarget(&cat, TrackId(1), &mut CoreEffects::default());

        let mut effects = CoreEffects::default();
        mgr.retarget(&cat, TrackId(3), &mut effects);

        let cmds: Vec<&PreloadCommand> = effects.preload_commands().collect();
        let first_prime = cmds
            .iter()
            .position(|c| matches!(c, PreloadCommand::Prime { .. }))
            .expect("prime");
        let last_release = cmds
            .iter()
            .rposition(|c| matches!(c, PreloadCommand::Release { .. }))
            .expect("release");
        assert!(last_release < first_prime);
        assert_eq!(mgr.live_handles(), 2);
        assert!(mgr.holds(TrackId(2)));
        assert!(mgr.holds(TrackId(4)));
    }

    #[test]
    fn shared_neighbor_is_kept() {
        let cat = catalog(5);
        let mut mgr = PreloadManager::new(true);
        mgr.retarget(&cat, TrackId(1), &mut CoreEffects::default());

        // 1 的邻居是 2、5；3 的邻居是 4、2
        let mut effects = CoreEffects::default();
        mgr.retarget(&cat, TrackId(3), &mut effects);

        let primed: Vec<TrackId> = primes(&effects).into_iter().map(|(id, _)| id).collect();
        assert_eq!(primed, vec![TrackId(4)]);
        let released: Vec<&PreloadCommand> = effects
            .preload_commands()
            .filter(|c| matches!(c, PreloadCommand::Release { .. }))
            .collect();
        assert_eq!(
            released,
            vec![&PreloadCommand::Release {
                track_id: TrackId(5)
            }]
        );
    }

    #[test]
    fn single_track_catalog_has_no_handles() {
        let cat = catalog(1);
        let mut mgr = PreloadManager::new(true);
        let mut effects = CoreEffects::default();
        mgr.retarget(&cat, TrackId(1), &mut effects);
        assert_eq!(mgr.live_handles(), 0);
        assert_eq!(effects.preload_commands().count(), 0);
    }

    #[test]
    fn stale_results_are_discarded() {
        let cat = catalog(5);
        let mut mgr = PreloadManager::new(true);
        let mut effects = CoreEffects::default();
        mgr.retarget(&cat, TrackId(1), &mut effects);
        let (_, gen2) = primes(&effects)
            .into_iter()
            .find(|(id, _)| *id == TrackId(2))
            .expect("prime 2");

        // 切到 4：2 被释放
        mgr.retarget(&cat, TrackId(4), &mut CoreEffects::default());
        assert!(!mgr.on_event(PreloadEvent::Primed {
            track_id: TrackId(2),
            generation: gen2,
            metadata: SourceMetadata::default(),
        }));

        // 5 仍然持有，但旧 generation 不匹配
        assert!(!mgr.on_event(PreloadEvent::Failed {
            track_id: TrackId(5),
            generation: 999,
            message: "x".to_owned(),
        }));
    }

    #[test]
    fn current_result_updates_status() {
        let cat = catalog(3);
        let mut mgr = PreloadManager::new(true);
        let mut effects = CoreEffects::default();
        mgr.retarget(&cat, TrackId(1), &mut effects);
        let (id, generation) = primes(&effects)[0];

        let metadata = SourceMetadata {
            content_length: Some(42),
            content_type: Some("audio/mpeg".to_owned()),
        };
        assert!(mgr.on_event(PreloadEvent::Primed {
            track_id: id,
            generation,
            metadata: metadata.clone(),
        }));

        let view = mgr
            .entries()
            .into_iter()
            .find(|v| v.track_id == id)
            .expect("entry");
        assert_eq!(view.status, PreloadStatus::Primed(metadata));
    }

    #[test]
    fn disabled_manager_does_nothing() {
        let cat = catalog(5);
        let mut mgr = PreloadManager::new(false);
        let mut effects = CoreEffects::default();
        mgr.retarget(&cat, TrackId(1), &mut effects);
        assert_eq!(mgr.live_handles(), 0);
        assert!(effects.actions().is_empty());
    }

    #[test]
    fn release_all_clears_entries() {
        let cat = catalog(5);
        let mut mgr = PreloadManager::new(true);
        mgr.retarget(&cat, TrackId(1), &mut CoreEffects::default());

        let mut effects = CoreEffects::default();
        mgr.release_all(&mut effects);
        assert_eq!(mgr.live_handles(), 0);
        assert_eq!(
            effects.preload_commands().collect::<Vec<_>>(),
            vec![&PreloadCommand::ReleaseAll]
        );
    }
}
