//! 静态曲目目录
//!
//! 进程启动时从配置加载，之后只读。目录保证非空、ID 唯一，
//! 因此上一首/下一首（环绕）总是有定义。

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::model::{Track, TrackId};
use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tracks: Vec<Track>,
}

impl Catalog {
    pub fn new(tracks: Vec<Track>) -> Result<Self, CatalogError> {
        if tracks.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(tracks.len());
        for t in &tracks {
            if !seen.insert(t.id) {
                return Err(CatalogError::DuplicateId(t.id));
            }
        }
        Ok(Self { tracks })
    }

    /// 内置目录
    pub fn builtin() -> Self {
        Self {
            tracks: vec![
                Track::new(1, "Track 1", "/audio/habibi.mp3").with_alternates(["/audio/habibi.ogg"]),
                Track::new(2, "Track 2", "/audio/jehovah.mp3").with_alternates(["/audio/jehovah.ogg"]),
                Track::new(3, "Track 3", "/audio/khuleka.mp3").with_alternates(["/audio/khuleka.ogg"]),
                Track::new(4, "Track 4", "/audio/banike.mp3").with_alternates(["/audio/banike.ogg"]),
                Track::new(5, "Track 5", "/audio/sibaningi.mp3")
                    .with_alternates(["/audio/sibaningi.ogg"]),
            ],
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(s)?;
        Self::new(file.tracks)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// 第一首（目录非空）
    pub fn first(&self) -> &Track {
        &self.tracks[0]
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn index_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn by_id(&self, id: TrackId) -> Result<&Track, CatalogError> {
        self.index_of(id)
            .map(|i| &self.tracks[i])
            .ok_or(CatalogError::NotFound(id))
    }

    /// 环绕取相邻曲目：`(index ± 1 + len) mod len`
    pub fn neighbor(&self, id: TrackId, direction: Direction) -> Result<&Track, CatalogError> {
        let idx = self.index_of(id).ok_or(CatalogError::NotFound(id))?;
        let len = self.tracks.len();
        let next = match direction {
            Direction::Next => (idx + 1) % len,
            Direction::Previous => (idx + len - 1) % len,
        };
        Ok(&self.tracks[next])
    }

    /// 前后两个邻居（去重，不含自身）
    pub fn neighbors(&self, id: TrackId) -> Result<Vec<&Track>, CatalogError> {
        let next = self.neighbor(id, Direction::Next)?;
        let prev = self.neighbor(id, Direction::Previous)?;
        let mut out = Vec::with_capacity(2);
        for t in [next, prev] {
            if t.id != id && !out.iter().any(|o: &&Track| o.id == t.id) {
                out.push(t);
            }
        }
        Ok(out)
    }
}

pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = Catalog::from_toml_str(&text)?;
    tracing::info!(path = %path.display(), tracks = catalog.len(), "曲目目录已加载");
    Ok(catalog)
}
