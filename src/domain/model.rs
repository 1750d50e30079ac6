use serde::{Deserialize, Serialize};
use std::fmt;

/// 曲目 ID（目录内唯一）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub i64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TrackId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub primary_uri: String,
    /// 备用编码（按优先级排列，可为空）
    #[serde(default)]
    pub alternate_uris: Vec<String>,
}

impl Track {
    pub fn new(id: i64, title: impl Into<String>, primary_uri: impl Into<String>) -> Self {
        Self {
            id: TrackId(id),
            title: title.into(),
            primary_uri: primary_uri.into(),
            alternate_uris: Vec::new(),
        }
    }

    pub fn with_alternates<I, S>(mut self, uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternate_uris = uris.into_iter().map(Into::into).collect();
        self
    }

    /// 该曲目所有可用音源：主音源在前，其后为备用音源（去重，保持顺序）
    pub fn candidate_sources(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(1 + self.alternate_uris.len());
        for uri in std::iter::once(&self.primary_uri).chain(self.alternate_uris.iter()) {
            if !out.contains(&uri.as_str()) {
                out.push(uri.as_str());
            }
        }
        out
    }

    pub fn has_source(&self, uri: &str) -> bool {
        self.primary_uri == uri || self.alternate_uris.iter().any(|u| u == uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_sources_put_primary_first() {
        let t = Track::new(1, "a", "/a.mp3").with_alternates(["/a.ogg", "/a.wav"]);
        assert_eq!(t.candidate_sources(), vec!["/a.mp3", "/a.ogg", "/a.wav"]);
    }

    #[test]
    fn candidate_sources_drop_duplicates() {
        let t = Track::new(1, "a", "/a.mp3").with_alternates(["/a.mp3", "/a.ogg", "/a.ogg"]);
        assert_eq!(t.candidate_sources(), vec!["/a.mp3", "/a.ogg"]);
    }

    #[test]
    fn has_source_checks_primary_and_alternates() {
        let t = Track::new(1, "a", "/a.mp3").with_alternates(["/a.ogg"]);
        assert!(t.has_source("/a.mp3"));
        assert!(t.has_source("/a.ogg"));
        assert!(!t.has_source("/b.mp3"));
    }
}
