//! 请求代际（generation）追踪
//!
//! 每次向媒体引擎发出加载请求都会分配新的 generation，
//! 同一 key 只认最新的那一个；旧 generation 的回调一律丢弃。

use std::collections::HashMap;
use std::hash::Hash;

/// 通用请求追踪器
///
/// 支持任意 key 类型。同一 key 只保留最新的 req_id。
#[derive(Debug)]
pub struct RequestTracker<K> {
    pending: HashMap<K, u64>,
}

impl<K: Eq + Hash> Default for RequestTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> RequestTracker<K> {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// 发起新请求，返回分配的 req_id
    ///
    /// 同一 key 已有的 req_id 会被覆盖，之后对旧 id 的检查都会失败。
    pub fn issue(&mut self, key: K, next_id_fn: impl FnOnce() -> u64) -> u64 {
        let id = next_id_fn();
        self.pending.insert(key, id);
        id
    }

    /// 回调是否属于 key 当前的请求（不消耗 pending 状态，
    /// 一个请求会收到多次回调）
    pub fn is_current(&self, key: &K, req_id: u64) -> bool {
        self.pending.get(key) == Some(&req_id)
    }

    /// 作废 key 的当前请求：之后的所有回调都被视为过期
    pub fn clear(&mut self, key: &K) {
        self.pending.remove(key);
    }

    pub fn get_pending(&self, key: &K) -> Option<u64> {
        self.pending.get(key).copied()
    }
}

/// 请求类型 key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKey {
    /// 媒体引擎加载（含格式回退的重试）
    MediaLoad,
}
