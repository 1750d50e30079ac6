//! 邻近曲目预热
//!
//! 只做元数据级别的预热（HTTP HEAD / 文件元数据），不下载音频内容；
//! 与播放引擎完全独立，使用自己的 HTTP 客户端。

mod messages;
mod probe;
mod worker;

pub use messages::{PreloadCommand, PreloadEvent, SourceMetadata};
pub use probe::probe_metadata;
pub use worker::spawn_preload_worker;
