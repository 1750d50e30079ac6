//! 统一错误处理模块
//!
//! 各模块的结构化错误类型。

mod app;
mod catalog;
mod media;
mod playback;

pub use app::AppError;
pub use catalog::CatalogError;
pub use media::MediaError;
pub use playback::PlaybackError;
