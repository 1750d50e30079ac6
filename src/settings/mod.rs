pub mod store;

pub use store::{
    AppSettings, EngineSettings, PlayerSettings, PreloadSettings, load_settings, settings_path,
};
