mod reducer;

pub mod effects;
pub mod infra;
pub mod utils;

pub use effects::{CoreDispatch, CoreEffect, CoreEffects};
pub use reducer::spawn_app_actor;
