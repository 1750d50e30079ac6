pub mod catalog;
pub mod model;

pub use catalog::{Catalog, Direction, load_catalog};
pub use model::{Track, TrackId};
