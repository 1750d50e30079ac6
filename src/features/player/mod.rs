pub mod audio;
pub mod control;
pub mod recovery;
pub mod session;

pub use recovery::{RecoveryChain, RecoveryDecision};
pub use session::{PlaybackPhase, PlaybackSession};
