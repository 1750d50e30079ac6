pub mod cli;
pub mod console;

pub use cli::{Cli, Command};
pub use console::run_console;
