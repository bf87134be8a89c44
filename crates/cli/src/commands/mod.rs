pub mod chains;
pub mod collect;
pub mod utils;

pub use chains::handle_chains_command;
pub use collect::{handle_collect_command, CollectOptions};
