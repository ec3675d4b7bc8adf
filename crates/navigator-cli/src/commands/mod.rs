// Handlers for CLI subcommands. main.rs parses arguments and dispatches here.

pub mod evaluate;
pub mod pool;
pub mod report;
