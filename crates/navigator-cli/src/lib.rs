//! Strategic Navigator CLI library.
//!
//! Output formatting shared by the `report` and `evaluate` subcommands.

pub mod output;
