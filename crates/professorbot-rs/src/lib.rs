//! Public SDK surface for ProfessorBot.
//!
//! This crate re-exports the building blocks, wires a dialogue driver from
//! config, and provides a small initialization helper so the binary and
//! embedders set things up the same way.

mod cli;
mod launch;

/// Re-export for convenience.
pub use professorbot_rs_config as config;
pub use professorbot_rs_core as core;
/// Re-export for convenience.
pub use professorbot_rs_tui as tui;

pub use cli::Cli;
pub use launch::{build_driver, topic_listing, transcript_dir};

/// Initialize logging through `env_logger` (`RUST_LOG` controlled).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}
