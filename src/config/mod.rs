//! Configuration loading and merging
//!
//! Precedence, lowest first: defaults, config file, `REPO_CORE_*` environment,
//! command-line flags.

pub mod loader;
pub mod merge;

pub use loader::{load_config, ENV_PREFIX};
pub use merge::{merge_cli_with_config, CliOverrides};
