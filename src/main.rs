//! repo-core: select the structurally significant core of a source tree
//!
//! Scores every file for complexity (and optionally dynamic coverage and
//! dependency fan-out), keeps the files the selection policy marks as core,
//! and reports how much of the code was discarded.

use anyhow::Result;

fn main() -> Result<()> {
    repo_core::cli::run()
}
