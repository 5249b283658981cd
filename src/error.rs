//! Error types for the selector
//!
//! Only [`SelectError`] aborts a run. [`ParseFailure`] and [`ProbeFailure`]
//! describe per-file problems that degrade a signal and are recorded as soft
//! failures.

use crate::domain::Language;
use std::time::Duration;
use thiserror::Error;

/// Run-level failures of [`crate::select`].
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("Corpus is empty: no lines to select from")]
    EmptyCorpus,

    #[error("Invalid selection policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A source file could not be scored for complexity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(Language),

    #[error("grammar for '{0}' could not be loaded")]
    Grammar(Language),

    #[error("parser produced no tree")]
    NoTree,

    #[error("syntax error at line {line}")]
    Syntax { line: usize },
}

/// Coverage could not be determined for a file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("coverage probing is not supported for '{0}'")]
    UnsupportedLanguage(Language),

    #[error("sandbox setup failed: {0}")]
    Sandbox(String),

    #[error("failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("exited with status {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("malformed probe output: {0}")]
    Output(String),
}

/// A combine rule that cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("unexpected token '{token}' at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unknown signal '{0}' (expected complexity, coverage or fanout)")]
    UnknownSignal(String),

    #[error("signal '{0}' is referenced but not enabled")]
    SignalDisabled(&'static str),

    #[error("rule must reference the complexity signal")]
    MissingComplexity,

    #[error("rule nests deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },

    #[error("rule is longer than {limit} tokens")]
    TooLong { limit: usize },
}
