//! Core significance selection for source trees.
//!
//! [`select`] takes already-materialized files and a [`Config`]; a
//! [`Selector`] can also scan a directory itself via [`Selector::select_root`].

pub mod analysis;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod render;
pub mod scan;
pub mod select;
pub mod utils;

pub use domain::{Config, ReductionReport, SelectionVerdict, SourceFile};
pub use error::{ParseFailure, PolicyError, ProbeFailure, SelectError};
pub use select::{select, CoreFile, Selection, Selector};
