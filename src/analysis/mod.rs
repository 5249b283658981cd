//! Per-file significance signals: structural complexity, dynamic coverage and
//! static dependency fan-out.

pub mod complexity;
pub mod coverage;
pub mod dependency;
pub mod grammar;
pub mod sandbox;

pub use complexity::{ComplexityAnalyzer, ComplexityScore, TreeSitterUnitParser, UnitParser};
pub use coverage::{CoverageProbe, PythonTraceProbe};
pub use dependency::{FanoutAnalyzer, Resolution, TreeIndex};
pub use sandbox::{Sandbox, SandboxLimits, SandboxOutput};
