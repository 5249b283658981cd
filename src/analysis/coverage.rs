//! Dynamic line coverage of a file executed on its own.
//!
//! Probing runs arbitrary repository code, so every run goes through a
//! confined [`Sandbox`]. The tracer reports on a private pipe rather than a
//! file the target could overwrite. Any failure reports as a [`ProbeFailure`]
//! and the file is treated as not fully covered.

use super::sandbox::{Sandbox, SandboxLimits, RESULT_FD};
use crate::domain::{CoverageConfig, CoverageReport, Language, SourceFile};
use crate::error::ProbeFailure;
use serde::Deserialize;
use std::ffi::OsString;
use std::time::Duration;
use tracing::debug;

const TRACER_SCRIPT: &str = include_str!("tracer.py");
const TRACER_NAME: &str = "__repo_core_tracer__.py";

/// Capability to measure which executable lines a file reaches when run.
pub trait CoverageProbe: Send + Sync {
    fn probe(&self, file: &SourceFile) -> Result<CoverageReport, ProbeFailure>;
}

#[derive(Debug, Deserialize)]
struct TraceOutput {
    executable: Vec<u32>,
    reached: Vec<u32>,
}

/// Runs python files under `sys.settrace` in a scratch sandbox.
#[derive(Debug, Clone)]
pub struct PythonTraceProbe {
    interpreter: String,
    limits: SandboxLimits,
    memory_limit_bytes: u64,
    max_processes: u64,
}

impl PythonTraceProbe {
    pub fn new(config: &CoverageConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            limits: SandboxLimits {
                timeout: Duration::from_millis(config.timeout_ms),
                launcher: config.sandbox.clone(),
            },
            memory_limit_bytes: config.memory_limit_mb.saturating_mul(1024 * 1024),
            max_processes: config.max_processes,
        }
    }

    /// CPU seconds granted to the child: the wall-clock budget rounded up.
    fn cpu_seconds(&self) -> u64 {
        let millis = self.limits.timeout.as_millis() as u64;
        millis.div_ceil(1000).max(1)
    }
}

impl CoverageProbe for PythonTraceProbe {
    fn probe(&self, file: &SourceFile) -> Result<CoverageReport, ProbeFailure> {
        if file.language != Language::Python {
            return Err(ProbeFailure::UnsupportedLanguage(file.language));
        }

        let sandbox = Sandbox::new()?;
        let tracer = sandbox.write(TRACER_NAME, TRACER_SCRIPT)?;
        let target = sandbox.write(&target_name(&file.path), &file.content)?;

        let args: Vec<OsString> = vec![
            "-I".into(),
            tracer.into_os_string(),
            target.into_os_string(),
            RESULT_FD.to_string().into(),
            self.cpu_seconds().to_string().into(),
            self.memory_limit_bytes.to_string().into(),
            self.max_processes.to_string().into(),
        ];
        let output = sandbox.run(&self.interpreter, &args, &self.limits)?;
        if !output.success() {
            return Err(ProbeFailure::Exit { code: output.code, stderr: output.stderr });
        }

        let trace = parse_result(&output.result)?;
        let report = CoverageReport {
            executable: trace.executable.into_iter().collect(),
            reached: trace.reached.into_iter().collect(),
        };
        debug!(
            path = %file.path,
            executable = report.executable.len(),
            unreached = report.unreached().len(),
            "coverage probed"
        );
        Ok(report)
    }
}

/// The tracer writes exactly one JSON line; anything else on the pipe is rejected.
fn parse_result(raw: &[u8]) -> Result<TraceOutput, ProbeFailure> {
    let text = std::str::from_utf8(raw).map_err(|e| ProbeFailure::Output(e.to_string()))?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let first = lines.next().ok_or_else(|| ProbeFailure::Output("tracer reported nothing".into()))?;
    if lines.next().is_some() {
        return Err(ProbeFailure::Output("unexpected extra data on the result pipe".into()));
    }
    serde_json::from_str(first).map_err(|e| ProbeFailure::Output(e.to_string()))
}

fn target_name(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    if name.is_empty() || name == TRACER_NAME {
        "target.py".to_string()
    } else {
        name.to_string()
    }
}
