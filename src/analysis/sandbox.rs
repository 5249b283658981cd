//! Child-process isolation for probing runs.
//!
//! Every run is launched through bubblewrap: the host filesystem is mounted
//! read-only with only the scratch directory writable, and the child gets
//! fresh network, pid and ipc namespaces. There is no unconfined fallback; a
//! launcher that is missing or cannot build the namespaces fails the run.
//!
//! The child also gets a cleared environment, no stdin, a private result pipe
//! on [`RESULT_FD`], and a wall-clock deadline after which its whole process
//! group is killed.

use crate::error::ProbeFailure;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const STDERR_LIMIT: usize = 2000;
const RESULT_LIMIT: u64 = 16 * 1024 * 1024;

/// Descriptor number the child sees its result pipe on.
pub const RESULT_FD: i32 = 3;

/// Default confinement launcher.
pub const DEFAULT_LAUNCHER: &str = "bwrap";

#[derive(Debug, Clone)]
pub struct SandboxLimits {
    pub timeout: Duration,
    /// Bubblewrap-compatible launcher; looked up on `PATH`.
    pub launcher: String,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(3), launcher: DEFAULT_LAUNCHER.to_string() }
    }
}

#[derive(Debug, Clone)]
pub struct SandboxOutput {
    pub code: Option<i32>,
    pub stderr: String,
    /// Everything the child wrote to [`RESULT_FD`].
    pub result: Vec<u8>,
}

impl SandboxOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Scratch directory owning everything a probed child may touch.
///
/// Removed on drop.
pub struct Sandbox {
    scratch: TempDir,
}

impl Sandbox {
    pub fn new() -> Result<Self, ProbeFailure> {
        let scratch = tempfile::Builder::new()
            .prefix("repo-core-probe-")
            .tempdir()
            .map_err(|e| ProbeFailure::Sandbox(e.to_string()))?;
        Ok(Self { scratch })
    }

    pub fn path(&self) -> &Path {
        self.scratch.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf, ProbeFailure> {
        let path = self.path().join(name);
        fs::write(&path, contents)
            .map_err(|e| ProbeFailure::Sandbox(format!("write {}: {}", name, e)))?;
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<String, ProbeFailure> {
        fs::read_to_string(self.path().join(name))
            .map_err(|e| ProbeFailure::Output(format!("read {}: {}", name, e)))
    }

    /// Launcher invocation that confines `program` to the scratch directory.
    pub fn command(&self, program: &str, args: &[OsString], limits: &SandboxLimits) -> Command {
        let scratch = self.path();
        let mut command = Command::new(&limits.launcher);
        command
            .args(["--unshare-all", "--die-with-parent"])
            .args(["--ro-bind", "/", "/"])
            .args(["--dev", "/dev", "--proc", "/proc", "--tmpfs", "/tmp"])
            .arg("--bind")
            .arg(scratch)
            .arg(scratch)
            .arg("--chdir")
            .arg(scratch)
            .arg("--")
            .arg(program)
            .args(args);
        command
            .env_clear()
            .env("HOME", scratch)
            .env("TMPDIR", scratch)
            .env("LANG", "C.UTF-8")
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .current_dir(scratch)
            .stdin(Stdio::null());
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }
        command
    }

    /// Run `program` confined to the scratch directory and wait for it.
    #[cfg(unix)]
    pub fn run(
        &self,
        program: &str,
        args: &[OsString],
        limits: &SandboxLimits,
    ) -> Result<SandboxOutput, ProbeFailure> {
        use std::os::fd::AsRawFd;
        use std::os::unix::process::CommandExt;

        let (reader, writer) =
            std::io::pipe().map_err(|e| ProbeFailure::Sandbox(format!("result pipe: {}", e)))?;
        let writer_fd = writer.as_raw_fd();

        let mut command = self.command(program, args, limits);
        command
            .stdout(self.capture_file("stdout.log")?)
            .stderr(self.capture_file("stderr.log")?)
            .process_group(0);
        // SAFETY: only async-signal-safe calls run between fork and exec.
        unsafe {
            command.pre_exec(move || expose_result_fd(writer_fd));
        }

        let child = command.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProbeFailure::Sandbox(format!(
                "confinement launcher '{}' not found; refusing to run unconfined",
                limits.launcher
            )),
            _ => ProbeFailure::Spawn { program: limits.launcher.clone(), reason: e.to_string() },
        })?;
        drop(writer);

        let collector = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.take(RESULT_LIMIT).read_to_end(&mut buf);
            buf
        });

        let waited = wait_with_deadline(child, limits.timeout);
        let result = collector.join().unwrap_or_default();
        let status = match waited {
            Ok(status) => status,
            Err(ProbeFailure::Timeout(limit)) => {
                warn!("{} timed out after {:?}", program, limit);
                return Err(ProbeFailure::Timeout(limit));
            }
            Err(other) => return Err(other),
        };

        let stderr = self.stderr_tail();
        if let Some(failure) = launcher_failure(program, status.code(), &stderr) {
            return Err(failure);
        }
        debug!(program, code = ?status.code(), "probe child exited");
        Ok(SandboxOutput { code: status.code(), stderr, result })
    }

    #[cfg(not(unix))]
    pub fn run(
        &self,
        _program: &str,
        _args: &[OsString],
        _limits: &SandboxLimits,
    ) -> Result<SandboxOutput, ProbeFailure> {
        Err(ProbeFailure::Sandbox("no confinement available on this platform".to_string()))
    }

    fn capture_file(&self, name: &str) -> Result<File, ProbeFailure> {
        File::create(self.path().join(name))
            .map_err(|e| ProbeFailure::Sandbox(format!("create {}: {}", name, e)))
    }

    fn stderr_tail(&self) -> String {
        let text = fs::read_to_string(self.path().join("stderr.log")).unwrap_or_default();
        let trimmed = text.trim();
        let skip = trimmed.chars().count().saturating_sub(STDERR_LIMIT);
        trimmed.chars().skip(skip).collect()
    }
}

/// Place the result pipe on [`RESULT_FD`] without close-on-exec. Runs in the forked child.
#[cfg(unix)]
fn expose_result_fd(fd: i32) -> std::io::Result<()> {
    // SAFETY: plain descriptor syscalls on fds owned by this process.
    let rc = unsafe {
        if fd == RESULT_FD {
            libc::fcntl(fd, libc::F_SETFD, 0)
        } else {
            libc::dup2(fd, RESULT_FD)
        }
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Wait for a child spawned as a process-group leader, killing the group at the deadline.
#[cfg(unix)]
pub(crate) fn wait_with_deadline(mut child: Child, timeout: Duration) -> Result<ExitStatus, ProbeFailure> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                kill_group(&child);
                return Ok(status);
            }
            Ok(None) if start.elapsed() > timeout => {
                kill_group(&child);
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProbeFailure::Timeout(timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                kill_group(&child);
                let _ = child.wait();
                return Err(ProbeFailure::Sandbox(format!("wait: {}", e)));
            }
        }
    }
}

/// SIGKILL every process left in the child's group, including orphans of an exited leader.
#[cfg(unix)]
fn kill_group(child: &Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: the group was created for this child by `process_group(0)`.
    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }
}

/// Errors raised by the launcher itself rather than by the confined program.
fn launcher_failure(program: &str, code: Option<i32>, stderr: &str) -> Option<ProbeFailure> {
    if code == Some(0) {
        return None;
    }
    let line = stderr.lines().rev().find(|l| l.starts_with("bwrap: "))?;
    let reason = line.trim_start_matches("bwrap: ");
    if reason.starts_with("execvp") {
        Some(ProbeFailure::Spawn { program: program.to_string(), reason: reason.to_string() })
    } else {
        Some(ProbeFailure::Sandbox(reason.to_string()))
    }
}
