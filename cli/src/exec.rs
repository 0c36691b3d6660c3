//! External process execution.
//!
//! Every interaction with the operating system goes through the [`Executor`]
//! trait so that resources can be exercised against a scripted mock in tests.
//! Commands are always argument vectors; nothing is ever passed through a
//! shell except generated scripts run via [`Executor::run_script`].
use anyhow::{Context as _, Result};
use std::io::{Read as _, Write as _};
use std::path::PathBuf;
use std::process::{ChildStderr, Command, ExitStatus, Stdio};

use crate::error::ProvisionError;
use crate::logging::AUDIT_TARGET;

/// Privilege-escalation helper prepended to elevated commands.
pub const SUDO: &str = "sudo";

/// Arguments passed to [`SUDO`] before the elevated command.
///
/// `-S` reads the password from stdin so prompts still work when stdout is
/// captured; credentials are never cached by this process.
pub const SUDO_ARGS: [&str; 2] = ["-S", "--"];

/// Interpreter used for generated scripts.
const SCRIPT_INTERPRETER: &str = "bash";

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured stdout, trimmed of surrounding whitespace.
    pub stdout: String,
    /// Captured stderr, untrimmed (empty for interactive runs).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Exit code with signals mapped to `-1`.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

impl ExecResult {
    fn from_parts(stdout: &[u8], stderr: &[u8], status: ExitStatus) -> Self {
        Self {
            stdout: String::from_utf8_lossy(stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(stderr).to_string(),
            success: status.success(),
            code: status.code(),
        }
    }
}

/// Whether a command only inspects state or may change it.
///
/// Mutating commands are audited at info level and their stderr reaches the
/// terminal as it is written (password prompts, install progress). Probes
/// are audited at debug level and their stderr is only captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Read-only query of live state.
    Probe,
    /// Command that may modify the system.
    Mutate,
}

/// Render a command line the way a user would type it.
#[must_use]
pub fn render_command(program: &str, args: &[&str]) -> String {
    shell_words::join(std::iter::once(program).chain(args.iter().copied()))
}

/// Convert a failed result into [`ProvisionError::CommandFailed`].
///
/// # Errors
///
/// Returns an error when `result.success` is `false`.
pub fn ensure_success(result: ExecResult, program: &str, args: &[&str]) -> Result<ExecResult> {
    if result.success {
        Ok(result)
    } else {
        Err(ProvisionError::CommandFailed {
            command: render_command(program, args),
            exit_code: result.exit_code(),
            stderr: result.stderr.trim().to_string(),
        }
        .into())
    }
}

/// Abstraction over running external processes.
///
/// Implementors supply the three primitives; every other entry point is
/// derived from them so that checking, elevation and script handling behave
/// identically for the real system and for test doubles.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command with stdout captured.
    ///
    /// Stderr is always captured into [`ExecResult::stderr`]; for
    /// [`Effect::Mutate`] it is also echoed to the terminal. Never fails because of a non-zero exit status.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process cannot be spawned.
    fn capture(&self, effect: Effect, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command attached to the controlling terminal.
    ///
    /// Never fails because of a non-zero exit status.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process cannot be spawned.
    fn interactive(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;

    /// Run a mutating command, aborting on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::CommandFailed`] on non-zero exit.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.capture(Effect::Mutate, program, args)?;
        ensure_success(result, program, args)
    }

    /// Run a mutating command whose exit status the caller interprets.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        self.capture(Effect::Mutate, program, args)
    }

    /// Run a read-only command, aborting on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::CommandFailed`] on non-zero exit.
    fn probe(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.capture(Effect::Probe, program, args)?;
        ensure_success(result, program, args)
    }

    /// Run a read-only command where a non-zero exit encodes "absent".
    ///
    /// # Errors
    ///
    /// Returns an error only if the process cannot be spawned.
    fn probe_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        self.capture(Effect::Probe, program, args)
    }

    /// Run a command on the terminal, returning its exit code.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::CommandFailed`] on non-zero exit when
    /// `check` is set.
    fn run_interactive(&self, program: &str, args: &[&str], check: bool) -> Result<i32> {
        let result = self.interactive(program, args)?;
        let code = result.exit_code();
        if check {
            ensure_success(result, program, args)?;
        }
        Ok(code)
    }

    /// Run a command with elevated privileges and capture its output.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::CommandFailed`] on non-zero exit when
    /// `check` is set.
    fn sudo(&self, program: &str, args: &[&str], check: bool) -> Result<ExecResult> {
        let mut full: Vec<&str> = SUDO_ARGS.to_vec();
        full.push(program);
        full.extend_from_slice(args);
        let result = self.capture(Effect::Mutate, SUDO, &full)?;
        if check {
            ensure_success(result, SUDO, &full)
        } else {
            Ok(result)
        }
    }

    /// Write `lines` to a fresh temporary script and run it on the terminal.
    ///
    /// The script file is kept on disk after the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be written, or
    /// [`ProvisionError::CommandFailed`] on non-zero exit when `check` is set.
    fn run_script(&self, lines: &[String], privileged: bool, check: bool) -> Result<i32> {
        let script = write_script(lines)?;
        let script = script.to_string_lossy().into_owned();
        if privileged {
            let mut args: Vec<&str> = SUDO_ARGS.to_vec();
            args.push(SCRIPT_INTERPRETER);
            args.push(&script);
            self.run_interactive(SUDO, &args, check)
        } else {
            self.run_interactive(SCRIPT_INTERPRETER, &[&script], check)
        }
    }
}

/// Persist `lines` into a uniquely named `.sh` file and return its path.
fn write_script(lines: &[String]) -> Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("automac-")
        .suffix(".sh")
        .tempfile()
        .context("creating temporary script")?;
    for line in lines {
        writeln!(file, "{line}").context("writing temporary script")?;
    }
    let (_, path) = file.keep().context("persisting temporary script")?;
    Ok(path)
}

/// Read a child's stderr to the end, copying each chunk to our own stderr
/// when `echo` is set.
fn drain_stderr(pipe: Option<ChildStderr>, echo: bool) -> Vec<u8> {
    let mut captured = Vec::new();
    let Some(mut pipe) = pipe else {
        return captured;
    };
    let mut buf = [0u8; 1024];
    loop {
        match pipe.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let chunk = buf.get(..n).unwrap_or_default();
                if echo {
                    let mut err = std::io::stderr().lock();
                    err.write_all(chunk).ok();
                    err.flush().ok();
                }
                captured.extend_from_slice(chunk);
            }
        }
    }
    captured
}

/// [`Executor`] backed by real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    fn audit(effect: Effect, program: &str, args: &[&str]) {
        let line = render_command(program, args);
        match effect {
            Effect::Mutate => tracing::info!(target: AUDIT_TARGET, "{line}"),
            Effect::Probe => tracing::debug!(target: AUDIT_TARGET, "{line}"),
        }
    }
}

impl Executor for SystemExecutor {
    fn capture(&self, effect: Effect, program: &str, args: &[&str]) -> Result<ExecResult> {
        Self::audit(effect, program, args);
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to execute: {program}"))?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let echo = effect == Effect::Mutate;
        let (stdout, stderr) = std::thread::scope(|s| {
            let err = s.spawn(move || drain_stderr(stderr_pipe, echo));
            let mut out = Vec::new();
            if let Some(mut pipe) = stdout_pipe {
                pipe.read_to_end(&mut out).ok();
            }
            (out, err.join().unwrap_or_default())
        });
        let status = child
            .wait()
            .with_context(|| format!("failed to wait for: {program}"))?;
        Ok(ExecResult::from_parts(&stdout, &stderr, status))
    }

    fn interactive(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        Self::audit(Effect::Mutate, program, args);
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: status.success(),
            code: status.code(),
        })
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
