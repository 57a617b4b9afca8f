//! Runs toolchain subprocesses.
//!
//! Each invocation drains the child's stdout and stderr on two scoped
//! threads while the child runs; a child writing more than a pipe buffer
//! to a stream nobody reads would block forever.  Both drains finish
//! before the exit status is looked at, so captured output is complete.

use anyhow::{anyhow, bail, Context};
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

#[derive(Debug, PartialEq)]
pub enum Termination {
    Success,
    Interrupted,
    Failure,
}

/// The command as a shell-ish string, for logs and error messages.
pub fn cmdline(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(unix)]
fn describe_signal(status: &ExitStatus, err: &mut impl Write) -> std::io::Result<Termination> {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(libc::SIGINT) => {
            writeln!(err, "interrupted")?;
            Ok(Termination::Interrupted)
        }
        Some(sig) => {
            writeln!(err, "signal {}", sig)?;
            Ok(Termination::Failure)
        }
        None => Ok(Termination::Failure),
    }
}

#[cfg(not(unix))]
fn describe_signal(_status: &ExitStatus, _err: &mut impl Write) -> std::io::Result<Termination> {
    Ok(Termination::Failure)
}

/// Runs `cmd` to completion, copying its stdout into `out` and its stderr
/// into `err` as it runs.
/// Returns an Err() if we failed outside of the process itself.
pub fn run_command<O, E>(cmd: &mut Command, out: &mut O, err: &mut E) -> anyhow::Result<Termination>
where
    O: Write + Send,
    E: Write + Send,
{
    let line = cmdline(cmd);
    debug!(command = %line, "spawning");
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn {}", line))?;
    let mut child_out = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("{}: stdout not captured", line))?;
    let mut child_err = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("{}: stderr not captured", line))?;

    let err_sink = &mut *err;
    let (status, out_copied, err_copied) = std::thread::scope(|s| {
        let out_pump = s.spawn(move || std::io::copy(&mut child_out, out));
        let err_pump = s.spawn(move || std::io::copy(&mut child_err, err_sink));
        let status = child.wait();
        (status, out_pump.join(), err_pump.join())
    });
    let status = status.with_context(|| format!("wait for {}", line))?;
    for copied in [out_copied, err_copied] {
        match copied {
            Ok(result) => {
                result.with_context(|| format!("read output of {}", line))?;
            }
            Err(_) => bail!("output pump for {} panicked", line),
        }
    }

    if status.success() {
        return Ok(Termination::Success);
    }
    Ok(describe_signal(&status, err)?)
}

/// Runs `cmd` and returns its stdout.  Stderr passes through to ours.
/// A nonzero exit is an error naming the command.
pub fn capture_output(cmd: &mut Command) -> anyhow::Result<String> {
    let mut out = Vec::new();
    let mut err = std::io::stderr();
    match run_command(cmd, &mut out, &mut err)? {
        Termination::Success => {}
        _ => bail!("{} failed", cmdline(cmd)),
    }
    String::from_utf8(out).with_context(|| format!("output of {} is not utf-8", cmdline(cmd)))
}
