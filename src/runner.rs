use std::process::{Command, Stdio};

use tracing::{debug, trace, warn};

use crate::command::CommandLine;
use crate::errors::HstatError;

/// Everything a finished transfer process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the platform reports no exit code (e.g. killed by a signal).
    pub code: Option<i32>,
}

impl ProcessOutput {
    /// Only a real, non-zero exit code other than `-1` counts as failure.
    pub fn exit_failed(&self) -> bool {
        !matches!(self.code, Some(0) | Some(-1) | None)
    }

    /// Hand back stdout, or a `SubprocessExit` carrying the captured stderr.
    pub fn into_stdout(self) -> Result<String, HstatError> {
        if self.exit_failed() {
            return Err(HstatError::SubprocessExit {
                code: self.code.unwrap_or_default(),
                stderr: self.stderr.trim_end().to_string(),
            });
        }
        Ok(self.stdout)
    }
}

/// Runs one transfer command to completion.
pub trait Runner {
    /// Only a launch failure is an `Err`; a failed exit comes back as an
    /// `Ok` output for the caller to judge.
    fn run(&self, command: &CommandLine) -> Result<ProcessOutput, HstatError>;
}

/// Runs the command string through the host shell (`sh -c` or `cmd /C`).
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl Runner for ShellRunner {
    fn run(&self, command: &CommandLine) -> Result<ProcessOutput, HstatError> {
        let (shell, flag) = command.style().shell();
        let mut cmd = Command::new(shell);
        cmd.arg(flag);
        append_command_line(&mut cmd, command.as_str());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        trace!("{}", command);

        // `output` drains both pipes before waiting, so a chatty child can't
        // block on a full pipe.
        let output = cmd.output().map_err(|source| HstatError::ProcessLaunch {
            command: command.to_string(),
            source,
        })?;

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        };

        if result.exit_failed() {
            warn!("curl error: {}", result.stderr.trim_end());
        } else if !result.stderr.trim().is_empty() {
            debug!("{}", result.stderr.trim_end());
        }

        Ok(result)
    }
}

#[cfg(windows)]
fn append_command_line(cmd: &mut Command, line: &str) {
    use std::os::windows::process::CommandExt;
    cmd.raw_arg(line);
}

#[cfg(not(windows))]
fn append_command_line(cmd: &mut Command, line: &str) {
    cmd.arg(line);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(code: Option<i32>) -> ProcessOutput {
        ProcessOutput {
            stdout: "{}".to_string(),
            stderr: "curl: (6) Could not resolve host: nope\n".to_string(),
            code,
        }
    }

    #[test]
    fn exit_code_classification() {
        assert!(!output(Some(0)).exit_failed());
        assert!(!output(Some(-1)).exit_failed());
        assert!(!output(None).exit_failed());
        assert!(output(Some(6)).exit_failed());
        assert!(output(Some(127)).exit_failed());
    }

    #[test]
    fn failed_exit_carries_stderr() {
        match output(Some(6)).into_stdout() {
            Err(HstatError::SubprocessExit { code, stderr }) => {
                assert_eq!(code, 6);
                assert_eq!(stderr, "curl: (6) Could not resolve host: nope");
            }
            other => panic!("expected SubprocessExit, got {:?}", other),
        }
        assert_eq!(output(Some(0)).into_stdout().unwrap(), "{}");
    }

    #[cfg(unix)]
    mod shell {
        use super::super::*;
        use crate::command::QuoteStyle;

        #[test]
        fn captures_stdout_stderr_and_code() {
            let cmd = CommandLine::raw("printf out; printf err >&2; exit 3", QuoteStyle::Posix);
            let out = ShellRunner.run(&cmd).unwrap();
            assert_eq!(out.stdout, "out");
            assert_eq!(out.stderr, "err");
            assert_eq!(out.code, Some(3));
            assert!(out.exit_failed());
        }

        #[test]
        fn large_output_does_not_deadlock() {
            let cmd = CommandLine::raw(
                "i=0; while [ $i -lt 20000 ]; do echo 0123456789abcdef; echo 0123456789abcdef >&2; i=$((i+1)); done",
                QuoteStyle::Posix,
            );
            let out = ShellRunner.run(&cmd).unwrap();
            assert_eq!(out.stdout.len(), 20000 * 17);
            assert_eq!(out.stderr.len(), 20000 * 17);
            assert_eq!(out.code, Some(0));
        }

        #[test]
        fn stdin_is_closed() {
            let cmd = CommandLine::raw("cat; echo done", QuoteStyle::Posix);
            let out = ShellRunner.run(&cmd).unwrap();
            assert_eq!(out.stdout, "done\n");
        }
    }
}
