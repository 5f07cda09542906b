//! External command execution.
//!
//! `exec(program, args)` runs a program to completion and reports its exit
//! code and captured output. A program that cannot be spawned is reported
//! as a failed run, not an error, so callers only ever check the code.

use std::future::Future;
use std::process::Stdio;

/// Exit code reported when the program never ran or died from a signal.
pub const TRANSPORT_FAILURE: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    fn transport_failure(error: &std::io::Error) -> Self {
        Self {
            code: TRANSPORT_FAILURE,
            stdout: String::new(),
            stderr: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecError {
    #[error("{program} {command} exited with code {code}: {stderr}")]
    Failed {
        program: String,
        command: String,
        code: i32,
        stderr: String,
    },
}

impl ExecError {
    /// Turn a finished run into `Ok` or [`ExecError::Failed`].
    pub fn check(program: &str, args: &[String], output: ExecOutput) -> Result<ExecOutput, Self> {
        if output.success() {
            return Ok(output);
        }
        Err(Self::Failed {
            program: program.to_string(),
            command: args.first().cloned().unwrap_or_default(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Something that can run external programs.
pub trait CommandRunner: Send + Sync + 'static {
    fn exec(&self, program: &str, args: &[String]) -> impl Future<Output = ExecOutput> + Send;
}

/// Runs programs as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn exec(&self, program: &str, args: &[String]) -> ExecOutput {
        use tokio::process::Command;

        let result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) => ExecOutput {
                code: output.status.code().unwrap_or(TRANSPORT_FAILURE),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => {
                tracing::warn!(program, error = %e, "failed to spawn command");
                ExecOutput::transport_failure(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn captures_output_and_code() {
        let out = ProcessRunner
            .exec("sh", &args(&["-c", "echo out; echo err >&2; exit 3"]))
            .await;
        assert_eq!(out.code, 3);
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert!(!out.success());
    }

    #[tokio::test]
    async fn missing_program_is_nonzero() {
        let out = ProcessRunner
            .exec("definitely-not-a-real-program-xyz", &[])
            .await;
        assert_eq!(out.code, TRANSPORT_FAILURE);
        assert!(!out.stderr.is_empty());
    }

    #[test]
    fn check_maps_failure() {
        let ok = ExecOutput {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ExecError::check("komorebic", &[], ok).is_ok());

        let bad = ExecOutput {
            code: 2,
            stdout: String::new(),
            stderr: "no such layout\n".into(),
        };
        let err = ExecError::check("komorebic", &args(&["change-layout", "x"]), bad).unwrap_err();
        assert_eq!(
            err.to_string(),
            "komorebic change-layout exited with code 2: no such layout"
        );
    }
}
