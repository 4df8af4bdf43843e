/*!
   Running host commands, and the output of commands run in containers.
*/

use std::process::{Command, Output};
use tracing::{debug, trace};

use crate::error::{handle_exec_error, Error};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether either output stream contains the given marker.
    pub fn contains(&self, marker: &str) -> bool {
        self.stdout.contains(marker) || self.stderr.contains(marker)
    }
}

impl From<&Output> for ExecOutput {
    // container logs are not guaranteed to be valid UTF-8
    fn from(output: &Output) -> Self {
        Self::new(
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        )
    }
}

/**
   Run `command_path` with `args` on the host, failing with
   [`ExecFailed`](crate::error::ErrorDetail::ExecFailed) on a non-zero
   exit status.
*/
pub fn simple_exec(desc: &str, command_path: &str, args: &[&str]) -> Result<ExecOutput, Error> {
    let command_line = format!("{} {}", command_path, itertools::join(args, " "));

    debug!("{}: {}", desc, command_line);

    let output = Command::new(command_path)
        .args(args)
        .output()
        .map_err(handle_exec_error(command_path))?;

    let exec_output = ExecOutput::from(&output);

    if !output.status.success() {
        return Err(Error::exec_failed(
            command_line,
            output.status.code(),
            exec_output.stderr,
        ));
    }

    trace!(
        "`{}` succeeded with stdout: {}, stderr: {}",
        command_line,
        exec_output.stdout,
        exec_output.stderr
    );

    Ok(exec_output)
}
