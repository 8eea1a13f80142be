//! Privileged command runner
//! Runs external programs behind the elevation program and captures their output

use crate::error::RunError;
use std::fmt;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// A single external command line, optionally fed on stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    /// Attach a payload written to the child's stdin
    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Prefix the command with an elevation program (`sudo nginx -t`)
    pub fn elevated(self, elevate: Option<&str>) -> Self {
        match elevate {
            Some(elevate) => {
                let mut args = Vec::with_capacity(self.args.len() + 1);
                args.push(self.program);
                args.extend(self.args);
                Self {
                    program: elevate.to_string(),
                    args,
                    stdin: self.stdin,
                }
            }
            None => self,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            ..Self::default()
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Spawns processes. Swapped out in tests.
pub trait CommandExecutor {
    fn execute(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

/// Executor backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    fn execute(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Without a payload the child inherits the terminal so sudo can still ask for a password
        if invocation.stdin.is_some() {
            command.stdin(Stdio::piped());
        }

        let mut child = command.spawn()?;

        if let Some(input) = &invocation.stdin {
            if let Some(mut pipe) = child.stdin.take() {
                // sudo can refuse and exit before reading
                match pipe.write_all(input.as_bytes()) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                        debug!("'{}' closed stdin before reading all input", invocation);
                    }
                    Err(e) => {
                        drop(pipe);
                        let _ = child.wait();
                        return Err(e);
                    }
                }
            }
        }

        let output = child.wait_with_output()?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs commands with elevated privilege
pub struct PrivilegedRunner<E> {
    executor: E,
    elevate: Option<String>,
}

impl<E: CommandExecutor> PrivilegedRunner<E> {
    pub fn new(executor: E, elevate: Option<String>) -> Self {
        Self { executor, elevate }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The command line as it will actually be spawned
    pub fn elevated(&self, invocation: &Invocation) -> Invocation {
        invocation.clone().elevated(self.elevate.as_deref())
    }

    /// Run a command, turning any failure into an error
    pub fn try_run(&self, invocation: &Invocation) -> Result<CommandOutput, RunError> {
        let elevated = self.elevated(invocation);
        info!("Running: {}", elevated);

        let output = self
            .executor
            .execute(&elevated)
            .map_err(|e| spawn_error(e, &elevated.program, invocation))?;

        if !output.success {
            warn!("Command '{}' failed with code {:?}", invocation, output.code);
            return Err(RunError::Failed {
                command: invocation.to_string(),
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        debug!("Command '{}' succeeded", invocation);
        Ok(output)
    }

    /// Run a command, reporting failure as `false`.
    ///
    /// `report` receives the error, captured output included, before `false` is returned.
    pub fn run<F>(&self, invocation: &Invocation, report: F) -> bool
    where
        F: FnOnce(&RunError),
    {
        match self.try_run(invocation) {
            Ok(_) => true,
            Err(e) => {
                warn!("{}", e);
                report(&e);
                false
            }
        }
    }

    /// Check that the elevation program grants privileges (`sudo -v`)
    pub fn check_privileges(&self) -> Result<(), RunError> {
        let Some(elevate) = &self.elevate else {
            debug!("No elevation program configured, skipping privilege check");
            return Ok(());
        };

        let invocation = Invocation::new(elevate.as_str(), ["-v"]);
        let output = self
            .executor
            .execute(&invocation)
            .map_err(|e| spawn_error(e, elevate, &invocation))?;

        if output.success {
            Ok(())
        } else {
            Err(RunError::Failed {
                command: invocation.to_string(),
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
    }
}

fn spawn_error(e: io::Error, program: &str, invocation: &Invocation) -> RunError {
    if e.kind() == io::ErrorKind::NotFound {
        RunError::NotFound {
            program: program.to_string(),
        }
    } else {
        RunError::Io {
            command: invocation.to_string(),
            source: e,
        }
    }
}
