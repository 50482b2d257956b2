use super::{Action, ActionError};
use crate::{
    context::Context,
    template::{render, TemplateError},
};
use duct::cmd;
use log::{debug, error};
use thiserror::Error;

/// The command used to update the repository, if it is not configured.
pub const DEFAULT_COMMAND: &str = "git pull";

/// An action to update a git repository on every pass.
///
/// The command runs in the given directory without a shell, so it is split
/// into words first. Both the stdout and stderr are captured and logged. If the
/// command fails, the remaining actions of the pass don't run.
pub struct GitUpdateAction {
    directory: String,
    command: String,
}

/// Custom error describing the error cases for the GitUpdateAction.
#[derive(Debug, Error)]
pub enum GitUpdateError {
    /// The directory cannot be rendered.
    #[error("cannot render directory: {0}")]
    Template(#[from] TemplateError),
    /// The command is empty or it has unbalanced quotes.
    #[error("cannot parse command {0:?}")]
    InvalidCommand(String),
    /// The underlying Rust command creation failed. The parameter contains the error.
    #[error("the command cannot run: {0}")]
    CommandFailure(#[from] std::io::Error),
    /// The command returned a non-zero exit code. The parameters are the exit code and the output.
    #[error("the command returned non-zero exit code {0} with message: {1}")]
    NonZeroExitcode(i32, String),
}

impl From<GitUpdateError> for ActionError {
    fn from(value: GitUpdateError) -> Self {
        match value {
            GitUpdateError::Template(_) | GitUpdateError::InvalidCommand(_) => {
                ActionError::Misconfigured(value.to_string())
            }
            GitUpdateError::CommandFailure(_) | GitUpdateError::NonZeroExitcode(_, _) => {
                ActionError::FailedAction(value.to_string())
            }
        }
    }
}

impl GitUpdateAction {
    /// Creates a new update in the given directory.
    pub fn new(directory: String, command: String) -> Self {
        GitUpdateAction { directory, command }
    }

    fn run_inner(&self, context: &Context) -> Result<String, GitUpdateError> {
        let directory = render(&self.directory, context)?;
        let args = shlex::split(&self.command)
            .ok_or_else(|| GitUpdateError::InvalidCommand(self.command.clone()))?;
        let (program, args) = args
            .split_first()
            .ok_or_else(|| GitUpdateError::InvalidCommand(self.command.clone()))?;

        debug!("Running {program} {args:?} in directory {directory}.");
        let output = cmd(program, args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stderr_to_stdout()
            .stdout_capture()
            .dir(&directory)
            .unchecked()
            .run()?;

        let output_str = String::from_utf8_lossy(&output.stdout)
            .trim_end()
            .to_string();

        if output.status.success() {
            Ok(output_str)
        } else {
            Err(GitUpdateError::NonZeroExitcode(
                output.status.code().unwrap_or(-1),
                output_str,
            ))
        }
    }
}

impl Action for GitUpdateAction {
    fn run(&self, context: &Context) -> Result<(), ActionError> {
        match self.run_inner(context) {
            Ok(result) => {
                debug!("Repository updated, output:");
                result.lines().for_each(|line| {
                    debug!("{line}");
                });
                Ok(())
            }
            Err(err) => {
                error!("Failed: {err}.");
                Err(err.into())
            }
        }
    }
}
