use crate::context::Context;
use mockall::automock;
use thiserror::Error;

/// An action that pulls a git repository.
pub mod git_update;
/// The static table of actions, that can be configured by name.
pub mod registry;
/// An action that restarts the services whose configuration changed.
pub mod restart_changed;

/// A custom error for describing the error cases for actions
#[derive(Debug, Error)]
pub enum ActionError {
    /// Cannot initialize or render the action, because it has a misconfiguration.
    #[error("not configured correctly: {0}")]
    Misconfigured(String),
    /// Running the action failed.
    #[error("{0}")]
    FailedAction(String),
}

/// An action is a step that runs on every pass, in the configured order.
///
/// Actions may include:
///   - restarting the services with changed configs ([restart_changed::RestartChangedAction])
///   - pulling a git repository ([git_update::GitUpdateAction])
#[automock]
pub trait Action {
    /// Run the action with the data collected by the trigger.
    fn run(&self, context: &Context) -> Result<(), ActionError>;
}
