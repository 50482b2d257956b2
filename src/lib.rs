//! Run webhook-triggered actions on a Docker stack and restart the services
//! whose configuration changed.
//!
//! ## How it works
//!
//! `stackhook` is built up from **triggers** and **actions**. Triggers are long
//! running background processes that initiate a pass (for example an HTTP webhook,
//! or a single run). Every pass runs the configured actions in order, for example
//! pulling a git repository and then restarting the services that mount a
//! configuration file that changed.
//!
//! ```ignore
//! +---------+       +---------+       +-----------------------------------------+
//! | trigger | ----> | actions | ----> | checksums -> manifest -> restart notify |
//! +---------+       +---------+       +-----------------------------------------+
//! ```
//!

/// An action is a step of a pass (e.g. [restarting changed services](actions::restart_changed::RestartChangedAction)).
pub mod actions;
/// Detecting changed configuration files and the services they belong to.
pub mod changes;
/// A trigger is a long running background process, which initiates the passes
/// (e.g. [on HTTP request](triggers::http::HttpTrigger) or [once](triggers::once::OnceTrigger)).
pub mod triggers;

/// The main program loop, that runs the triggers and actions.
pub mod start;

/// The context which can share data between the trigger and the actions.
pub mod context;
/// Placeholder substitution in action parameters.
pub mod template;

#[cfg(test)]
pub(crate) mod scratch;
