use super::{
    git_update::{GitUpdateAction, DEFAULT_COMMAND},
    restart_changed::{RestartChangedAction, DEFAULT_MANIFEST},
    Action, ActionError,
};
use crate::changes::restart::HttpNotifier;
use log::debug;
use serde::{de::DeserializeOwned, Deserialize};
use serde_yaml::{Mapping, Value};
use std::{fs, path::Path, time::Duration};

/// Settings for the actions, that come from the command line and the environment.
#[derive(Debug, Clone)]
pub struct ActionSettings {
    pub restart_url: String,
    pub restart_auth_key: Option<String>,
    pub restart_timeout: Duration,
}

type Constructor = fn(Value, &ActionSettings) -> Result<Box<dyn Action>, ActionError>;

/// Every action that can be configured, with the name used in the actions file.
const ACTIONS: &[(&str, Constructor)] = &[
    ("git-update", create_git_update),
    ("restart-changed", create_restart_changed),
];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GitUpdateParams {
    directory: String,
    #[serde(default = "default_command")]
    command: String,
}

fn default_command() -> String {
    String::from(DEFAULT_COMMAND)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RestartChangedParams {
    config_dir: String,
    volume_base_dir: String,
    #[serde(default = "default_manifest")]
    manifest: String,
}

fn default_manifest() -> String {
    String::from(DEFAULT_MANIFEST)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActionsFile {
    actions: Vec<Mapping>,
}

fn parse_params<T: DeserializeOwned>(name: &str, params: Value) -> Result<T, ActionError> {
    serde_yaml::from_value(params)
        .map_err(|err| ActionError::Misconfigured(format!("invalid parameters for {name}: {err}")))
}

fn create_git_update(params: Value, _: &ActionSettings) -> Result<Box<dyn Action>, ActionError> {
    let GitUpdateParams { directory, command } = parse_params("git-update", params)?;

    Ok(Box::new(GitUpdateAction::new(directory, command)))
}

fn create_restart_changed(
    params: Value,
    settings: &ActionSettings,
) -> Result<Box<dyn Action>, ActionError> {
    let RestartChangedParams {
        config_dir,
        volume_base_dir,
        manifest,
    } = parse_params("restart-changed", params)?;

    let auth_key = settings.restart_auth_key.clone().ok_or_else(|| {
        ActionError::Misconfigured(String::from(
            "restart-changed needs an auth key for the restart endpoint",
        ))
    })?;
    let notifier = HttpNotifier::new(
        settings.restart_url.clone(),
        auth_key,
        settings.restart_timeout,
    );

    Ok(Box::new(RestartChangedAction::new(
        config_dir,
        volume_base_dir,
        manifest,
        Box::new(notifier),
    )))
}

/// The names of every registered action.
pub fn action_names() -> Vec<&'static str> {
    ACTIONS.iter().map(|(name, _)| *name).collect()
}

/// Create an action by its registered name.
pub fn create_action(
    name: &str,
    params: Value,
    settings: &ActionSettings,
) -> Result<Box<dyn Action>, ActionError> {
    let (_, constructor) = ACTIONS
        .iter()
        .find(|(action_name, _)| *action_name == name)
        .ok_or_else(|| {
            ActionError::Misconfigured(format!(
                "unknown action {name}, valid values: {}",
                action_names().join(", ")
            ))
        })?;

    debug!("Creating action {name}.");
    constructor(params, settings)
}

/// Parse the actions from a YAML document, keeping their order.
///
/// The document has an `actions` list, where every item has one key,
/// the name of the action, with its parameters as the value.
pub fn parse_actions(
    contents: &str,
    settings: &ActionSettings,
) -> Result<Vec<Box<dyn Action>>, ActionError> {
    let file: ActionsFile = serde_yaml::from_str(contents)
        .map_err(|err| ActionError::Misconfigured(format!("invalid actions file: {err}")))?;

    let mut actions = vec![];
    for item in file.actions {
        if item.len() != 1 {
            return Err(ActionError::Misconfigured(format!(
                "every action should have exactly one name, found {}",
                item.len()
            )));
        }

        for (name, params) in item {
            let name = name.as_str().ok_or_else(|| {
                ActionError::Misconfigured(String::from("action name should be a string"))
            })?;
            actions.push(create_action(name, params, settings)?);
        }
    }

    Ok(actions)
}

/// Read and parse the actions file.
pub fn load_actions(
    path: &Path,
    settings: &ActionSettings,
) -> Result<Vec<Box<dyn Action>>, ActionError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        ActionError::Misconfigured(format!(
            "cannot read actions file {}: {err}",
            path.to_string_lossy()
        ))
    })?;

    parse_actions(&contents, settings)
}
