use args::parse_args;
use log::debug;
use logger::init_logger;
use stackhook::{
    actions::{
        registry::{load_actions, ActionSettings},
        ActionError,
    },
    start::{start, StartError},
    triggers::{http::HttpTrigger, once::OnceTrigger, signal::SignalTrigger, Trigger, TriggerError},
};
use std::{env, path::Path, process};
use thiserror::Error;

mod args;
mod logger;

#[derive(Debug, Error)]
pub enum MainError {
    #[error("You have to pass an actions file.")]
    MissingActionsFile,
    #[error("Cannot determine the local timezone for the logger.")]
    FailedLoggerTimezones,
    #[error("Cannot initialize the logger: {0}.")]
    FailedLogger(#[from] log::SetLoggerError),
    #[error("Cannot load actions: {0}.")]
    InvalidActions(#[from] ActionError),
    #[error("Cannot start trigger: {0}.")]
    InvalidTrigger(#[from] TriggerError),
    #[error(transparent)]
    Start(#[from] StartError),
}

fn main_inner() -> Result<(), MainError> {
    let args = parse_args();
    if args.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_logger(&args)?;

    // Setup triggers.
    let mut triggers: Vec<Box<dyn Trigger>> = vec![Box::new(SignalTrigger::new())];
    match args.http {
        Some(ref http) if !args.once => triggers.push(Box::new(HttpTrigger::bind(http.clone())?)),
        _ => triggers.push(Box::new(OnceTrigger)),
    }

    // Setup actions.
    let restart_auth_key = env::var(&args.auth_key_env)
        .ok()
        .filter(|key| !key.is_empty());
    if restart_auth_key.is_none() {
        debug!("There is no auth key in ${}.", args.auth_key_env);
    }
    let settings = ActionSettings {
        restart_url: args.restart_url.clone(),
        restart_auth_key,
        restart_timeout: args.restart_timeout.into(),
    };
    let actions_file = args.actions.ok_or(MainError::MissingActionsFile)?;
    let actions = load_actions(Path::new(&actions_file), &settings)?;

    // Start the main loop.
    start(triggers, &actions)?;

    Ok(())
}

fn main() {
    if let Err(err) = main_inner() {
        eprintln!("{err}");
        process::exit(1);
    }
}
