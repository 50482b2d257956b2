use crate::{
    actions::Action,
    context::Context,
    triggers::{Trigger, TriggerError},
};
use log::{debug, error, info};
use std::{sync::mpsc, thread};
use thiserror::Error;

/// A custom error implementation for the start function
#[derive(Debug, Error)]
pub enum StartError {
    #[error("You have to define at least one trigger.")]
    NoTriggers,
    #[error("You have to define at least one action.")]
    NoActions,
    #[error("Trigger failed: {0}.")]
    MisconfiguredTrigger(#[from] TriggerError),
}

/// Run the actions in order, stopping at the first failing one.
///
/// Returns the number of actions that succeeded.
pub fn run_pass(actions: &[Box<dyn Action>], context: &Context) -> usize {
    let mut succeeded = 0;
    for action in actions {
        if let Err(err) = action.run(context) {
            error!("Action failed, we will not continue: {err}.");
            break;
        }
        succeeded += 1;
    }

    succeeded
}

/// The main program loop, that runs the actions on every trigger.
///
/// The triggers run on their own threads, but the passes run one at a time,
/// in the order they were triggered. If a trigger fails, the loop stops
/// after the current pass and the error is returned.
pub fn start(triggers: Vec<Box<dyn Trigger>>, actions: &[Box<dyn Action>]) -> Result<(), StartError> {
    let (tx, rx) = mpsc::channel::<Option<Context>>();

    if triggers.is_empty() {
        return Err(StartError::NoTriggers);
    }
    if actions.is_empty() {
        return Err(StartError::NoActions);
    }

    let (failure_tx, failure_rx) = mpsc::channel::<TriggerError>();
    for trigger in triggers {
        let tx = tx.clone();
        let stop_tx = tx.clone();
        let failure_tx = failure_tx.clone();
        thread::spawn(move || {
            let result = trigger.listen(tx);
            if let Err(err) = result {
                error!("Trigger failed: {err}.");
                // The failure has to arrive before the stop message.
                let _ = failure_tx.send(err);
                let _ = stop_tx.send(None);
            }
        });
    }
    drop(tx);
    drop(failure_tx);

    debug!("Waiting on triggers.");
    while let Ok(Some(context)) = rx.recv() {
        info!(
            "Triggered by {}, running {} actions.",
            context
                .get("TRIGGER_NAME")
                .map(String::as_str)
                .unwrap_or("unknown"),
            actions.len()
        );
        let succeeded = run_pass(actions, &context);
        debug!("Pass finished, {succeeded} of {} actions succeeded.", actions.len());
    }

    if let Ok(err) = failure_rx.try_recv() {
        return Err(StartError::MisconfiguredTrigger(err));
    }

    debug!("Finished running.");

    Ok(())
}
