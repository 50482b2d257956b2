use super::{Trigger, TriggerError};
use crate::context::Context;
use log::debug;
use std::{collections::HashMap, sync::mpsc::Sender};

const TRIGGER_NAME: &str = "ONCE";

/// A trigger that runs the actions once and then exits.
///
/// This can be used, if the webhook is handled by another program or in cronjobs.
pub struct OnceTrigger;

impl Trigger for OnceTrigger {
    /// Starts a trigger that runs once and terminates after.
    fn listen(&self, tx: Sender<Option<Context>>) -> Result<(), TriggerError> {
        let context: Context =
            HashMap::from([("TRIGGER_NAME".to_string(), TRIGGER_NAME.to_string())]);
        debug!("Triggering only once.");
        tx.send(Some(context))?;
        tx.send(None)?;
        Ok(())
    }
}
