use super::{Trigger, TriggerError};
use crate::context::Context;
use log::{debug, warn};
use std::sync::mpsc::Sender;

/// A trigger that terminates the program on a signal.
///
/// On the first signal the running pass can finish and no new passes start.
/// On the second signal the program exits immediately.
#[derive(Default)]
pub struct SignalTrigger;

impl SignalTrigger {
    pub fn new() -> SignalTrigger {
        SignalTrigger
    }

    /// Handle the incoming signals, returns the signal to exit with,
    /// if the program should terminate immediately.
    pub fn handle_signals<I>(&self, tx: &Sender<Option<Context>>, signals: I) -> Option<i32>
    where
        I: IntoIterator<Item = i32>,
    {
        let mut stopping = false;
        for signal in signals {
            if stopping {
                debug!("Got signal {signal} again, terminating right now.");
                return Some(signal);
            }

            debug!("Got signal {signal}, terminating after the running pass finished.");
            if tx.send(None).is_err() {
                warn!("The main loop already stopped, terminating on signal {signal}.");
                return Some(signal);
            }
            stopping = true;
        }

        None
    }
}

impl Trigger for SignalTrigger {
    #[cfg(unix)]
    fn listen(&self, tx: Sender<Option<Context>>) -> Result<(), TriggerError> {
        use signal_hook::{consts::TERM_SIGNALS, iterator::Signals};
        use std::process;

        let mut signals = Signals::new(TERM_SIGNALS).map_err(|err| {
            TriggerError::FailedTrigger(format!("cannot set up signal handlers: {err}"))
        })?;

        if let Some(signal) = self.handle_signals(&tx, signals.forever()) {
            process::exit(128 + signal);
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn listen(&self, _tx: Sender<Option<Context>>) -> Result<(), TriggerError> {
        debug!("Signal handlers are not supported on non-unix systems.");

        Ok(())
    }
}
