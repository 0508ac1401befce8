use std::sync::mpsc::Sender;

use log::info;
use signal_hook::consts::signal::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;

use crate::triggers::{Error, Trigger};

/// Listens for UNIX termination signals and emits an exit trigger
pub struct SignalListener {
    sender: Sender<Trigger>,
}

impl SignalListener {
    pub fn new(sender: Sender<Trigger>) -> Self {
        Self { sender }
    }

    /// Blocks until a termination signal is received
    pub fn listen(self) -> Result<(), Error> {
        let mut signals = Signals::new(&[SIGINT, SIGTERM, SIGQUIT]).map_err(Error::SignalError)?;

        if let Some(signal) = signals.forever().next() {
            info!("Received signal {}, exiting", signal);
            // The receiver may already be gone if the sampling loop stopped on an error
            let _ = self.sender.send(Trigger::Exit);
        }

        Ok(())
    }
}
