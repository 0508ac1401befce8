//! Events driving the sampling loop, emitted from background threads

use std::io;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use log::error;
use thiserror::Error;

use crate::triggers::pulse::Pulse;
use crate::triggers::signal::SignalListener;

mod pulse;
mod signal;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not register signal handlers")]
    SignalError(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The application should stop sampling and exit
    Exit,
    /// A new sample should be taken
    Impulse,
}

pub struct TriggersEmitter;

impl TriggersEmitter {
    /// Starts the threads emitting triggers, which stop on their own once the receiver is dropped
    ///
    /// # Arguments
    ///  * `sender`: The channel on which to send triggers
    ///  * `impulse_period`: The time between two consecutive [`Trigger::Impulse`]
    pub fn launch_async(sender: Sender<Trigger>, impulse_period: Duration) {
        let impulse_sender = sender.clone();
        let signal_sender = sender;

        Self::start_impulse_thread(impulse_sender, impulse_period);
        Self::start_signal_thread(signal_sender);
    }

    fn start_impulse_thread(sender: Sender<Trigger>, impulse_period: Duration) {
        thread::spawn(move || {
            let mut pulse = Pulse::new(impulse_period);

            loop {
                pulse.pulse();
                if sender.send(Trigger::Impulse).is_err() {
                    break;
                }
            }
        });
    }

    fn start_signal_thread(sender: Sender<Trigger>) {
        thread::spawn(move || {
            if let Err(e) = SignalListener::new(sender).listen() {
                error!("Trigger error: {}", e);
            }
        });
    }
}
