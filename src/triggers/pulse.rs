use std::thread;
use std::time::{Duration, Instant};

/// Structure used to lead a cadence
pub struct Pulse {
    last_tick: Instant,
    iteration_lapse: Duration,
}

impl Pulse {
    pub fn new(periodic_time: Duration) -> Self {
        Pulse {
            last_tick: Instant::now(),
            iteration_lapse: periodic_time,
        }
    }

    /// Blocking method that only returns on the next pulse
    ///
    /// If more than one period elapsed since the previous pulse, returns immediately.
    pub fn pulse(&mut self) {
        let elapsed = self.last_tick.elapsed();
        thread::sleep(self.iteration_lapse.saturating_sub(elapsed));

        self.last_tick = Instant::now();
    }
}
