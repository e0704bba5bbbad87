//! Background loop driving time-based rotation

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use logrotor_core::SCHEDULER_THREAD_NAME;
use std::ops::ControlFlow;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Runs `tick` every interval until stopped or until `tick` breaks
pub(crate) struct Scheduler {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn spawn<F>(interval: Duration, mut tick: F) -> std::io::Result<Self>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if tick().is_break() {
                            debug!("Rotation scheduler found the writer closed");
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Signal the loop and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Full channel means a stop is already pending; a gone receiver means the loop exited
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Rotation scheduler panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
