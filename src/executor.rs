//! Command execution thread: the only consumer of the [`CommandQueue`].
//!
//! Each command is dispatched with the serial line held, so a poll cycle on
//! the same [`SerialLine`] never interleaves with a multi-register write.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::dispatcher::CommandTable;
use crate::error::BridgeError;
use crate::queue::CommandQueue;
use crate::transport::{DeviceTransport, SerialLine};

const THREAD_NAME: &str = "ls1024b-commands";

/// Counts for one executor lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Pop and dispatch until the stop marker is reached. Failures are logged
/// and the command is dropped.
pub fn run<T: DeviceTransport>(
    queue: &CommandQueue,
    line: &SerialLine<T>,
    table: &CommandTable,
) -> ExecutionReport {
    let mut report = ExecutionReport::default();
    while let Some(command) = queue.pop_blocking() {
        report.dispatched += 1;
        match line.with(|t| table.dispatch(t, &command)) {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                report.failed += 1;
                log::error!("[CMD] {} failed: {e}", command.mnemonic());
            }
        }
    }
    log::info!(
        "command loop stopped: {} dispatched, {} failed",
        report.dispatched,
        report.failed
    );
    report
}

pub struct CommandExecutor {
    queue: Arc<CommandQueue>,
    handle: JoinHandle<ExecutionReport>,
}

impl CommandExecutor {
    /// Start the execution thread.
    pub fn spawn<T>(
        queue: Arc<CommandQueue>,
        line: SerialLine<T>,
        table: Arc<CommandTable>,
    ) -> Result<Self, BridgeError>
    where
        T: DeviceTransport + 'static,
    {
        let q = Arc::clone(&queue);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(&q, &line, &table))?;
        log::debug!("{THREAD_NAME} started");
        Ok(Self { queue, handle })
    }

    #[must_use]
    pub fn queue(&self) -> &Arc<CommandQueue> {
        &self.queue
    }

    /// Queue a stop marker. Commands already queued still run.
    pub fn stop(&self) {
        self.queue.push_stop();
    }

    /// Wait for the thread to reach a stop marker.
    pub fn join(self) -> Result<ExecutionReport, BridgeError> {
        self.handle
            .join()
            .map_err(|_| BridgeError::Worker(format!("{THREAD_NAME} panicked")))
    }

    /// [`stop`](Self::stop) then [`join`](Self::join).
    pub fn shutdown(self) -> Result<ExecutionReport, BridgeError> {
        self.stop();
        self.join()
    }
}
