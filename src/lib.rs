#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::doc_markdown,
    clippy::too_long_first_doc_paragraph
)]

//! ls1024b_bridge
//!
//! Bridge between an EPSolar LandStar LS1024B solar charge controller on a
//! Modbus RTU serial line and a publish/subscribe network.
//!
//! - inbound path: JSON payload -> [`Command`] -> [`CommandQueue`] -> command
//!   execution thread -> [`CommandTable::dispatch`] -> register/coil writes
//! - outbound path: [`TelemetryPoller`] reads the rated, real-time, status,
//!   settings and statistics blocks and emits [`TelemetrySnapshot`]s
//! - [`codec`] and [`status`] hold the pure register encodings
//!
//! ```no_run
//! use std::sync::Arc;
//! use ls1024b_bridge::{CommandExecutor, CommandQueue, CommandTable, MockDevice, SerialLine};
//!
//! let queue = Arc::new(CommandQueue::new());
//! let line = SerialLine::new(MockDevice::new());
//! let exec = CommandExecutor::spawn(queue.clone(), line, Arc::new(CommandTable::builtin()))?;
//! queue.push(ls1024b_bridge::Command::new("LDON")?);
//! let report = exec.shutdown()?;
//! assert_eq!(report.succeeded, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod inbound;
pub mod mock;
pub mod operations;
pub mod poller;
pub mod queue;
pub mod registers;
pub mod status;
pub mod telemetry;
pub mod test_utils;
pub mod toml_helpers;
pub mod transport;

pub use commands::Command;
pub use config::{BridgeConfig, ProtocolVersion, TemperatureUnit};
pub use dispatcher::{CommandTable, CommandTableEntry, Operation};
pub use error::{BridgeError, DispatchError, InboundError, RangeError, TransportError};
pub use executor::{CommandExecutor, ExecutionReport};
pub use inbound::InboundHandler;
pub use mock::MockDevice;
pub use poller::TelemetryPoller;
pub use queue::CommandQueue;
pub use telemetry::TelemetrySnapshot;
pub use transport::{DeviceTransport, SerialLine};

#[cfg(feature = "rtu")]
pub use transport::rtu::RtuTransport;

/// Install `env_logger` with `info` as the default filter (`RUST_LOG`
/// overrides it). Safe to call more than once.
pub fn init_logger() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already initialized");
    }
}
