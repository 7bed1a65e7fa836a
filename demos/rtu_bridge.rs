//! Talks to a real controller. Telemetry snapshots go to stdout as JSON
//! lines; command payloads are read from stdin, one JSON object per line.
//!
//! `LS1024B_PORT=/dev/ttyUSB0 cargo run --example rtu_bridge --features rtu`

use std::io::BufRead;
use std::sync::Arc;

use ls1024b_bridge::{
    init_logger, BridgeConfig, CommandExecutor, CommandQueue, CommandTable, InboundHandler,
    RtuTransport, SerialLine, TelemetryPoller,
};
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let config = BridgeConfig::from_env();
    let line = SerialLine::new(RtuTransport::open(&config.serial)?);
    let queue = Arc::new(CommandQueue::new());
    let executor = CommandExecutor::spawn(
        Arc::clone(&queue),
        line.clone(),
        Arc::new(CommandTable::builtin()),
    )?;

    let inbound = InboundHandler::new(Arc::clone(&queue), &config);
    let topic = config.command_topic();
    std::thread::spawn(move || {
        for payload in std::io::stdin().lock().lines().map_while(Result::ok) {
            if let Err(e) = inbound.on_message(&topic, payload.as_bytes()) {
                eprintln!("rejected: {e}");
            }
        }
    });

    let (tx, mut rx) = mpsc::channel(8);
    let (stop_tx, stop_rx) = watch::channel(false);
    let poller = tokio::spawn(TelemetryPoller::new(line, config).run(tx, stop_rx));

    loop {
        tokio::select! {
            snapshot = rx.recv() => match snapshot {
                Some(s) => println!("{}", s.to_json()?),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    stop_tx.send(true)?;
    poller.await??;
    let report = executor.shutdown()?;
    log::info!("{} commands, {} failed", report.dispatched, report.failed);
    Ok(())
}
