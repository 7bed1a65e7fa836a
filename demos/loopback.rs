//! Runs the command and telemetry paths against an in-memory controller.
//!
//! `cargo run --example loopback [bridge.toml]`

use std::env;
use std::path::Path;
use std::sync::Arc;

use ls1024b_bridge::registers as reg;
use ls1024b_bridge::{
    init_logger, BridgeConfig, CommandExecutor, CommandQueue, CommandTable, InboundHandler,
    MockDevice, SerialLine, TelemetryPoller,
};
use tokio::sync::{mpsc, watch};

fn sample_device() -> MockDevice {
    MockDevice::new()
        // 13.20 V / 1.50 A / 19.80 W from the panel, 12.90 V battery
        .with_input(reg::REALTIME_DATA, &[1320, 150, 1980, 0, 1290, 140, 1806, 0])
        .with_input(0x310C, &[1280, 45, 576, 0, 2150, 2475, 2600])
        .with_input(reg::REALTIME_STATUS, &[0x0000, 0x0005, 0x0001])
        .with_input(reg::RATED_DATA, &[5000, 1000, 0xA120, 0x0007, 1200, 1000, 0xA120, 0x0007, 1])
        .with_input(reg::RATED_LOAD_CURRENT, &[1000])
        .with_holding(reg::BATTERY_TYPE, &[1, 100, 300, 1600, 1500, 1500, 1460, 1440, 1380, 1320])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let config = match env::args().nth(1) {
        Some(path) => BridgeConfig::from_path(Path::new(&path))?,
        None => BridgeConfig::from_env(),
    };

    let line = SerialLine::new(sample_device());
    let queue = Arc::new(CommandQueue::new());
    let executor = CommandExecutor::spawn(
        Arc::clone(&queue),
        line.clone(),
        Arc::new(CommandTable::builtin()),
    )?;
    let inbound = InboundHandler::new(Arc::clone(&queue), &config);

    let (tx, mut rx) = mpsc::channel(4);
    let (stop_tx, stop_rx) = watch::channel(false);
    let poller = tokio::spawn(TelemetryPoller::new(line.clone(), config.clone()).run(tx, stop_rx));

    let topic = config.command_topic();
    let payloads: [&[u8]; 4] = [
        br#"{"command":"BV","fParam":14.4}"#,
        br#"{"command":"TONT1","cParam":"19:30:00"}"#,
        br#"{"command":"HVD","fParam":18.5}"#,
        br#"{"command":"LDON"}"#,
    ];
    for p in payloads {
        if let Err(e) = inbound.on_message(&topic, p) {
            eprintln!("rejected: {e}");
        }
    }

    if let Some(snapshot) = rx.recv().await {
        println!("{} {}", snapshot.topic, snapshot.to_json()?);
    }

    stop_tx.send(true)?;
    let sent = poller.await??;
    let report = executor.shutdown()?;
    println!(
        "snapshots: {sent}, commands: {} ok / {} failed",
        report.succeeded, report.failed
    );
    Ok(())
}
