use std::sync::Arc;

use ls1024b_bridge::mock::WriteRecord;
use ls1024b_bridge::registers as reg;
use ls1024b_bridge::test_utils::announce;
use ls1024b_bridge::{
    Command, CommandExecutor, CommandQueue, CommandTable, ExecutionReport, InboundHandler,
    MockDevice, SerialLine,
};

#[test]
fn commands_run_in_order_and_failures_are_counted() {
    announce("executor_loopback", "inbound payloads reach the mock device in order");

    let queue = Arc::new(CommandQueue::new());
    let line = SerialLine::new(MockDevice::new());
    let executor = CommandExecutor::spawn(
        Arc::clone(&queue),
        line.clone(),
        Arc::new(CommandTable::builtin()),
    )
    .expect("spawn");

    let inbound = InboundHandler::with_topic(Arc::clone(&queue), "LS1024B/1/COMMAND");
    let payloads: [&[u8]; 5] = [
        br#"{"command":"BV","fParam":14.4}"#,
        br#"{"command":"NOPE"}"#,
        br#"{"command":"HVD","fParam":30}"#,
        br#"{"command":"CDON"}"#,
        br#"{"command":"WTL1","cParam":"02:30"}"#,
    ];
    for p in payloads {
        assert!(inbound.on_message("LS1024B/1/COMMAND", p).expect("queued"));
    }

    let report = executor.shutdown().expect("join");
    assert_eq!(
        report,
        ExecutionReport {
            dispatched: 5,
            succeeded: 3,
            failed: 2
        }
    );

    let dev = line.into_inner().expect("executor released the line");
    assert_eq!(
        dev.journal(),
        &[
            WriteRecord::Register {
                addr: reg::BOOST_VOLTAGE,
                word: 1440
            },
            WriteRecord::Coil {
                addr: reg::COIL_CHARGING_DEVICE,
                value: true
            },
            WriteRecord::Register {
                addr: reg::WORKING_TIME_LENGTH_1,
                word: 0x021E
            },
        ]
    );
}

#[test]
fn commands_before_stop_still_run() {
    let queue = Arc::new(CommandQueue::new());
    queue.push(Command::new("LDON").expect("mnemonic"));
    queue.push(Command::new("LDOFF").expect("mnemonic"));
    queue.push_stop();
    queue.push(Command::new("CGES").expect("mnemonic"));

    let line = SerialLine::new(MockDevice::new());
    let executor = CommandExecutor::spawn(
        Arc::clone(&queue),
        line.clone(),
        Arc::new(CommandTable::builtin()),
    )
    .expect("spawn");
    let report = executor.join().expect("join");
    assert_eq!(report.dispatched, 2);
    // queued after the marker, left for whoever drains the queue
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.clear(), 1);

    let dev = line.into_inner().expect("line");
    assert_eq!(dev.coil(reg::COIL_MANUAL_LOAD), Some(false));
    assert_eq!(dev.coil(reg::COIL_CLEAR_STATISTICS), None);
}
