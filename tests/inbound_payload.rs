use std::sync::Arc;

use ls1024b_bridge::inbound::parse_command;
use ls1024b_bridge::queue::Polled;
use ls1024b_bridge::{BridgeConfig, CommandQueue, InboundError, InboundHandler};
use serde_json::json;

fn bytes(v: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(v).expect("json")
}

#[test]
fn all_fields_are_carried() {
    let payload = bytes(&json!({
        "command": "tont1",
        "iParam": 4,
        "fParam": 13.8,
        "cParam": "19:30:00",
        "extra": true
    }));
    let c = parse_command(&payload).expect("parse");
    assert_eq!(c.mnemonic(), "TONT1");
    assert_eq!(c.int_param, 4);
    assert!((c.float_param - 13.8).abs() < f64::EPSILON);
    assert_eq!(c.text_param.as_str(), "19:30:00");
}

#[test]
fn integer_fparam_is_accepted() {
    let c = parse_command(&bytes(&json!({"command": "BV", "fParam": 14}))).expect("parse");
    assert!((c.float_param - 14.0).abs() < f64::EPSILON);
}

#[test]
fn over_long_fields_are_rejected_not_truncated() {
    let long = "9".repeat(33);
    let err = parse_command(&bytes(&json!({"command": "SLON", "cParam": long})))
        .expect_err("cParam too long");
    assert!(matches!(err, InboundError::TooLong { len: 33, max: 32, .. }));

    let err = parse_command(&bytes(&json!({"command": "X".repeat(40)})))
        .expect_err("command too long");
    assert!(matches!(err, InboundError::TooLong { .. }));
}

#[test]
fn not_json() {
    assert!(matches!(
        parse_command(b"CDON"),
        Err(InboundError::Json(_))
    ));
}

#[test]
fn handler_queues_only_command_topic() {
    let queue = Arc::new(CommandQueue::new());
    let config = BridgeConfig::from_str("controller_id = \"shed\"").expect("config");
    let handler = InboundHandler::new(Arc::clone(&queue), &config);
    assert_eq!(handler.command_topic(), "LS1024B/shed/COMMAND");

    let payload = bytes(&json!({"command": "LDON"}));
    assert!(!handler.on_message("LS1024B/shed", &payload).expect("ignored"));
    assert!(queue.is_empty());

    assert!(handler.on_message("LS1024B/shed/COMMAND", &payload).expect("queued"));
    match queue.pop_non_blocking() {
        Polled::Command(c) => assert_eq!(c.mnemonic(), "LDON"),
        other => panic!("unexpected {other:?}"),
    }

    assert!(handler.on_message("LS1024B/shed/COMMAND", b"{}").is_err());
    assert!(queue.is_empty());
}
