use std::io::Write;

use ls1024b_bridge::{BridgeConfig, ProtocolVersion, TemperatureUnit};
use tempfile::NamedTempFile;

#[test]
fn load_from_disk() {
    let mut f = NamedTempFile::new().expect("tempfile");
    write!(
        f,
        r#"
controller_id = "garage"
protocol = "extended"
temperature_unit = "celsius"

[serial]
port = "/dev/ttyUSB1"
slave_id = 2

[poll]
realtime_secs = 10
other_secs = 60
"#
    )
    .expect("write");

    let cfg = BridgeConfig::from_path(f.path()).expect("load");
    assert_eq!(cfg.protocol, ProtocolVersion::Extended);
    assert_eq!(cfg.temperature_unit, TemperatureUnit::Celsius);
    assert_eq!(cfg.serial.port, "/dev/ttyUSB1");
    assert_eq!(cfg.serial.baud, 115_200);
    assert_eq!(cfg.serial.slave_id, 2);
    assert_eq!(cfg.tick_secs(), 10);
    assert_eq!(cfg.publish_topic(), "LS1024B/garage");
    assert_eq!(cfg.command_topic(), "LS1024B/garage/COMMAND");
}

#[test]
fn parse_error_names_line_and_column() {
    let err = BridgeConfig::from_str("controller_id = \"a\"\nprotocol = \"v9\"\n")
        .expect_err("bad protocol");
    let msg = err.to_string();
    assert!(msg.contains("bridge.toml parse error at 2:"), "{msg}");
}

#[test]
fn unknown_key_is_rejected() {
    assert!(BridgeConfig::from_str("[serial]\nparity = \"even\"\n").is_err());
}

#[test]
fn topic_separator_in_controller_id_is_rejected() {
    assert!(BridgeConfig::from_str("controller_id = \"a/b\"").is_err());
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = BridgeConfig::from_path(&dir.path().join("nope.toml")).expect_err("missing");
    assert!(err.to_string().contains("nope.toml"));
}
