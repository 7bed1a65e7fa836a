use ls1024b_bridge::status::{
    decode_battery_status, decode_charging_status, decode_discharging_status,
    BatteryVoltageStatus, Identification, StatusLabel,
};
use ls1024b_bridge::telemetry::RealTimeStatus;

#[test]
fn all_clear_battery_word() {
    let s = decode_battery_status(0x0000);
    assert_eq!(s.voltage.label(), "Normal");
    assert_eq!(s.temperature.label(), "Normal");
    assert_eq!(s.inner_resistance.label(), "Normal");
    assert_eq!(s.identification.label(), "Correct");
}

#[test]
fn bit_15_marks_wrong_identification() {
    let s = decode_battery_status(0x8000);
    assert_eq!(s.identification, Identification::Incorrect);
    assert_eq!(s.voltage, BatteryVoltageStatus::Normal);
}

#[test]
fn reserved_voltage_pattern_is_unknown() {
    let s = decode_battery_status(0x0007);
    assert_eq!(s.voltage, BatteryVoltageStatus::Unknown(7));
    assert_eq!(s.voltage.label(), "Unknown");
}

#[test]
fn status_serializes_as_labels() {
    let status = RealTimeStatus::decode(0x0102, 0x0000, 0x0000);
    let v = serde_json::to_value(&status).expect("json");
    assert_eq!(v["batteryStatusValue"], 0x0102);
    assert_eq!(v["batteryStatus"]["voltage"], "Under Voltage");
    assert_eq!(v["batteryStatus"]["innerResistance"], "Abnormal");
}

#[test]
fn charging_and_discharging_words_decode_independently() {
    let c = decode_charging_status(0x0000);
    assert!(c.is_normal);
    assert!(!c.is_running);
    let d = decode_discharging_status(0x0001);
    assert!(d.is_running);
    assert!(d.is_normal);
}
