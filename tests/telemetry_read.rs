use ls1024b_bridge::registers as reg;
use ls1024b_bridge::telemetry::{
    read_rated_data, read_realtime_data, read_realtime_status, read_snapshot, read_statistics,
    BlockSelection,
};
use ls1024b_bridge::{BridgeConfig, MockDevice, ProtocolVersion, TemperatureUnit};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn realtime_device() -> MockDevice {
    MockDevice::new()
        .with_input(reg::REALTIME_DATA, &[1320, 150, 0x0001, 0x0001, 1290, 140, 1806, 0])
        .with_input(0x310C, &[1280, 45, 576, 0, 2500, 0xFC18, 3000])
        .with_input(reg::BATTERY_SOC, &[87, 2000, 0, 1200])
}

#[test]
fn legacy_realtime_block() {
    let mut dev = realtime_device();
    let d = read_realtime_data(&mut dev, ProtocolVersion::Legacy, TemperatureUnit::Celsius)
        .expect("read");
    assert!(close(d.pv_array_voltage, 13.2));
    assert!(close(d.pv_array_power, 655.37));
    assert!(close(d.battery_power, 18.06));
    assert!(close(d.load_power, 5.76));
    assert!(close(d.battery_temp, 25.0));
    assert!(close(d.case_temp, -10.0));
    assert_eq!(d.battery_soc, None);
    assert_eq!(d.temperature_unit, "Celsius");
}

#[test]
fn extended_realtime_adds_soc_and_converts_temperatures() {
    let mut dev = realtime_device();
    let d = read_realtime_data(&mut dev, ProtocolVersion::Extended, TemperatureUnit::Fahrenheit)
        .expect("read");
    assert!(close(d.battery_temp, 77.0));
    assert!(close(d.case_temp, 14.0));
    assert!(close(d.components_temp.expect("components"), 86.0));
    assert_eq!(d.battery_soc, Some(87));
    assert!(close(d.remote_battery_temperature.expect("remote"), 68.0));
    assert!(close(d.battery_real_rated_power.expect("rated"), 12.0));
}

fn rated_device() -> MockDevice {
    MockDevice::new()
        .with_input(reg::RATED_DATA, &[5000, 1000, 0x86A0, 0x0001, 1200, 1000, 0, 0, 1])
        .with_input(reg::RATED_LOAD_CURRENT, &[1000])
}

#[test]
fn rated_data_reads_load_current_separately() {
    let mut dev = rated_device();
    let r = read_rated_data(&mut dev, ProtocolVersion::Extended).expect("read");
    // 0x000186A0 = 100000 -> 1000.00 W
    assert!(close(r.pv_array_rated_power, 1000.0));
    assert_eq!(r.charging_mode, "PWM");
    assert!(close(r.rated_current_of_load.expect("load current"), 10.0));
}

#[test]
fn legacy_rated_data_stays_inside_the_block() {
    let mut dev = rated_device().fail_address(reg::RATED_LOAD_CURRENT);
    let r = read_rated_data(&mut dev, ProtocolVersion::Legacy).expect("read");
    assert!(close(r.pv_array_rated_voltage, 50.0));
    assert_eq!(r.rated_current_of_load, None);
}

#[test]
fn failed_load_current_keeps_rated_block() {
    let mut dev = rated_device().fail_address(reg::RATED_LOAD_CURRENT);
    let r = read_rated_data(&mut dev, ProtocolVersion::Extended).expect("read");
    assert!(close(r.battery_rated_voltage, 12.0));
    assert_eq!(r.rated_current_of_load, None);

    let config = BridgeConfig::from_str("protocol = \"extended\"").expect("config");
    let snap = read_snapshot(&mut dev, &config, BlockSelection::ALL);
    let rated = snap.rated_data.expect("rated block kept");
    assert!(close(rated.pv_array_rated_power, 1000.0));
    assert_eq!(rated.rated_current_of_load, None);
}

#[test]
fn failed_extra_registers_keep_realtime_fields() {
    let mut dev = realtime_device().fail_address(reg::BATTERY_SOC);
    let d = read_realtime_data(&mut dev, ProtocolVersion::Extended, TemperatureUnit::Celsius)
        .expect("read");
    assert!(close(d.pv_array_voltage, 13.2));
    assert!(close(d.components_temp.expect("components"), 30.0));
    assert_eq!(d.battery_soc, None);
    assert_eq!(d.remote_battery_temperature, None);
    assert_eq!(d.battery_real_rated_power, None);
}

#[test]
fn statistics_battery_current_is_signed() {
    let mut words = vec![0u16; usize::from(reg::STATISTICS_WORDS)];
    words[0x1A] = 1310;
    words[0x1B] = 0xFE0C; // -500 -> -5.00 A
    words[0x1C] = 0xFFFF;
    words[0x1E] = 2000;
    let mut dev = MockDevice::new().with_input(reg::STATISTICS, &words);
    let s = read_statistics(&mut dev, TemperatureUnit::Celsius).expect("read");
    assert!(close(s.battery_voltage, 13.1));
    assert!(close(s.battery_current, -5.0));
    assert!(close(s.ambient_temp, 20.0));
}

#[test]
fn status_block() {
    let mut dev = MockDevice::new().with_input(reg::REALTIME_STATUS, &[0x8000, 0x0009, 0x0001]);
    let s = read_realtime_status(&mut dev).expect("read");
    assert_eq!(s.battery_status_value, 0x8000);
    assert!(s.charging_status.is_running);
    assert!(s.discharging_status.is_running);
}

#[test]
fn failed_block_is_absent_from_snapshot() {
    let mut dev = realtime_device().fail_address(reg::STATISTICS);
    let config = BridgeConfig::from_str("controller_id = \"7\"").expect("config");
    let snap = read_snapshot(&mut dev, &config, BlockSelection::ALL);
    assert_eq!(snap.topic, "LS1024B/7");
    assert!(snap.realtime_data.is_some());
    assert!(snap.realtime_status.is_some());
    assert!(snap.settings.is_some());
    assert!(snap.statistics.is_none());

    let json: serde_json::Value = serde_json::from_str(&snap.to_json().expect("json")).expect("parse");
    assert_eq!(json["controllerId"], "7");
    assert!(json.get("statistics").is_none());
    assert!(json["realtimeData"]["pvArrayPower"].is_number());
}

#[test]
fn realtime_only_selection_skips_other_blocks() {
    let mut dev = realtime_device();
    let snap = read_snapshot(&mut dev, &BridgeConfig::default(), BlockSelection::REALTIME_ONLY);
    assert!(snap.realtime_data.is_some());
    assert!(snap.rated_data.is_none());
    assert!(snap.settings.is_none());
}
