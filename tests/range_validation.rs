use ls1024b_bridge::mock::MockDevice;
use ls1024b_bridge::registers as reg;
use ls1024b_bridge::{Command, CommandTable, DispatchError};

fn float_cmd(m: &str, v: f64) -> Command {
    Command::new(m).expect("mnemonic").with_float(v)
}

fn int_cmd(m: &str, v: i64) -> Command {
    Command::new(m).expect("mnemonic").with_int(v)
}

#[test]
fn voltage_bounds_are_inclusive() {
    let table = CommandTable::builtin();
    let mut dev = MockDevice::new();

    for v in [8.99, 17.01] {
        let err = table
            .dispatch(&mut dev, &float_cmd("HVD", v))
            .expect_err("out of range");
        match err {
            DispatchError::Range(r) => {
                assert!((r.value - v).abs() < f64::EPSILON);
                assert!((r.min - 9.0).abs() < f64::EPSILON);
                assert!((r.max - 17.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(dev.write_attempts(), 0);

    table.dispatch(&mut dev, &float_cmd("HVD", 9.0)).expect("min");
    assert_eq!(dev.holding(reg::HIGH_VOLTAGE_DISCONNECT), Some(900));
    table.dispatch(&mut dev, &float_cmd("HVD", 17.0)).expect("max");
    assert_eq!(dev.holding(reg::HIGH_VOLTAGE_DISCONNECT), Some(1700));
}

#[test]
fn integer_settings_check_their_own_bounds() {
    let table = CommandTable::builtin();
    let mut dev = MockDevice::new();
    let rejected = [
        ("BT", 4),
        ("BC", 0),
        ("LCM", -1),
        ("EQD", 181),
        ("BSTD", 9),
        ("DP", 19),
        ("CP", 101),
        ("BMM", 2),
        ("OCM", 2),
    ];
    for (m, v) in rejected {
        let res = table.dispatch(&mut dev, &int_cmd(m, v));
        assert!(matches!(res, Err(DispatchError::Range(_))), "{m}={v}");
    }
    assert_eq!(dev.write_attempts(), 0);

    table.dispatch(&mut dev, &int_cmd("BSTD", 120)).expect("boost duration");
    assert_eq!(dev.holding(reg::BOOST_DURATION), Some(120));
    table.dispatch(&mut dev, &int_cmd("DP", 80)).expect("discharging percentage");
    assert_eq!(dev.holding(reg::DISCHARGING_PERCENTAGE), Some(80));
}

#[test]
fn coil_int_commands_map_to_bool() {
    let table = CommandTable::builtin();
    let mut dev = MockDevice::new();
    table.dispatch(&mut dev, &int_cmd("FLO", 1)).expect("force load");
    table.dispatch(&mut dev, &int_cmd("OCM", 0)).expect("output control");
    assert_eq!(dev.coil(reg::COIL_FORCE_LOAD), Some(true));
    assert_eq!(dev.coil(reg::COIL_OUTPUT_CONTROL_MODE), Some(false));
}

#[test]
fn transport_failure_is_reported_not_retried() {
    let table = CommandTable::builtin();
    let mut dev = MockDevice::new().fail_address(reg::COIL_CHARGING_DEVICE);
    let err = table
        .dispatch(&mut dev, &Command::new("CDOFF").expect("mnemonic"))
        .expect_err("coil fails");
    assert!(matches!(err, DispatchError::Transport(_)));
    assert_eq!(dev.write_attempts(), 1);
}
