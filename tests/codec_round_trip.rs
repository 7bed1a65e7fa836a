use ls1024b_bridge::codec::{
    decode_fixed_point, decode_fixed_point_wide, decode_temperature, encode_fixed_point,
    encode_int, Bounds,
};
use ls1024b_bridge::test_utils::announce;

#[test]
fn voltage_setpoints_round_trip_within_hundredth() {
    announce("codec_round_trip", "every setpoint in 9.00..=17.00 survives encode/decode");
    for centi in 900u16..=1700 {
        let v = f64::from(centi) / 100.0;
        let word = encode_fixed_point("voltage", v).expect("in range");
        assert!((decode_fixed_point(word) - v).abs() <= 0.01, "{v} -> {word}");
    }
}

#[test]
fn wide_value_is_low_word_first() {
    assert!((decode_fixed_point_wide(0x0001, 0x0001, false) - 655.37).abs() < 1e-9);
    // hi word carries the sign
    assert!((decode_fixed_point_wide(0xFF9C, 0xFFFF, true) + 1.0).abs() < 1e-9);
}

#[test]
fn temperature_conversion_is_per_call() {
    // 25.00 C
    assert!((decode_temperature(2500, false) - 25.0).abs() < 1e-9);
    assert!((decode_temperature(2500, true) - 77.0).abs() < 1e-9);
    // -10.00 C
    assert!((decode_temperature(0xFC18, true) - 14.0).abs() < 1e-9);
}

#[test]
fn fixed_point_rejects_what_a_register_cannot_hold() {
    assert!(encode_fixed_point("v", -0.5).is_err());
    assert!(encode_fixed_point("v", 655.36).is_err());
    assert!(encode_fixed_point("v", f64::NAN).is_err());
    assert_eq!(encode_fixed_point("v", 655.35), Ok(u16::MAX));
}

#[test]
fn int_encoding_uses_caller_bounds() {
    let capacity = Bounds::new("battery capacity", 1.0, 9999.0);
    assert_eq!(encode_int(200, &capacity), Ok(200));
    let err = encode_int(0, &capacity).expect_err("below minimum");
    assert_eq!(err.field, "battery capacity");
    assert!((err.value - 0.0).abs() < f64::EPSILON);
}
