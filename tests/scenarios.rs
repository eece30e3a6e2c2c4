use std::sync::Arc;
use std::thread;

use approx::assert_abs_diff_eq;
use arinc429_autopilot::{
    Engine, FlightConfig, FlightMode, Label, RawWord, Result, Sdi, Ssm, Value, WordCodec,
    ERROR_WORD,
};

fn altitude(feet: f64, mode: FlightMode) -> Value {
    Value::Altitude {
        feet: Some(feet),
        mode: Some(mode),
    }
}

fn decode_all(codec: &WordCodec, words: &[u32]) -> Result<Vec<Value>> {
    words
        .iter()
        .map(|&word| codec.decode(word).map(|decoded| decoded.value))
        .collect()
}

#[test]
fn test_climb_to_ten_thousand_feet() -> Result<()> {
    let codec = WordCodec::standard();
    let mut engine = Engine::new();

    let power = codec.encode_value(Sdi::ZERO, &Value::Power(Some(80.0)))?;
    let replies = decode_all(&codec, &engine.process(power))?;
    assert_eq!(replies, vec![Value::Power(Some(0.0))]);
    assert_eq!(engine.state().desired_power, 80.0);

    let command = codec.encode_value(Sdi::ZERO, &altitude(10_000.0, FlightMode::Ground))?;
    let mut previous_power = 0.0;
    let mut reached = false;
    for _ in 0..10_000 {
        let replies = decode_all(&codec, &engine.process(command))?;
        assert_eq!(replies.len(), 4);

        let state = engine.state();
        assert!(state.power - previous_power <= 5.0 + 1e-9);
        previous_power = state.power;

        match replies[1] {
            Value::ClimbRate(Some(rate)) => assert!((0.0..=800.0).contains(&rate)),
            other => panic!("unexpected climb reply {:?}", other),
        }

        if state.mode == FlightMode::Cruise {
            reached = true;
            break;
        }
        assert_eq!(state.mode, FlightMode::Changing);
    }

    assert!(reached);
    assert_abs_diff_eq!(engine.state().altitude, 10_000.0, epsilon = 1.0);

    for _ in 0..100 {
        engine.process(command);
        assert_eq!(engine.state().mode, FlightMode::Cruise);
    }
    Ok(())
}

#[test]
fn test_climb_to_ceiling_reports_every_altitude() -> Result<()> {
    let codec = WordCodec::standard();
    let mut engine = Engine::new();
    engine.process(codec.encode_value(Sdi::ZERO, &Value::Power(Some(100.0)))?);

    let command = codec.encode_value(Sdi::ZERO, &altitude(40_000.0, FlightMode::Ground))?;
    for _ in 0..10_000 {
        let replies = decode_all(&codec, &engine.process(command))?;
        match replies[0] {
            Value::Altitude {
                feet: Some(feet),
                mode: Some(_),
            } => assert!(feet <= 40_000.0 + 1.25),
            other => panic!("unexpected altitude reply {:?}", other),
        }
        if engine.state().mode == FlightMode::Cruise {
            break;
        }
    }
    let state = engine.state();
    assert_eq!(state.mode, FlightMode::Cruise);
    assert_eq!(state.altitude, state.desired_altitude);
    assert_abs_diff_eq!(state.altitude, 40_000.0, epsilon = 1.25);
    Ok(())
}

#[test]
fn test_corrupted_word_yields_error_word() -> Result<()> {
    let codec = WordCodec::standard();
    let mut engine = Engine::new();
    let word = codec.encode_value(Sdi::new(1)?, &altitude(3_000.0, FlightMode::Cruise))?;

    for bit in 0..32 {
        let corrupted = word ^ (1 << bit);
        assert!(codec.decode(corrupted).is_err());
        assert_eq!(engine.process(corrupted), vec![ERROR_WORD]);
    }
    assert_eq!(engine.ticks(), 0);
    Ok(())
}

#[test]
fn test_altitude_out_of_range_encodes_sentinel() -> Result<()> {
    let codec = WordCodec::standard();
    for feet in [40_001.0, 55_555.5, 1.0e9, -40_000.01, -90_000.0] {
        let word = codec.encode_value(Sdi::new(3)?, &altitude(feet, FlightMode::Cruise))?;
        let raw = RawWord::from_raw(word);
        assert!(raw.is_valid());
        assert_eq!(raw.ssm(), Ssm::PLUS);
        assert_eq!(raw.data(), 0);
    }
    Ok(())
}

#[test]
fn test_round_trip_every_label() -> Result<()> {
    let codec = WordCodec::standard();
    let sdi = Sdi::new(2)?;

    let decoded = codec.decode(codec.encode_value(sdi, &altitude(-12_500.0, FlightMode::Changing))?)?;
    assert_eq!((decoded.label, decoded.sdi, decoded.ssm), (Label::ALTITUDE, sdi, Ssm::NORMAL));
    match decoded.value {
        Value::Altitude {
            feet: Some(feet),
            mode: Some(FlightMode::Changing),
        } => assert_abs_diff_eq!(feet, -12_500.0, epsilon = 1.25),
        other => panic!("unexpected {:?}", other),
    }

    let cases = [
        (Value::ClimbRate(Some(-640.5)), Ssm::MINUS, 0.1),
        (Value::Angle(Some(12.7)), Ssm::PLUS, 0.1),
        (Value::Power(Some(77.5)), Ssm::PLUS, 0.01),
    ];
    for (value, ssm, precision) in cases {
        let decoded = codec.decode(codec.encode_value(sdi, &value)?)?;
        assert_eq!(decoded.label, value.label());
        assert_eq!(decoded.ssm, ssm);
        match (value, decoded.value) {
            (Value::ClimbRate(Some(a)), Value::ClimbRate(Some(b)))
            | (Value::Angle(Some(a)), Value::Angle(Some(b)))
            | (Value::Power(Some(a)), Value::Power(Some(b))) => {
                assert_abs_diff_eq!(a, b, epsilon = precision)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    let decoded = codec.decode(codec.encode_value(sdi, &Value::Autopilot(Some(true)))?)?;
    assert_eq!(decoded.value, Value::Autopilot(Some(true)));
    Ok(())
}

#[test]
fn test_manual_mode_over_the_wire() -> Result<()> {
    let codec = WordCodec::standard();
    let mut engine = Engine::new();

    let manual = codec.encode_value(Sdi::ZERO, &Value::Autopilot(Some(false)))?;
    let replies = decode_all(&codec, &engine.process(manual))?;
    assert_eq!(replies, vec![Value::Autopilot(Some(false))]);

    let command = codec.encode_value(Sdi::ZERO, &altitude(2_000.0, FlightMode::Ground))?;
    for _ in 0..10_000 {
        engine.process(command);
        if engine.state().mode == FlightMode::Cruise {
            break;
        }
    }
    assert_eq!(engine.state().mode, FlightMode::Cruise);
    assert_abs_diff_eq!(engine.state().altitude, 2_000.0, epsilon = 1.0);
    Ok(())
}

#[test]
fn test_engines_are_independent_across_threads() -> Result<()> {
    let codec = Arc::new(WordCodec::standard());
    let handles: Vec<_> = [500.0, 1_500.0, 3_000.0]
        .into_iter()
        .map(|target| {
            let codec = Arc::clone(&codec);
            thread::spawn(move || -> Result<f64> {
                let mut engine = Engine::with_codec(Arc::clone(&codec), FlightConfig::default())?;
                engine.process(codec.encode_value(Sdi::ZERO, &Value::Power(Some(60.0)))?);
                let command = codec.encode_value(Sdi::ZERO, &altitude(target, FlightMode::Ground))?;
                for _ in 0..10_000 {
                    engine.process(command);
                    if engine.state().mode == FlightMode::Cruise {
                        break;
                    }
                }
                Ok(engine.state().altitude)
            })
        })
        .collect();

    let altitudes = handles
        .into_iter()
        .map(|handle| handle.join().expect("engine thread panicked"))
        .collect::<Result<Vec<_>>>()?;
    for (altitude, target) in altitudes.into_iter().zip([500.0, 1_500.0, 3_000.0]) {
        // targets travel through the altitude ladder, ~1.2 ft resolution
        assert_abs_diff_eq!(altitude, target, epsilon = 1.25);
    }
    Ok(())
}
