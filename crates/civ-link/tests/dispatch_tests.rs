//! Dispatcher tests against a simulated radio
//!
//! These exercise the full request path: parse, encode, frame, write,
//! skip the echo, correlate and decode, with `VirtualRadio` standing in
//! for the serial port.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use civ_link::{reply_text, Dispatcher, LinkConfig, LinkError};
use civ_protocol::{Argument, CivCommand, CivMode, DecodedValue, ModeReading, Reply, StatusCode};
use civ_sim::{VirtualRadio, VirtualRadioConfig};

/// Short windows so timeouts don't slow the suite down
fn fast_config() -> LinkConfig {
    LinkConfig {
        read_timeout_ms: 20,
        response_timeout_ms: 100,
        write_settle_ms: 0,
        ..Default::default()
    }
}

fn dispatcher(radio: VirtualRadio) -> Dispatcher<VirtualRadio> {
    Dispatcher::new(radio, fast_config())
}

// ============================================================================
// Reads
// ============================================================================

#[test]
fn test_read_frequency_sends_request_frame() {
    let d = dispatcher(VirtualRadio::new("test"));
    d.execute(CivCommand::Frequency, None).unwrap();

    let radio = d.into_transport();
    assert_eq!(
        radio.received_frames(),
        &[vec![0xFE, 0xFE, 0x94, 0xCE, 0x25, 0x00, 0xFD]]
    );
}

#[test]
fn test_read_frequency_decodes_bcd() {
    let mut radio = VirtualRadio::new("test");
    radio.set_frequency(140_013_000);
    let d = dispatcher(radio);

    let reply = d.execute_line("FREQUENCY").unwrap();
    assert_eq!(reply, Reply::Value(DecodedValue::Hz(140_013_000)));
    assert_eq!(reply.to_string(), "140013000");
}

#[test]
fn test_echo_is_not_mistaken_for_reply() {
    // With echo on, the first frame back is our own request
    let d = dispatcher(VirtualRadio::new("test"));
    let reply = d.execute(CivCommand::Mode, None).unwrap();
    assert_eq!(reply, Reply::Value(DecodedValue::Mode(ModeReading::Known(CivMode::Usb))));
}

#[test]
fn test_read_without_echo() {
    let mut radio = VirtualRadio::new("test");
    radio.set_echo(false);
    let d = dispatcher(radio);

    assert_eq!(d.execute_line("FILTER_WIDTH").unwrap().to_string(), "12");
}

#[test]
fn test_read_unmapped_mode() {
    let mut radio = VirtualRadio::new("test");
    radio.set_mode_code(0x17);
    let d = dispatcher(radio);

    assert_eq!(d.execute_line("MODE").unwrap().to_string(), "UNKNOWN(23)");
}

#[test]
fn test_read_power_both_encodings() {
    let d = dispatcher(VirtualRadio::new("test"));
    assert_eq!(d.execute_line("POWER_OUTPUT").unwrap().to_string(), "100");

    let radio = VirtualRadio::from_config(VirtualRadioConfig {
        power_encoding: civ_protocol::PowerEncoding::BigEndian,
        initial_power_raw: 128,
        ..Default::default()
    });
    let d = Dispatcher::new(
        radio,
        LinkConfig {
            power_encoding: civ_protocol::PowerEncoding::BigEndian,
            ..fast_config()
        },
    );
    assert_eq!(d.execute_line("POWER_OUTPUT").unwrap().to_string(), "50");
}

// ============================================================================
// Writes
// ============================================================================

#[test]
fn test_write_returns_ok_status() {
    let d = dispatcher(VirtualRadio::new("test"));

    let reply = d.execute_line("FREQUENCY 7074000").unwrap();
    assert_eq!(reply, Reply::Status(StatusCode(0xFB)));
    assert_eq!(reply.to_string(), "FB");
    assert_eq!(d.into_transport().frequency_hz(), 7_074_000);
}

#[test]
fn test_write_then_read_back() {
    let d = dispatcher(VirtualRadio::new("test"));

    d.execute(CivCommand::Mode, Some(&Argument::Label("CW-R".into())))
        .unwrap();
    d.execute(CivCommand::PowerOutput, Some(&Argument::Number(50)))
        .unwrap();
    d.execute(CivCommand::Qsk, Some(&Argument::Number(2))).unwrap();

    assert_eq!(d.execute_line("MODE").unwrap().to_string(), "CW-R");
    assert_eq!(d.execute_line("POWER_OUTPUT").unwrap().to_string(), "50");
    assert_eq!(d.execute_line("QSK").unwrap().to_string(), "2");

    let radio = d.into_transport();
    assert_eq!(radio.power_raw(), 128);
}

#[test]
fn test_rejected_write_returns_ng() {
    let d = dispatcher(VirtualRadio::new("test"));

    // Encodable, but outside what the radio accepts
    let reply = d.execute(CivCommand::Qsk, Some(&Argument::Number(7))).unwrap();
    assert_eq!(reply, Reply::Status(StatusCode(0xFA)));
    assert_eq!(reply.to_string(), "FA");
}

#[test]
fn test_tune_always_sends_activate() {
    let d = dispatcher(VirtualRadio::new("test"));

    assert_eq!(d.execute_line("TUNE 0").unwrap().to_string(), "FB");
    assert_eq!(d.execute_line("TUNE").unwrap().to_string(), "FB");

    let radio = d.into_transport();
    assert_eq!(radio.tune_count(), 2);
    for frame in radio.received_frames() {
        assert_eq!(&frame[4..7], &[0x1C, 0x01, 0x02]);
    }
}

#[test]
fn test_encode_error_sends_nothing() {
    let d = dispatcher(VirtualRadio::new("test"));

    let err = d.execute_line("FILTER_WIDTH 32").unwrap_err();
    assert!(matches!(err, LinkError::Encode(_)));
    let err = d.execute_line("MODE PSK").unwrap_err();
    assert!(matches!(err, LinkError::Encode(_)));
    let err = d.execute_line("FREQUENCY abc").unwrap_err();
    assert!(matches!(err, LinkError::Encode(_)));

    assert!(d.into_transport().received_frames().is_empty());
}

// ============================================================================
// Correlation
// ============================================================================

#[test]
fn test_silent_radio_times_out() {
    let mut radio = VirtualRadio::new("test");
    radio.set_silent(true);
    let d = dispatcher(radio);

    let start = Instant::now();
    let err = d.execute_line("FREQUENCY").unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, LinkError::Timeout(100)));
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(1));
}

#[test]
fn test_foreign_and_malformed_frames_skipped() {
    let mut radio = VirtualRadio::new("test");
    radio.set_frequency(3_573_000);
    radio.set_bus_noise(&[
        // Another controller talking to another radio
        0xFE, 0xFE, 0xA4, 0xE0, 0x25, 0x00, 0xFD,
        // Line noise ending in a terminator
        0x13, 0x37, 0xFD,
        // Truncated frame
        0xFE, 0xFE, 0xCE, 0xFD,
    ]);
    let d = dispatcher(radio);

    assert_eq!(d.execute_line("FREQUENCY").unwrap().to_string(), "3573000");
}

#[test]
fn test_stale_input_discarded_before_request() {
    let mut radio = VirtualRadio::new("test");
    radio.set_echo(false);
    // A late reply from some earlier exchange
    radio.inject(&[0xFE, 0xFE, 0xCE, 0x94, 0x25, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0xFD]);
    let d = dispatcher(radio);

    assert_eq!(d.execute_line("FREQUENCY").unwrap().to_string(), "14250000");
}

#[test]
fn test_custom_addresses() {
    let radio = VirtualRadio::from_config(VirtualRadioConfig {
        civ_address: 0xA4,
        ..Default::default()
    });
    let d = Dispatcher::new(
        radio,
        LinkConfig {
            radio_address: 0xA4,
            controller_address: 0xE0,
            ..fast_config()
        },
    );

    assert_eq!(d.execute_line("FREQUENCY").unwrap().to_string(), "14250000");
    assert_eq!(
        d.into_transport().received_frames()[0][..4],
        [0xFE, 0xFE, 0xA4, 0xE0]
    );
}

#[test]
fn test_concurrent_requests_serialized() {
    let d = Arc::new(dispatcher(VirtualRadio::new("test")));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let d = Arc::clone(&d);
            thread::spawn(move || {
                for _ in 0..10 {
                    let hz = 7_000_000 + i * 1_000;
                    let line = format!("FREQUENCY {}", hz);
                    assert_eq!(d.execute_line(&line).unwrap().to_string(), "FB");
                    let reply = d.execute_line("MODE").unwrap();
                    assert!(matches!(reply, Reply::Value(DecodedValue::Mode(_))));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let d = Arc::try_unwrap(d).ok().unwrap();
    // 4 threads x 10 iterations x 2 requests
    assert_eq!(d.into_transport().received_frames().len(), 80);
}

// ============================================================================
// Reply text
// ============================================================================

#[test]
fn test_reply_text() {
    let mut radio = VirtualRadio::new("test");
    radio.set_silent(true);
    let d = dispatcher(radio);

    assert_eq!(reply_text(&d.execute_line("FREQUENCY 1 2")), "Invalid");
    assert_eq!(reply_text(&d.execute_line("")), "Invalid");
    assert_eq!(reply_text(&d.execute_line("VOLUME")), "Error");
    assert_eq!(reply_text(&d.execute_line("MODE PSK")), "Error");
    assert_eq!(reply_text(&d.execute_line("FREQUENCY")), "Error");
}
