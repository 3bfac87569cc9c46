//! Host-level tests for IR decoding and remote button mapping.

use window_light::Config;
use window_light::hardware::{EdgeEvent, Level};
use window_light::ir::{IrDecoder, IrFrame, IrFrameQueue};
use window_light::ir_mapping::{RemoteButton, RemoteMapper};
use window_light::mailbox::Mailbox;
use window_light::stop_flag::StopFlag;

const POWER: u64 = 0x1_57e3_e817;
const MARK_US: u64 = 560;
const ZERO_SPACE_US: u64 = 560;
const ONE_SPACE_US: u64 = 1_690;

/// Edges for the top `bits` bits of a 34-bit `code`, after a leading silence.
fn edges(code: u64, bits: u32) -> Vec<EdgeEvent> {
    let mut t = 100_000;
    let mut out = vec![EdgeEvent {
        level: Level::High,
        timestamp_us: t,
    }];
    for bit in (34 - bits..34).rev() {
        t += MARK_US;
        out.push(EdgeEvent {
            level: Level::High,
            timestamp_us: t,
        });
        t += if (code >> bit) & 1 == 1 {
            ONE_SPACE_US
        } else {
            ZERO_SPACE_US
        };
        out.push(EdgeEvent {
            level: Level::Low,
            timestamp_us: t,
        });
    }
    out
}

fn drain(queue: &IrFrameQueue) -> Vec<IrFrame> {
    core::iter::from_fn(|| queue.try_receive().ok()).collect()
}

#[test]
fn full_frame_decodes_to_power() {
    static FRAMES: IrFrameQueue = IrDecoder::new_static();
    let mut decoder = IrDecoder::new(&Config::default(), &FRAMES);
    for edge in edges(POWER, 34) {
        decoder.on_edge(edge);
    }

    let codes: Vec<u64> = drain(&FRAMES).iter().map(|frame| frame.code).collect();
    // The leading silence flushes the start-up sentinel.
    assert_eq!(codes, [1, POWER]);
    assert_eq!(RemoteButton::from_code(POWER), Some(RemoteButton::Power));
}

#[test]
fn truncated_frame_matches_nothing() {
    static FRAMES: IrFrameQueue = IrDecoder::new_static();
    static IR_FRAMES: IrFrameQueue = IrDecoder::new_static();
    static LED_MAILBOX: Mailbox = Mailbox::new();
    static STOP: StopFlag = StopFlag::new();
    let mut decoder = IrDecoder::new(&Config::default(), &FRAMES);
    let sequence = edges(POWER, 20);
    let last = sequence.last().map_or(0, |edge| edge.timestamp_us);
    for edge in sequence {
        decoder.on_edge(edge);
    }
    decoder.on_edge(EdgeEvent {
        level: Level::High,
        timestamp_us: last + 50_000,
    });

    let frames = drain(&FRAMES);
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|frame| RemoteButton::from_code(frame.code).is_none()));

    let mut remote = RemoteMapper::new(&Config::default(), &IR_FRAMES, &LED_MAILBOX, &STOP);
    for frame in frames {
        remote.handle_frame(frame);
    }
    assert!(LED_MAILBOX.is_empty());
}

#[test]
fn consecutive_frames_restart_from_empty() {
    static FRAMES: IrFrameQueue = IrDecoder::new_static();
    let mut decoder = IrDecoder::new(&Config::default(), &FRAMES);
    let first = edges(POWER, 34);
    let offset = first.last().map_or(0, |edge| edge.timestamp_us);
    for edge in first {
        decoder.on_edge(edge);
    }
    for edge in edges(POWER, 34) {
        decoder.on_edge(EdgeEvent {
            level: edge.level,
            timestamp_us: edge.timestamp_us + offset,
        });
    }

    let codes: Vec<u64> = drain(&FRAMES).iter().map(|frame| frame.code).collect();
    // The silence before the second frame arrives on an empty accumulator.
    assert_eq!(codes, [1, POWER, 0, POWER]);
}

#[test]
fn held_key_echo_is_suppressed_within_gap() {
    static IR_FRAMES: IrFrameQueue = IrDecoder::new_static();
    static LED_MAILBOX: Mailbox = Mailbox::new();
    static STOP: StopFlag = StopFlag::new();
    let mut remote = RemoteMapper::new(&Config::default(), &IR_FRAMES, &LED_MAILBOX, &STOP);

    remote.handle_frame(IrFrame {
        code: POWER,
        timestamp_us: 1_000_000,
    });
    remote.handle_frame(IrFrame {
        code: POWER,
        timestamp_us: 1_400_000,
    });
    assert_eq!(LED_MAILBOX.len(), 1);
    let message = LED_MAILBOX.try_receive().expect("first press forwarded");
    assert_eq!(message.payload.as_str(), "color 0 0 0 0");
}

#[test]
fn repeated_key_outside_gap_is_a_new_press() {
    static IR_FRAMES: IrFrameQueue = IrDecoder::new_static();
    static LED_MAILBOX: Mailbox = Mailbox::new();
    static STOP: StopFlag = StopFlag::new();
    let mut remote = RemoteMapper::new(&Config::default(), &IR_FRAMES, &LED_MAILBOX, &STOP);

    remote.handle_frame(IrFrame {
        code: POWER,
        timestamp_us: 1_000_000,
    });
    remote.handle_frame(IrFrame {
        code: POWER,
        timestamp_us: 1_600_000,
    });
    assert_eq!(LED_MAILBOX.len(), 2);
}

#[test]
fn every_button_maps_to_a_command() {
    for (code, button) in window_light::ir_mapping::BUTTON_CODES {
        assert_eq!(RemoteButton::from_code(code), Some(button));
        assert!(!button.command().is_empty());
    }
    assert_eq!(RemoteButton::Up.command(), "modify increase brightness");
    assert_eq!(RemoteButton::Hulu.command(), "read 2");
}
