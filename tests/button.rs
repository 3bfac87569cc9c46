//! Host-level tests for the off button.

use embassy_futures::block_on;
use embassy_futures::join::join;
use embassy_time::{Duration, Timer};
use window_light::Config;
use window_light::button::{Debouncer, OFF_COMMAND, OffButton, PressSignal};
use window_light::hardware::{EdgeEvent, Level};
use window_light::mailbox::{Mailbox, Sender};
use window_light::stop_flag::StopFlag;

fn press(debouncer: &mut Debouncer<'_>, start_us: u64, high_us: u64) {
    debouncer.on_edge(EdgeEvent {
        level: Level::High,
        timestamp_us: start_us,
    });
    debouncer.on_edge(EdgeEvent {
        level: Level::Low,
        timestamp_us: start_us + high_us,
    });
}

#[test]
fn default_threshold_filters_short_pulses() {
    static PRESSED: PressSignal = Debouncer::new_static();
    let mut debouncer = Debouncer::new(&Config::default(), &PRESSED);

    press(&mut debouncer, 1_000, 10_000);
    assert!(!PRESSED.signaled());
    press(&mut debouncer, 100_000, 30_000);
    assert!(PRESSED.signaled());
}

#[test]
fn configured_threshold_accepts_ten_milliseconds() {
    static PRESSED: PressSignal = Debouncer::new_static();
    let config = Config {
        debounce_us: 7_500,
        ..Config::default()
    };
    let mut debouncer = Debouncer::new(&config, &PRESSED);

    press(&mut debouncer, 1_000, 5_000);
    assert!(!PRESSED.signaled());
    press(&mut debouncer, 100_000, 10_000);
    assert!(PRESSED.signaled());
}

#[test]
fn falling_edge_without_rising_edge_is_ignored() {
    static PRESSED: PressSignal = Debouncer::new_static();
    let mut debouncer = Debouncer::new(&Config::default(), &PRESSED);

    debouncer.on_edge(EdgeEvent {
        level: Level::Low,
        timestamp_us: 1_000_000,
    });
    assert!(!PRESSED.signaled());
}

#[test]
fn accepted_press_sends_one_off_command() {
    static PRESSED: PressSignal = Debouncer::new_static();
    static LED_MAILBOX: Mailbox = Mailbox::new();
    static STOP: StopFlag = StopFlag::new();
    let config = Config {
        button_poll: Duration::from_millis(10),
        ..Config::default()
    };
    let mut debouncer = Debouncer::new(&config, &PRESSED);
    let mut button = OffButton::new(&config, &PRESSED, &LED_MAILBOX, &STOP);

    let (result, ()) = block_on(join(button.run(), async {
        press(&mut debouncer, 1_000, 50_000);
        Timer::after_millis(50).await;
        STOP.raise();
    }));

    assert_eq!(result, Ok(()));
    let message = LED_MAILBOX.try_receive().expect("off command sent");
    assert_eq!(message.sender, Sender::Button);
    assert_eq!(message.payload.as_str(), OFF_COMMAND);
    assert!(LED_MAILBOX.is_empty());
    assert!(!PRESSED.signaled());
}
