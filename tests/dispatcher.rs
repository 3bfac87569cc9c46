//! Host-level tests for command dispatch and request/reply between actors.

use std::cell::Cell;

use embassy_futures::block_on;
use embassy_futures::join::join;
use embassy_time::Duration;
use time::PrimitiveDateTime;
use time::macros::datetime;
use window_light::Config;
use window_light::Error;
use window_light::Result;
use window_light::control_plane::Mailboxes;
use window_light::dispatcher::{Dispatch, Dispatcher};
use window_light::hardware::{
    Climate, ClimateLog, ClimateRecord, ClimateSensor, PixelStrip, Supervisor, WallClock,
};
use window_light::led_engine::LedEngine;
use window_light::led_strip::{OFF, Rgbw};
use window_light::mailbox::{Mailbox, Message, Sender};
use window_light::sensor::ClimateMonitor;
use window_light::stop_flag::StopFlag;

#[derive(Default)]
struct FakeSupervisor {
    restarts: usize,
    reboots: usize,
}

impl Supervisor for FakeSupervisor {
    fn restart(&mut self) -> Result<()> {
        self.restarts += 1;
        Ok(())
    }

    fn reboot(&mut self) -> Result<()> {
        self.reboots += 1;
        Err(Error::Supervisor)
    }
}

struct Strip(Vec<Rgbw>);

impl PixelStrip for Strip {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn set_pixel(&mut self, index: usize, color: Rgbw) -> Result<()> {
        *self.0.get_mut(index).ok_or(Error::IndexOutOfBounds)? = color;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

struct Thermometer(Climate);

impl ClimateSensor for Thermometer {
    fn read(&mut self) -> Result<Climate> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct RecordingLog(Vec<ClimateRecord>);

impl ClimateLog for RecordingLog {
    fn append(&mut self, record: &ClimateRecord) -> Result<()> {
        self.0.push(*record);
        Ok(())
    }
}

struct FixedClock(Cell<PrimitiveDateTime>);

impl WallClock for FixedClock {
    fn now(&self) -> PrimitiveDateTime {
        self.0.get()
    }
}

/// Answer one request on `inbox` by echoing its payload.
async fn echo_once(inbox: &Mailbox, replies: &Mailbox) {
    let request = inbox.receive().await;
    replies.send(Message::new(Sender::LedEngine, request.seq, &request.payload));
}

fn reply_text(dispatch: &Dispatch) -> &str {
    match dispatch {
        Dispatch::Reply(reply) => reply.as_str(),
        Dispatch::Close => "<close>",
    }
}

fn quick_config() -> Config {
    Config {
        client_idle_timeout: Duration::from_millis(200),
        sensor_poll: Duration::from_millis(10),
        ..Config::default()
    }
}

#[test]
fn rgbw_macro_expands_before_forwarding() {
    static MAILBOXES: Mailboxes = Mailboxes::new_static();
    static STOP: StopFlag = StopFlag::new();
    let mut supervisor = FakeSupervisor::default();
    let mut dispatcher = Dispatcher::new(&quick_config(), MAILBOXES.routes(), &mut supervisor, &STOP);

    let (dispatch, ()) = block_on(join(
        dispatcher.handle("RG 200\r"),
        echo_once(&MAILBOXES.led, &MAILBOXES.replies),
    ));
    assert_eq!(reply_text(&dispatch), "color 200 200 0 0");

    let (dispatch, ()) = block_on(join(
        dispatcher.handle("off"),
        echo_once(&MAILBOXES.led, &MAILBOXES.replies),
    ));
    assert_eq!(reply_text(&dispatch), "color 0 0 0 0");

    let dispatch = block_on(dispatcher.handle("w"));
    assert_eq!(
        reply_text(&dispatch),
        "Couldn't expand macro, encountered error: Macro needs an intensity from 0 to 255"
    );
}

#[test]
fn max_macro_turns_every_channel_up() {
    static MAILBOXES: Mailboxes = Mailboxes::new_static();
    static STOP: StopFlag = StopFlag::new();
    let mut supervisor = FakeSupervisor::default();
    let mut dispatcher = Dispatcher::new(&quick_config(), MAILBOXES.routes(), &mut supervisor, &STOP);

    for line in ["max", "M"] {
        let (dispatch, ()) = block_on(join(
            dispatcher.handle(line),
            echo_once(&MAILBOXES.led, &MAILBOXES.replies),
        ));
        assert_eq!(reply_text(&dispatch), "color 255 255 255 255");
    }
}

#[test]
fn empty_line_closes_connection() {
    static MAILBOXES: Mailboxes = Mailboxes::new_static();
    static STOP: StopFlag = StopFlag::new();
    let mut supervisor = FakeSupervisor::default();
    let mut dispatcher = Dispatcher::new(&quick_config(), MAILBOXES.routes(), &mut supervisor, &STOP);

    assert_eq!(block_on(dispatcher.handle("")), Dispatch::Close);
    assert_eq!(block_on(dispatcher.handle("\r")), Dispatch::Close);
    assert!(MAILBOXES.led.is_empty());
}

#[test]
fn help_is_answered_locally() {
    static MAILBOXES: Mailboxes = Mailboxes::new_static();
    static STOP: StopFlag = StopFlag::new();
    let mut supervisor = FakeSupervisor::default();
    let mut dispatcher = Dispatcher::new(&quick_config(), MAILBOXES.routes(), &mut supervisor, &STOP);

    let dispatch = block_on(dispatcher.handle("Help"));
    let text = reply_text(&dispatch);
    assert!(text.starts_with("Name"));
    assert!(text.contains("snooze          on                              snooze next alarm\n"));
    assert!(MAILBOXES.led.is_empty());
}

#[test]
fn silent_engine_times_out_and_late_reply_is_dropped() {
    static MAILBOXES: Mailboxes = Mailboxes::new_static();
    static STOP: StopFlag = StopFlag::new();
    let mut supervisor = FakeSupervisor::default();
    let config = Config {
        client_idle_timeout: Duration::from_millis(40),
        ..Config::default()
    };
    let mut dispatcher = Dispatcher::new(&config, MAILBOXES.routes(), &mut supervisor, &STOP);

    let dispatch = block_on(dispatcher.handle("rainbow"));
    assert_eq!(
        reply_text(&dispatch),
        "Timed out waiting for the LED strip to respond"
    );

    // The engine finally answers the first request, then the second.
    let (dispatch, ()) = block_on(join(dispatcher.handle("strobe"), async {
        let first = MAILBOXES.led.receive().await;
        MAILBOXES
            .replies
            .send(Message::new(Sender::LedEngine, first.seq, "Set mode to rainbow"));
        echo_once(&MAILBOXES.led, &MAILBOXES.replies).await;
    }));
    assert_eq!(reply_text(&dispatch), "strobe");
}

#[test]
fn real_engine_answers_through_the_reply_mailbox() {
    static MAILBOXES: Mailboxes = Mailboxes::new_static();
    static STOP: StopFlag = StopFlag::new();
    let config = quick_config();
    let mut supervisor = FakeSupervisor::default();
    let mut strip = Strip(vec![OFF; 30]);
    let mut engine = LedEngine::new(&config, &mut strip, &MAILBOXES.led, &MAILBOXES.replies, &STOP);
    let mut dispatcher = Dispatcher::new(&config, MAILBOXES.routes(), &mut supervisor, &STOP);

    let (result, dispatch) = block_on(join(engine.run(), async {
        let dispatch = dispatcher.handle("read").await;
        STOP.raise();
        dispatch
    }));
    assert_eq!(result, Ok(()));
    assert_eq!(reply_text(&dispatch), "Set mode to read");
}

#[test]
fn temperature_request_reads_the_sensor() {
    static MAILBOXES: Mailboxes = Mailboxes::new_static();
    static STOP: StopFlag = StopFlag::new();
    let config = quick_config();
    let mut supervisor = FakeSupervisor::default();
    let mut sensor = Thermometer(Climate {
        celsius: 20.0,
        relative_humidity: 45.0,
    });
    let mut log = RecordingLog::default();
    let clock = FixedClock(Cell::new(datetime!(2024-03-04 12:00)));
    let mut monitor = ClimateMonitor::new(
        &config,
        &mut sensor,
        &mut log,
        &clock,
        &MAILBOXES.sensor,
        &MAILBOXES.replies,
        &STOP,
    );
    let mut dispatcher = Dispatcher::new(&config, MAILBOXES.routes(), &mut supervisor, &STOP);

    let (result, dispatch) = block_on(join(monitor.run(), async {
        let dispatch = dispatcher.handle("th").await;
        STOP.raise();
        dispatch
    }));
    assert_eq!(result, Ok(()));
    assert_eq!(reply_text(&dispatch), "68.0F, 45.0%");
    drop(monitor);
    // One periodic sample at start-up plus the requested one.
    assert_eq!(log.0.len(), 2);
    assert!(log.0.iter().all(|record| record.at == datetime!(2024-03-04 12:00)));
}

#[test]
fn restart_and_reboot_stop_the_control_plane() {
    static MAILBOXES: Mailboxes = Mailboxes::new_static();
    static STOP: StopFlag = StopFlag::new();
    let mut supervisor = FakeSupervisor::default();
    let mut dispatcher = Dispatcher::new(&quick_config(), MAILBOXES.routes(), &mut supervisor, &STOP);

    let dispatch = block_on(dispatcher.handle("restart"));
    assert_eq!(reply_text(&dispatch), "Restarting service");
    assert!(STOP.is_raised());

    let dispatch = block_on(dispatcher.handle("reboot"));
    assert_eq!(
        reply_text(&dispatch),
        "Rebooting failed, encountered error: Supervisor request failed"
    );
    drop(dispatcher);
    assert_eq!((supervisor.restarts, supervisor.reboots), (1, 1));
}
