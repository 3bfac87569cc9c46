//! Host-level tests for alarm scheduling, alarm commands, and the persisted table.

use std::cell::Cell;

use time::macros::datetime;
use time::{PrimitiveDateTime, Weekday};
use window_light::Config;
use window_light::Error;
use window_light::Result;
use window_light::alarm_clock::{AlarmAction, AlarmClock, AlarmScheduler};
use window_light::alarm_table::{self, AlarmTable, AlarmTime, WEEK};
use window_light::hardware::{BlobStore, WallClock};
use window_light::mailbox::Mailbox;
use window_light::stop_flag::StopFlag;

/// In-memory blob store; an empty store reports a missing document.
#[derive(Default)]
struct MemoryStore {
    bytes: Vec<u8>,
    saves: usize,
}

impl BlobStore for MemoryStore {
    fn load(&mut self, buffer: &mut [u8]) -> Result<usize> {
        if self.bytes.is_empty() {
            return Err(Error::Store);
        }
        let target = buffer
            .get_mut(..self.bytes.len())
            .ok_or(Error::CapacityExceeded)?;
        target.copy_from_slice(&self.bytes);
        Ok(self.bytes.len())
    }

    fn save(&mut self, bytes: &[u8]) -> Result<()> {
        self.bytes = bytes.to_vec();
        self.saves += 1;
        Ok(())
    }
}

struct FixedClock(Cell<PrimitiveDateTime>);

impl WallClock for FixedClock {
    fn now(&self) -> PrimitiveDateTime {
        self.0.get()
    }
}

fn time(hour: u8, minute: u8) -> AlarmTime {
    AlarmTime::new(hour, minute).expect("valid time")
}

/// Monday 07:30, every other day at the default.
fn scheduler() -> AlarmScheduler {
    let mut table = AlarmTable::default();
    table.set(Weekday::Monday, time(7, 30));
    AlarmScheduler::new(table, 1_200)
}

#[test]
fn window_is_centered_on_alarm_time() {
    let mut scheduler = scheduler();
    assert_eq!(scheduler.poll(datetime!(2024-03-04 0:00)), None);
    assert_eq!(
        scheduler.window(),
        Some((datetime!(2024-03-04 7:20), datetime!(2024-03-04 7:40)))
    );
    assert_eq!(scheduler.poll(datetime!(2024-03-04 7:19:59)), None);
    assert_eq!(
        scheduler.poll(datetime!(2024-03-04 7:20)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
}

#[test]
fn rings_at_most_once_per_day() {
    let mut scheduler = scheduler();
    assert_eq!(
        scheduler.poll(datetime!(2024-03-04 7:25)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
    assert_eq!(scheduler.poll(datetime!(2024-03-04 7:26)), None);
    assert!(scheduler.is_ringing());
    assert_eq!(
        scheduler.poll(datetime!(2024-03-04 7:40)),
        Some(AlarmAction::Stop)
    );
    assert!(!scheduler.is_ringing());
    assert_eq!(scheduler.poll(datetime!(2024-03-04 7:41)), None);

    // Tuesday uses the default 10:00.
    assert_eq!(scheduler.poll(datetime!(2024-03-05 9:49)), None);
    assert_eq!(
        scheduler.poll(datetime!(2024-03-05 9:55)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
}

#[test]
fn same_weekday_next_week_rings_again() {
    let mut scheduler = scheduler();
    assert!(scheduler.poll(datetime!(2024-03-04 7:30)).is_some());
    assert_eq!(
        scheduler.poll(datetime!(2024-03-11 7:30)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
}

#[test]
fn snooze_skips_one_alarm_then_clears() {
    let mut scheduler = scheduler();
    scheduler.set_snooze(true);
    assert!(scheduler.snooze_pending());

    assert_eq!(scheduler.poll(datetime!(2024-03-04 7:25)), None);
    assert!(!scheduler.is_ringing());
    assert!(!scheduler.snooze_pending());
    assert_eq!(scheduler.poll(datetime!(2024-03-04 7:45)), None);

    assert_eq!(
        scheduler.poll(datetime!(2024-03-05 9:55)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
}

#[test]
fn snooze_off_cancels_pending_snooze() {
    let mut scheduler = scheduler();
    scheduler.set_snooze(true);
    scheduler.set_snooze(false);
    assert_eq!(
        scheduler.poll(datetime!(2024-03-04 7:25)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
}

#[test]
fn changing_today_lets_it_ring_again() {
    let mut scheduler = scheduler();
    assert!(scheduler.poll(datetime!(2024-03-04 7:25)).is_some());
    assert_eq!(
        scheduler.poll(datetime!(2024-03-04 7:40)),
        Some(AlarmAction::Stop)
    );

    scheduler.set_alarm(Weekday::Monday, time(8, 0), datetime!(2024-03-04 7:41));
    assert_eq!(
        scheduler.window(),
        Some((datetime!(2024-03-04 7:50), datetime!(2024-03-04 8:10)))
    );
    assert_eq!(
        scheduler.poll(datetime!(2024-03-04 7:55)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
}

#[test]
fn changing_another_day_keeps_today() {
    let mut scheduler = scheduler();
    assert!(scheduler.poll(datetime!(2024-03-04 7:25)).is_some());
    scheduler.set_alarm(Weekday::Friday, time(7, 45), datetime!(2024-03-04 7:26));
    assert_eq!(scheduler.poll(datetime!(2024-03-04 7:35)), None);
    assert_eq!(scheduler.table().get(Weekday::Friday), time(7, 45));
}

#[test]
fn late_alarm_stops_after_midnight() {
    let mut table = AlarmTable::default();
    table.set(Weekday::Monday, time(23, 55));
    let mut scheduler = AlarmScheduler::new(table, 1_200);

    assert_eq!(
        scheduler.poll(datetime!(2024-03-04 23:46)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
    assert_eq!(
        scheduler.window(),
        Some((datetime!(2024-03-04 23:45), datetime!(2024-03-05 0:05)))
    );
    assert_eq!(scheduler.poll(datetime!(2024-03-05 0:04)), None);
    assert!(scheduler.is_ringing());
    assert_eq!(
        scheduler.poll(datetime!(2024-03-05 0:05)),
        Some(AlarmAction::Stop)
    );
    assert!(!scheduler.is_ringing());
    assert_eq!(scheduler.poll(datetime!(2024-03-05 0:06)), None);

    // Tuesday still rings at its own time.
    assert_eq!(
        scheduler.poll(datetime!(2024-03-05 9:50)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
}

#[test]
fn early_alarm_rings_before_midnight() {
    let mut table = AlarmTable::default();
    table.set(Weekday::Tuesday, time(0, 5));
    let mut scheduler = AlarmScheduler::new(table, 1_200);

    assert_eq!(scheduler.poll(datetime!(2024-03-04 23:54)), None);
    assert_eq!(
        scheduler.window(),
        Some((datetime!(2024-03-04 23:55), datetime!(2024-03-05 0:15)))
    );
    assert_eq!(
        scheduler.poll(datetime!(2024-03-04 23:55)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
    assert_eq!(scheduler.poll(datetime!(2024-03-05 0:01)), None);
    assert!(scheduler.is_ringing());
    assert_eq!(
        scheduler.poll(datetime!(2024-03-05 0:15)),
        Some(AlarmAction::Stop)
    );
}

#[test]
fn snooze_skips_an_alarm_across_midnight() {
    let mut table = AlarmTable::default();
    table.set(Weekday::Tuesday, time(0, 5));
    let mut scheduler = AlarmScheduler::new(table, 1_200);
    scheduler.set_snooze(true);

    assert_eq!(scheduler.poll(datetime!(2024-03-04 23:56)), None);
    assert!(!scheduler.is_ringing());
    assert_eq!(scheduler.poll(datetime!(2024-03-05 0:10)), None);
    assert_eq!(scheduler.poll(datetime!(2024-03-05 0:20)), None);
    assert!(!scheduler.snooze_pending());

    // Wednesday uses the default 10:00 and rings.
    assert_eq!(
        scheduler.poll(datetime!(2024-03-06 9:55)),
        Some(AlarmAction::Ring { seconds: 1_200 })
    );
}

#[test]
fn set_alarm_persists_for_every_day() {
    static MAILBOX: Mailbox = Mailbox::new();
    static LED_MAILBOX: Mailbox = Mailbox::new();
    static REPLIES: Mailbox = Mailbox::new();
    static STOP: StopFlag = StopFlag::new();
    let clock = FixedClock(Cell::new(datetime!(2024-03-04 12:00)));
    let mut store = MemoryStore::default();
    let tokens = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

    let mut alarm_clock = AlarmClock::new(
        &Config::default(),
        &mut store,
        &clock,
        &MAILBOX,
        &LED_MAILBOX,
        &REPLIES,
        &STOP,
    );
    for (minute, token) in (0u8..).zip(tokens) {
        let reply = alarm_clock.handle(&format!("alarm {token} 6:{minute:02}"));
        assert!(reply.starts_with("Set alarm on "), "{reply}");
    }
    drop(alarm_clock);

    let table = alarm_table::load(&mut store)
        .expect("store readable")
        .expect("table stored");
    for (minute, day) in (0u8..).zip(WEEK) {
        assert_eq!(table.get(day), time(6, minute));
    }
}

#[test]
fn alarm_commands_reply_like_the_listing() {
    static MAILBOX: Mailbox = Mailbox::new();
    static LED_MAILBOX: Mailbox = Mailbox::new();
    static REPLIES: Mailbox = Mailbox::new();
    static STOP: StopFlag = StopFlag::new();
    let clock = FixedClock(Cell::new(datetime!(2024-03-04 12:00)));
    let mut store = MemoryStore::default();
    let mut alarm_clock = AlarmClock::new(
        &Config::default(),
        &mut store,
        &clock,
        &MAILBOX,
        &LED_MAILBOX,
        &REPLIES,
        &STOP,
    );

    assert_eq!(
        alarm_clock.handle("alarm weekend 09:15").as_str(),
        "Set alarm on Saturday to 09:15\nSet alarm on Sunday to 09:15"
    );
    assert_eq!(
        alarm_clock.handle("alarm").as_str(),
        "Alarm armed\nMonday: 10:00\nTuesday: 10:00\nWednesday: 10:00\nThursday: 10:00\n\
         Friday: 10:00\nSaturday: 09:15\nSunday: 09:15"
    );
    assert_eq!(
        alarm_clock.handle("alarm someday 09:15").as_str(),
        "Didn't set alarm, encountered error: First argument was not a 3-letter day, \"weekday\" or \"weekend\""
    );
    assert_eq!(
        alarm_clock.handle("alarm mon 25:00").as_str(),
        "Didn't set alarm, encountered error: Invalid time, use HH:MM with hour 0-23 and minute 0-59"
    );
    assert_eq!(alarm_clock.handle("snooze").as_str(), "Set to snooze next alarm");
    assert!(alarm_clock.handle("alarm").starts_with("Alarm set to snooze\n"));
    assert_eq!(alarm_clock.handle("snooze off").as_str(), "Not going to snooze next alarm");
    assert_eq!(
        alarm_clock.handle("snooze maybe").as_str(),
        "Didn't set snooze, encountered error"
    );
    assert_eq!(
        alarm_clock.handle("nap").as_str(),
        "Not a recognized alarm clock command"
    );
}

#[test]
fn tick_sends_ring_and_stop_commands() {
    static MAILBOX: Mailbox = Mailbox::new();
    static LED_MAILBOX: Mailbox = Mailbox::new();
    static REPLIES: Mailbox = Mailbox::new();
    static STOP: StopFlag = StopFlag::new();
    let clock = FixedClock(Cell::new(datetime!(2024-03-04 9:55)));
    let mut store = MemoryStore::default();
    let mut alarm_clock = AlarmClock::new(
        &Config::default(),
        &mut store,
        &clock,
        &MAILBOX,
        &LED_MAILBOX,
        &REPLIES,
        &STOP,
    );

    alarm_clock.tick();
    let ring = LED_MAILBOX.try_receive().expect("ring sent");
    assert_eq!(ring.payload.as_str(), "alarm 1200");
    alarm_clock.tick();
    assert!(LED_MAILBOX.is_empty());

    clock.0.set(datetime!(2024-03-04 10:10));
    alarm_clock.tick();
    let stop = LED_MAILBOX.try_receive().expect("stop sent");
    assert_eq!(stop.payload.as_str(), "color 0 0 0 0");
}

#[test]
fn missing_store_is_recreated_with_defaults() {
    let mut store = MemoryStore::default();
    let table = alarm_table::load_or_default(&mut store);
    assert_eq!(table, AlarmTable::default());
    assert_eq!(store.saves, 1);
    assert_eq!(alarm_table::load(&mut store), Ok(Some(AlarmTable::default())));
}

#[test]
fn corrupt_store_falls_back_to_defaults() {
    let mut table = AlarmTable::default();
    table.set(Weekday::Wednesday, time(5, 5));
    let mut store = MemoryStore::default();
    alarm_table::save(&mut store, &table).expect("saved");
    let last = store.bytes.len() - 1;
    store.bytes[last] ^= 0xFF;

    assert_eq!(alarm_table::load(&mut store), Err(Error::CorruptAlarmTable));
    assert_eq!(alarm_table::load_or_default(&mut store), AlarmTable::default());
    assert_eq!(alarm_table::load(&mut store), Ok(Some(AlarmTable::default())));
}
