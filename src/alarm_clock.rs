//! Wake alarm scheduling: one arm window per calendar day, with snooze.
//!
//! [`AlarmScheduler`] is the pure state machine; [`AlarmClock`] is the actor that polls it,
//! answers `alarm` and `snooze` commands, and persists the table.

use core::fmt::Write as _;

use embassy_time::with_timeout;
use time::{Date, Duration as TimeDuration, PrimitiveDateTime, Time, Weekday};

use crate::alarm_table::{self, AlarmTable, AlarmTime};
use crate::command::Command;
use crate::config::Config;
use crate::hardware::{BlobStore, WallClock};
use crate::mailbox::{Mailbox, Message, Payload, Sender};
use crate::mode::{reply, reply_fmt};
use crate::stop_flag::StopFlag;
use crate::{Error, Result};

/// Command sent to the LED engine when a ringing alarm's window closes.
pub const STOP_COMMAND: &str = "color 0 0 0 0";

/// What the scheduler wants the LED engine to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmAction {
    /// Start the wake animation for this many seconds.
    Ring { seconds: u32 },
    /// The window has closed; switch the strip off.
    Stop,
}

/// Per-day arm/ring/snooze state machine.
///
/// Each alarm date gets the window `[T - d/2, T + d/2)` from that weekday's alarm time `T` and
/// the alarm duration `d`. The armed date is the first of yesterday, today, or tomorrow whose
/// window has not closed, so windows may cross midnight. A date rings, or is snoozed, at most
/// once.
///
/// ```
/// use time::macros::datetime;
/// use window_light::alarm_clock::{AlarmAction, AlarmScheduler};
/// use window_light::alarm_table::AlarmTable;
///
/// // Defaults: 10:00 every day, 1200 s window.
/// let mut scheduler = AlarmScheduler::new(AlarmTable::default(), 1_200);
/// assert_eq!(scheduler.poll(datetime!(2024-03-04 9:49:59)), None);
/// assert_eq!(
///     scheduler.poll(datetime!(2024-03-04 9:50:00)),
///     Some(AlarmAction::Ring { seconds: 1_200 })
/// );
/// assert_eq!(scheduler.poll(datetime!(2024-03-04 10:09:59)), None);
/// assert_eq!(scheduler.poll(datetime!(2024-03-04 10:10:00)), Some(AlarmAction::Stop));
/// ```
#[derive(Clone, Debug)]
pub struct AlarmScheduler {
    table: AlarmTable,
    duration_secs: u32,
    armed_on: Option<Date>,
    rung_on: Option<Date>,
    snooze_next: bool,
    snoozed_last: bool,
    ringing: bool,
    window: Option<(PrimitiveDateTime, PrimitiveDateTime)>,
}

impl AlarmScheduler {
    #[must_use]
    pub const fn new(table: AlarmTable, duration_secs: u32) -> Self {
        Self {
            table,
            duration_secs,
            armed_on: None,
            rung_on: None,
            snooze_next: false,
            snoozed_last: false,
            ringing: false,
            window: None,
        }
    }

    #[must_use]
    pub const fn table(&self) -> &AlarmTable {
        &self.table
    }

    /// The armed `[start, stop)` window, once polled.
    #[must_use]
    pub const fn window(&self) -> Option<(PrimitiveDateTime, PrimitiveDateTime)> {
        self.window
    }

    #[must_use]
    pub const fn is_ringing(&self) -> bool {
        self.ringing
    }

    /// A snooze is pending and has not been used yet.
    #[must_use]
    pub const fn snooze_pending(&self) -> bool {
        self.snooze_next && !self.snoozed_last
    }

    /// Advance the state machine to `now`.
    pub fn poll(&mut self, now: PrimitiveDateTime) -> Option<AlarmAction> {
        let mut action = None;
        // Checked against the old window, which may close after midnight.
        if self.ringing && self.window.is_none_or(|(_, stop)| now >= stop) {
            info!("stopping alarm");
            self.ringing = false;
            action = Some(AlarmAction::Stop);
        }

        let due = self.due_day(now);
        if self.armed_on != Some(due) {
            self.roll_over(due);
        }

        let in_window = self
            .window
            .is_some_and(|(start, stop)| start <= now && now < stop);
        if in_window && self.rung_on != Some(due) {
            self.rung_on = Some(due);
            if self.snooze_next {
                info!("snoozing alarm");
                self.snoozed_last = true;
            } else {
                info!("ringing alarm");
                self.snoozed_last = false;
                self.ringing = true;
                action = Some(AlarmAction::Ring {
                    seconds: self.duration_secs,
                });
            }
        }
        action
    }

    /// Commit a new alarm time for `day`.
    ///
    /// The current window is recomputed, and a changed alarm near `now` that already rang may
    /// ring again.
    pub fn set_alarm(&mut self, day: Weekday, time: AlarmTime, now: PrimitiveDateTime) {
        self.table.set(day, time);
        let nearby = nearby_days(now.date());
        if self
            .rung_on
            .is_some_and(|rung| rung.weekday() == day && nearby.contains(&Some(rung)))
        {
            self.rung_on = None;
        }
        if self.armed_on.is_none() {
            return;
        }
        let due = self.due_day(now);
        if self.armed_on == Some(due) {
            self.arm(due);
        } else {
            self.roll_over(due);
        }
    }

    /// Turn the snooze for the next unrung alarm on or off.
    pub fn set_snooze(&mut self, on: bool) {
        self.snooze_next = on;
        // A fresh request is for the next alarm, not the one already snoozed.
        self.snoozed_last = false;
    }

    /// The alarm date whose window is open or next to open at `now`.
    fn due_day(&self, now: PrimitiveDateTime) -> Date {
        nearby_days(now.date())
            .into_iter()
            .flatten()
            .find(|&day| self.window_for(day).is_some_and(|(_, stop)| now < stop))
            .unwrap_or_else(|| now.date())
    }

    fn window_for(&self, day: Date) -> Option<(PrimitiveDateTime, PrimitiveDateTime)> {
        let alarm = self.table.get(day.weekday());
        let half = TimeDuration::milliseconds(i64::from(self.duration_secs) * 500);
        let time = Time::from_hms(alarm.hour(), alarm.minute(), 0).ok()?;
        let at = PrimitiveDateTime::new(day, time);
        Some((at.checked_sub(half)?, at.checked_add(half)?))
    }

    /// Move on to the alarm on `due`; a snooze that was used is spent.
    fn roll_over(&mut self, due: Date) {
        if self.snoozed_last {
            debug!("last alarm was snoozed, re-arming");
            self.snooze_next = false;
            self.snoozed_last = false;
        }
        self.arm(due);
    }

    fn arm(&mut self, day: Date) {
        let alarm = self.table.get(day.weekday());
        self.window = self.window_for(day);
        self.armed_on = Some(day);
        debug!(
            "armed for {=u8}:{=u8} on day {=u8}",
            alarm.hour(),
            alarm.minute(),
            day.weekday().number_days_from_monday()
        );
    }
}

/// Yesterday, today, and tomorrow; a window can reach across midnight either way.
fn nearby_days(today: Date) -> [Option<Date>; 3] {
    [today.previous_day(), Some(today), today.next_day()]
}

/// Days selected by an `alarm` day token.
fn days_for(token: &str) -> Result<&'static [Weekday]> {
    use Weekday::{Friday, Monday, Saturday, Sunday, Thursday, Tuesday, Wednesday};
    Ok(match token {
        "mon" => &[Monday],
        "tue" => &[Tuesday],
        "wed" => &[Wednesday],
        "thu" => &[Thursday],
        "fri" => &[Friday],
        "sat" => &[Saturday],
        "sun" => &[Sunday],
        "weekday" => &[Monday, Tuesday, Wednesday, Thursday, Friday],
        "weekend" => &[Saturday, Sunday],
        _ => return Err(Error::InvalidDay),
    })
}

/// Actor owning the [`AlarmScheduler`] and the persisted table.
pub struct AlarmClock<'a> {
    scheduler: AlarmScheduler,
    store: &'a mut dyn BlobStore,
    clock: &'a dyn WallClock,
    mailbox: &'a Mailbox,
    led_mailbox: &'a Mailbox,
    reply_to: &'a Mailbox,
    stop: &'a StopFlag,
    config: Config,
}

impl<'a> AlarmClock<'a> {
    /// Load the table from `store`, falling back to the defaults.
    pub fn new(
        config: &Config,
        store: &'a mut dyn BlobStore,
        clock: &'a dyn WallClock,
        mailbox: &'a Mailbox,
        led_mailbox: &'a Mailbox,
        reply_to: &'a Mailbox,
        stop: &'a StopFlag,
    ) -> Self {
        let table = alarm_table::load_or_default(&mut *store);
        Self {
            scheduler: AlarmScheduler::new(table, config.alarm_duration_secs),
            store,
            clock,
            mailbox,
            led_mailbox,
            reply_to,
            stop,
            config: config.clone(),
        }
    }

    #[must_use]
    pub const fn scheduler(&self) -> &AlarmScheduler {
        &self.scheduler
    }

    /// Run until the stop flag is raised.
    ///
    /// # Errors
    /// Never fails today; the signature matches the other actors.
    pub async fn run(&mut self) -> Result<()> {
        info!("alarm clock started");
        while !self.stop.is_raised() {
            self.tick();
            if let Ok(message) = with_timeout(self.config.alarm_poll, self.mailbox.receive()).await
            {
                let reply = self.handle(&message.payload);
                if message.sender == Sender::Dispatcher {
                    self.reply_to
                        .send(Message::new(Sender::AlarmClock, message.seq, &reply));
                }
            }
        }
        info!("alarm clock stopped");
        Ok(())
    }

    /// Poll the scheduler once and forward any action to the LED engine.
    pub fn tick(&mut self) {
        match self.scheduler.poll(self.clock.now()) {
            Some(AlarmAction::Ring { seconds }) => {
                let command = reply_fmt(format_args!("alarm {seconds}"));
                self.led_mailbox
                    .send(Message::new(Sender::AlarmClock, 0, &command));
            }
            Some(AlarmAction::Stop) => {
                self.led_mailbox
                    .send(Message::new(Sender::AlarmClock, 0, STOP_COMMAND));
            }
            None => {}
        }
    }

    /// Answer an `alarm` or `snooze` command.
    pub fn handle(&mut self, line: &str) -> Payload {
        debug!("alarm clock received {=str}", line);
        let Some(command) = Command::parse(line) else {
            return reply("Not a recognized alarm clock command");
        };
        match (command.name, command.args.as_slice()) {
            ("alarm", []) => self.listing(),
            ("alarm", [day, rest @ ..]) => match self.set_alarms(day, rest.first().copied()) {
                Ok(reply) => reply,
                Err(error) => reply_fmt(format_args!("Didn't set alarm, encountered error: {error}")),
            },
            ("snooze", [] | ["on"]) => {
                self.scheduler.set_snooze(true);
                reply("Set to snooze next alarm")
            }
            ("snooze", ["off"]) => {
                self.scheduler.set_snooze(false);
                reply("Not going to snooze next alarm")
            }
            ("snooze", _) => reply("Didn't set snooze, encountered error"),
            _ => reply("Not a recognized alarm clock command"),
        }
    }

    fn listing(&self) -> Payload {
        let mut out = reply(if self.scheduler.snooze_pending() {
            "Alarm set to snooze"
        } else {
            "Alarm armed"
        });
        for (day, time) in self.scheduler.table().iter() {
            // A full buffer just truncates the listing.
            let _ = write!(out, "\n{day}: {time}");
        }
        out
    }

    fn set_alarms(&mut self, day_token: &str, time: Option<&str>) -> Result<Payload> {
        let days = days_for(day_token)?;
        let time = AlarmTime::parse(time.ok_or(Error::InvalidTime)?)?;

        let mut table = *self.scheduler.table();
        for &day in days {
            table.set(day, time);
        }
        alarm_table::save(&mut *self.store, &table)?;

        let now = self.clock.now();
        let mut out = Payload::new();
        for &day in days {
            self.scheduler.set_alarm(day, time, now);
            if !out.is_empty() {
                out.push('\n')?;
            }
            write!(out, "Set alarm on {day} to {time}")?;
        }
        info!("alarm table saved");
        Ok(out)
    }
}
