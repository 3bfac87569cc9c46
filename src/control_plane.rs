//! Wiring the actors together and running them until shutdown.
//!
//! A board crate creates the statics, builds each actor over its hardware, and awaits
//! [`run`] from one executor task. The edge callbacks ([`IrDecoder`](crate::ir::IrDecoder),
//! [`Debouncer`](crate::button::Debouncer)) and the transport that feeds
//! [`Dispatcher::handle`](crate::dispatcher::Dispatcher::handle) run outside this future.
//!
//! ```
//! use window_light::control_plane::Mailboxes;
//! use window_light::stop_flag::StopFlag;
//!
//! static MAILBOXES: Mailboxes = Mailboxes::new_static();
//! static STOP: StopFlag = StopFlag::new();
//!
//! let routes = MAILBOXES.routes();
//! assert!(routes.led.is_empty());
//! assert!(!STOP.is_raised());
//! ```

use core::future::Future;

use embassy_futures::join::join5;

use crate::Result;
use crate::alarm_clock::AlarmClock;
use crate::button::OffButton;
use crate::dispatcher::Routes;
use crate::ir_mapping::RemoteMapper;
use crate::led_engine::LedEngine;
use crate::mailbox::Mailbox;
use crate::sensor::ClimateMonitor;
use crate::stop_flag::StopFlag;

/// One inbox per actor that receives commands, plus the dispatcher's reply inbox.
pub struct Mailboxes {
    pub led: Mailbox,
    pub alarm_clock: Mailbox,
    pub sensor: Mailbox,
    pub replies: Mailbox,
}

impl Mailboxes {
    /// Create the mailboxes, usable in a `static`.
    #[must_use]
    pub const fn new_static() -> Self {
        Self {
            led: Mailbox::named("led"),
            alarm_clock: Mailbox::named("alarm_clock"),
            sensor: Mailbox::named("sensor"),
            replies: Mailbox::named("replies"),
        }
    }

    /// The routes a [`Dispatcher`](crate::dispatcher::Dispatcher) needs.
    #[must_use]
    pub const fn routes(&self) -> Routes<'_> {
        Routes {
            led: &self.led,
            alarm_clock: &self.alarm_clock,
            sensor: &self.sensor,
            replies: &self.replies,
        }
    }
}

/// Every long-running actor.
pub struct Actors<'a> {
    pub remote: RemoteMapper<'a>,
    pub button: OffButton<'a>,
    pub led: LedEngine<'a>,
    pub alarm_clock: AlarmClock<'a>,
    pub sensor: ClimateMonitor<'a>,
}

/// Run every actor until `stop` is raised.
///
/// A fault in one actor is logged and raises `stop`, so the rest wind down within their poll
/// interval.
///
/// # Errors
/// Returns the first fault, in actor order, once every actor has exited.
pub async fn run(actors: &mut Actors<'_>, stop: &StopFlag) -> Result<()> {
    info!("control plane starting");
    let Actors {
        remote,
        button,
        led,
        alarm_clock,
        sensor,
    } = actors;
    let (remote, button, led, alarm_clock, sensor) = join5(
        supervised("remote", stop, remote.run()),
        supervised("off button", stop, button.run()),
        supervised("LED engine", stop, led.run()),
        supervised("alarm clock", stop, alarm_clock.run()),
        supervised("climate monitor", stop, sensor.run()),
    )
    .await;
    info!("control plane stopped");
    remote.and(button).and(led).and(alarm_clock).and(sensor)
}

async fn supervised(
    name: &'static str,
    stop: &StopFlag,
    actor: impl Future<Output = Result<()>>,
) -> Result<()> {
    let result = actor.await;
    if let Err(error) = result {
        error!("{=str} failed: {}, shutting down", name, error);
        stop.raise();
    }
    result
}
