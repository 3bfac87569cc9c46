//! The physical off button: an edge-callback debouncer and the actor that turns the strip off.
//!
//! See [`Debouncer`] for usage examples.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::with_timeout;

use crate::config::Config;
use crate::hardware::{EdgeEvent, Level};
use crate::mailbox::{Mailbox, Message, Sender};
use crate::stop_flag::StopFlag;
use crate::Result;

/// Command sent when the button is pressed.
pub const OFF_COMMAND: &str = "color 0 0 0 0";

/// Flag raised by the callback when a press is accepted.
///
/// See [`Debouncer`] for usage examples.
pub type PressSignal = Signal<CriticalSectionRawMutex, ()>;

/// Accepts a press only when the input stays high longer than the debounce threshold.
///
/// Lives in the edge callback. Each edge is O(1) and never blocks.
///
/// # Examples
/// ```
/// use window_light::Config;
/// use window_light::button::{Debouncer, PressSignal};
/// use window_light::hardware::{EdgeEvent, Level};
///
/// static PRESSED: PressSignal = Debouncer::new_static();
///
/// let mut debouncer = Debouncer::new(&Config::default(), &PRESSED);
/// debouncer.on_edge(EdgeEvent { level: Level::High, timestamp_us: 1_000 });
/// debouncer.on_edge(EdgeEvent { level: Level::Low, timestamp_us: 4_000 });
/// assert!(!PRESSED.signaled());
///
/// debouncer.on_edge(EdgeEvent { level: Level::High, timestamp_us: 100_000 });
/// debouncer.on_edge(EdgeEvent { level: Level::Low, timestamp_us: 200_000 });
/// assert!(PRESSED.signaled());
/// ```
pub struct Debouncer<'a> {
    debounce_us: u64,
    rising_at_us: Option<u64>,
    pressed: &'a PressSignal,
}

impl<'a> Debouncer<'a> {
    /// Create the static press flag.
    ///
    /// See [`Debouncer`] for usage examples.
    #[must_use]
    pub const fn new_static() -> PressSignal {
        Signal::new()
    }

    /// See [`Debouncer`] for usage examples.
    #[must_use]
    pub const fn new(config: &Config, pressed: &'a PressSignal) -> Self {
        Self {
            debounce_us: config.debounce_us,
            rising_at_us: None,
            pressed,
        }
    }

    /// Feed one edge from the button pin.
    pub fn on_edge(&mut self, edge: EdgeEvent) {
        match edge.level {
            Level::High => self.rising_at_us = Some(edge.timestamp_us),
            Level::Low => {
                // A falling edge with no rising edge before it is ignored.
                let Some(rising_at_us) = self.rising_at_us.take() else {
                    return;
                };
                let high_us = edge.timestamp_us.saturating_sub(rising_at_us);
                if high_us > self.debounce_us {
                    self.pressed.signal(());
                } else {
                    debug!("off button spurious pulse of {=u64}us", high_us);
                }
            }
        }
    }
}

/// Actor that waits on the press flag and sends [`OFF_COMMAND`] to the LED engine.
pub struct OffButton<'a> {
    pressed: &'a PressSignal,
    led_mailbox: &'a Mailbox,
    stop: &'a StopFlag,
    config: Config,
}

impl<'a> OffButton<'a> {
    #[must_use]
    pub fn new(
        config: &Config,
        pressed: &'a PressSignal,
        led_mailbox: &'a Mailbox,
        stop: &'a StopFlag,
    ) -> Self {
        Self {
            pressed,
            led_mailbox,
            stop,
            config: config.clone(),
        }
    }

    /// Run until the stop flag is raised.
    ///
    /// # Errors
    /// Never fails today; the signature matches the other actors.
    pub async fn run(&mut self) -> Result<()> {
        info!("off button started");
        while !self.stop.is_raised() {
            // `wait` also clears the flag.
            if with_timeout(self.config.button_poll, self.pressed.wait()).await.is_ok() {
                debug!("off button pressed");
                self.led_mailbox
                    .send(Message::new(Sender::Button, 0, OFF_COMMAND));
            }
        }
        info!("off button stopped");
        Ok(())
    }
}
