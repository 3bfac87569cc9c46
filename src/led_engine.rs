//! The actor that owns the pixel strip and runs the active [`LedMode`].
//!
//! See [`LedEngine`] for usage examples.

use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};
use nanorand::WyRand;

use crate::command::Command;
use crate::config::Config;
use crate::hardware::PixelStrip;
use crate::led_strip::{Frame, MAX_PIXELS};
use crate::mailbox::{Mailbox, Message, Payload, Sender};
use crate::mode::{LedMode, Step, reply_fmt};
use crate::stop_flag::StopFlag;
use crate::{Error, Result};

/// Runs one animation cycle at a time and applies mode and `modify` commands between cycles.
///
/// Commands arrive on the engine's own mailbox. Only commands sent by the
/// [`Sender::Dispatcher`] are answered, on the dispatcher's reply mailbox, echoing the request's
/// `seq`.
///
/// # Examples
/// ```
/// # use window_light::Result;
/// # use window_light::led_strip::Rgbw;
/// # struct Strip([Rgbw; 30]);
/// # impl window_light::hardware::PixelStrip for Strip {
/// #     fn len(&self) -> usize { 30 }
/// #     fn set_pixel(&mut self, index: usize, color: Rgbw) -> Result<()> {
/// #         *self.0.get_mut(index).ok_or(window_light::Error::IndexOutOfBounds)? = color;
/// #         Ok(())
/// #     }
/// #     fn flush(&mut self) -> Result<()> { Ok(()) }
/// # }
/// use window_light::Config;
/// use window_light::led_engine::LedEngine;
/// use window_light::led_strip::rgbw;
/// use window_light::mailbox::Mailbox;
/// use window_light::stop_flag::StopFlag;
///
/// static LED_MAILBOX: Mailbox = Mailbox::new();
/// static REPLIES: Mailbox = Mailbox::new();
/// static STOP: StopFlag = StopFlag::new();
///
/// let mut strip = Strip([rgbw(0, 0, 0, 0); 30]);
/// let mut engine = LedEngine::new(&Config::default(), &mut strip, &LED_MAILBOX, &REPLIES, &STOP);
/// assert_eq!(engine.apply("read").as_str(), "Set mode to read");
/// engine.step()?;
/// drop(engine);
/// assert_eq!(strip.0[20], rgbw(75, 0, 0, 75));
/// # Ok::<(), window_light::Error>(())
/// ```
pub struct LedEngine<'a> {
    strip: &'a mut dyn PixelStrip,
    mailbox: &'a Mailbox,
    reply_to: &'a Mailbox,
    stop: &'a StopFlag,
    mode: LedMode,
    frame: Frame,
    rng: WyRand,
}

impl<'a> LedEngine<'a> {
    /// Create the engine in `config.initial_mode`, or off if that command is invalid.
    pub fn new(
        config: &Config,
        strip: &'a mut dyn PixelStrip,
        mailbox: &'a Mailbox,
        reply_to: &'a Mailbox,
        stop: &'a StopFlag,
    ) -> Self {
        if strip.len() > MAX_PIXELS {
            warn!(
                "strip has {=usize} pixels, only the first {=usize} are driven",
                strip.len(),
                MAX_PIXELS
            );
        }
        let frame = Frame::new(strip.len());
        let mut engine = Self {
            strip,
            mailbox,
            reply_to,
            stop,
            mode: LedMode::off(),
            frame,
            rng: WyRand::new_seed(config.rng_seed),
        };
        let reply = engine.apply(&config.initial_mode);
        info!("LED engine initial mode: {=str}", reply.as_str());
        engine
    }

    #[must_use]
    pub const fn mode(&self) -> &LedMode {
        &self.mode
    }

    #[must_use]
    pub const fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Run until the stop flag is raised.
    ///
    /// Each pass handles at most one command, then runs exactly one cycle, then sleeps for the
    /// cycle's delay or until the next command arrives.
    ///
    /// # Errors
    /// Returns [`Error::Strip`] if the strip rejects a write.
    pub async fn run(&mut self) -> Result<()> {
        info!("LED engine started");
        let mut pending: Option<Message> = None;
        while !self.stop.is_raised() {
            if let Some(message) = pending.take().or_else(|| self.mailbox.try_receive()) {
                self.receive(&message);
            }
            let delay = self.step()?;
            if let Either::Second(message) =
                select(Timer::after(delay), self.mailbox.receive()).await
            {
                pending = Some(message);
            }
        }
        info!("LED engine stopped");
        Ok(())
    }

    /// Handle one message, answering it if the dispatcher sent it.
    pub fn receive(&mut self, message: &Message) {
        let reply = self.apply(&message.payload);
        if message.sender == Sender::Dispatcher {
            self.reply_to
                .send(Message::new(Sender::LedEngine, message.seq, &reply));
        } else {
            debug!("not replying to {}: {=str}", message.sender, reply.as_str());
        }
    }

    /// Apply a mode command or `modify` command and return the reply text.
    ///
    /// An invalid command leaves the current mode untouched.
    pub fn apply(&mut self, line: &str) -> Payload {
        debug!("LED engine received {=str}", line);
        let Some(command) = Command::parse(line) else {
            return rejected(Error::UnknownMode);
        };
        if command.name == "modify" {
            return self.mode.modify(&command.args);
        }
        match LedMode::from_command(command.name, &command.args, &mut self.rng) {
            Ok(mode) => {
                self.mode = mode;
                reply_fmt(format_args!("Set mode to {}", command.name))
            }
            Err(error) => rejected(error),
        }
    }

    /// Run one cycle of the active mode and show the result.
    ///
    /// Returns how long to wait before the next cycle.
    ///
    /// # Errors
    /// Returns [`Error::Strip`] if the strip rejects a write.
    pub fn step(&mut self) -> Result<Duration> {
        match self.mode.cycle(&mut self.frame, &mut self.rng) {
            Step::Wait(delay) => {
                self.frame.show(&mut *self.strip)?;
                Ok(delay)
            }
            Step::Finished => {
                info!("animation finished, switching off");
                self.mode = LedMode::off();
                Ok(Duration::from_ticks(0))
            }
        }
    }
}

fn rejected(error: Error) -> Payload {
    warn!("rejected LED command: {}", error);
    reply_fmt(format_args!("Couldn't set mode, encountered error: {error}"))
}
