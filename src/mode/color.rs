//! A static 4-channel fill.

use embassy_time::Duration;
use nanorand::WyRand;

use super::{
    Animation, Channel, Direction, LedMode, Step, parse_channel, reply_fmt, scale_brightness,
    step_channel,
};
use crate::led_strip::{Frame, from_channels};
use crate::mailbox::Payload;
use crate::{Error, Result};

const CYCLE: Duration = Duration::from_millis(100);
const CHANNEL_STEP: u8 = 25;

/// `color r g b w`: every pixel the same color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Color {
    rgbw: [u8; 4],
}

impl Color {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { rgbw: [r, g, b, w] }
    }

    #[must_use]
    pub const fn off() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `r g b w`, each in `0..=255`.
    ///
    /// # Errors
    /// Returns [`Error::ArgumentCount`] unless there are exactly four arguments, and a parse
    /// error for any value that is not a whole number in range.
    pub fn from_args(args: &[&str]) -> Result<Self> {
        let [r, g, b, w] = args else {
            return Err(Error::ArgumentCount { expected: 4 });
        };
        Ok(Self::new(
            parse_channel(r)?,
            parse_channel(g)?,
            parse_channel(b)?,
            parse_channel(w)?,
        ))
    }

    #[must_use]
    pub const fn rgbw(&self) -> [u8; 4] {
        self.rgbw
    }

    fn describe(&self, direction: Direction, what: &str) -> Payload {
        let [r, g, b, w] = self.rgbw;
        reply_fmt(format_args!(
            "{}creased {what}. New color is {r}, {g}, {b}, {w}",
            direction.prefix()
        ))
    }
}

pub(super) fn build(args: &[&str], _rng: &mut WyRand) -> Result<LedMode> {
    Color::from_args(args).map(LedMode::Color)
}

impl Animation for Color {
    fn cycle(&mut self, frame: &mut Frame, _rng: &mut WyRand) -> Step {
        frame.fill(from_channels(self.rgbw));
        Step::Wait(CYCLE)
    }

    fn modify_brightness(&mut self, direction: Direction) -> Payload {
        self.rgbw = self.rgbw.map(|value| scale_brightness(value, direction));
        self.describe(direction, "brightness")
    }

    fn modify_channel(&mut self, direction: Direction, channel: Channel) -> Payload {
        if let Some(value) = self.rgbw.get_mut(channel.index()) {
            *value = step_channel(*value, direction, CHANNEL_STEP);
        }
        self.describe(direction, channel.name())
    }
}
