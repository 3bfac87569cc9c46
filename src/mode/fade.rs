use embassy_time::Duration;
use heapless::Deque;
use nanorand::{Rng, WyRand};

use super::{
    Animation, Channel, Direction, LedMode, Step, parse_optional_white, reply_fmt, step_channel,
};
use crate::Result;
use crate::led_strip::{Frame, rgbw};
use crate::mailbox::Payload;

const CYCLE: Duration = Duration::from_millis(5);
const DEFAULT_WHITE: u8 = 20;
const WHITE_STEP: u8 = 20;
/// Ramp up `0..=255`, then down `256..=0`.
const RAMP_LEN: usize = 256 + 257;

/// Fades a random color in and out over a steady white level.
#[derive(Clone, Debug)]
pub struct Fade {
    white: u8,
    ramp: Deque<[u8; 3], RAMP_LEN>,
}

impl Fade {
    #[must_use]
    pub const fn new(white: u8) -> Self {
        Self {
            white,
            ramp: Deque::new(),
        }
    }

    /// Parse an optional white level.
    ///
    /// # Errors
    /// Returns a parse error if the white level is not a whole number in `0..=255`.
    pub fn from_args(args: &[&str]) -> Result<Self> {
        parse_optional_white(args, DEFAULT_WHITE).map(Self::new)
    }

    #[must_use]
    pub const fn white(&self) -> u8 {
        self.white
    }

    fn refill(&mut self, rng: &mut WyRand) {
        // Each channel is a fraction `k / 256` of the ramp level.
        let fractions: [u16; 3] = core::array::from_fn(|_| rng.generate_range(0_u16..256));
        let levels = (0..=255_u16).chain((0..=256_u16).rev());
        for level in levels {
            let color = fractions.map(|fraction| (u32::from(fraction) * u32::from(level) / 256) as u8);
            // RAMP_LEN is exactly the number of levels.
            let _ = self.ramp.push_back(color);
        }
    }
}

pub(super) fn build(args: &[&str], _rng: &mut WyRand) -> Result<LedMode> {
    Fade::from_args(args).map(LedMode::Fade)
}

impl Animation for Fade {
    fn cycle(&mut self, frame: &mut Frame, rng: &mut WyRand) -> Step {
        let Some([r, g, b]) = self.ramp.pop_front() else {
            self.refill(rng);
            return Step::Wait(Duration::from_ticks(0));
        };
        frame.fill(rgbw(r, g, b, self.white));
        Step::Wait(CYCLE)
    }

    fn modify_brightness(&mut self, direction: Direction) -> Payload {
        self.white = step_channel(self.white, direction, WHITE_STEP);
        reply_fmt(format_args!("{}creased white", direction.prefix()))
    }

    fn modify_channel(&mut self, direction: Direction, channel: Channel) -> Payload {
        if channel == Channel::White {
            self.modify_brightness(direction)
        } else {
            super::reply("Nothing defined to modify color for this mode")
        }
    }
}
