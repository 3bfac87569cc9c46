use embassy_time::Duration;
use heapless::Deque;
use nanorand::{Rng, WyRand};

use super::{
    Animation, Channel, Direction, LedMode, Step, parse_optional_white, reply, reply_fmt,
    step_channel,
};
use crate::Result;
use crate::led_strip::{Frame, rgbw};
use crate::mailbox::Payload;

const CYCLE: Duration = Duration::from_millis(10);
/// Cycles the final color is held: one second.
const DWELL_CYCLES: u32 = 100;
const DEFAULT_WHITE: u8 = 0;
const WHITE_STEP: u8 = 5;

/// Walks from the current color to a random target, holds it, then picks another.
#[derive(Clone, Debug)]
pub struct Random {
    white: u8,
    current: [u8; 3],
    path: Deque<[u8; 3], 256>,
    dwell: u32,
}

impl Random {
    /// Start from a random color.
    #[must_use]
    pub fn new(white: u8, rng: &mut WyRand) -> Self {
        Self {
            white,
            current: random_rgb(rng),
            path: Deque::new(),
            dwell: 0,
        }
    }

    /// Parse an optional white level.
    ///
    /// # Errors
    /// Returns a parse error if the white level is not a whole number in `0..=255`.
    pub fn from_args(args: &[&str], rng: &mut WyRand) -> Result<Self> {
        parse_optional_white(args, DEFAULT_WHITE).map(|white| Self::new(white, rng))
    }

    #[must_use]
    pub const fn white(&self) -> u8 {
        self.white
    }

    #[must_use]
    pub const fn current(&self) -> [u8; 3] {
        self.current
    }

    fn plan_path(&mut self, target: [u8; 3]) {
        let from = self.current.map(i32::from);
        let delta: [i32; 3] = core::array::from_fn(|i| i32::from(target[i]) - from[i]);
        let steps = delta.iter().map(|d| d.abs()).max().unwrap_or(0);
        for step in 0..steps {
            let color: [u8; 3] =
                core::array::from_fn(|i| ((from[i] * steps + delta[i] * step) / steps) as u8);
            // At most 255 steps.
            let _ = self.path.push_back(color);
        }
    }
}

pub(super) fn build(args: &[&str], rng: &mut WyRand) -> Result<LedMode> {
    Random::from_args(args, rng).map(LedMode::Random)
}

fn random_rgb(rng: &mut WyRand) -> [u8; 3] {
    core::array::from_fn(|_| rng.generate_range(0_u8..=255))
}

impl Animation for Random {
    fn cycle(&mut self, frame: &mut Frame, rng: &mut WyRand) -> Step {
        if self.dwell > 0 {
            self.dwell -= 1;
            return Step::Wait(CYCLE);
        }
        let Some(rgb) = self.path.pop_front() else {
            let target = random_rgb(rng);
            self.plan_path(target);
            return Step::Wait(Duration::from_ticks(0));
        };
        let [r, g, b] = rgb;
        frame.fill(rgbw(r, g, b, self.white));
        if self.path.is_empty() {
            self.current = rgb;
            self.dwell = DWELL_CYCLES;
        }
        Step::Wait(CYCLE)
    }

    fn modify_brightness(&mut self, direction: Direction) -> Payload {
        self.white = step_channel(self.white, direction, WHITE_STEP);
        reply_fmt(format_args!("{}creased white to {}", direction.prefix(), self.white))
    }

    fn modify_channel(&mut self, direction: Direction, channel: Channel) -> Payload {
        if channel == Channel::White {
            self.modify_brightness(direction)
        } else {
            reply("Nothing defined to modify color for this mode")
        }
    }
}
