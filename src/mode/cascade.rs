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

const CYCLE: Duration = Duration::from_millis(50);
const INCREMENT: u8 = 8;
const STEPS_PER_CHANNEL: usize = 255 / INCREMENT as usize;
/// Two channels raised, then the same two lowered.
const SEQUENCE_LEN: usize = 4 * STEPS_PER_CHANNEL;
const DEFAULT_WHITE: u8 = 0;
const WHITE_STEP: u8 = 5;

/// Raises two random channels one after the other, lowers them again, and feeds each step in at
/// the near end of the strip.
#[derive(Clone, Debug)]
pub struct Cascade {
    white: u8,
    sequence: Deque<[u8; 3], SEQUENCE_LEN>,
}

impl Cascade {
    #[must_use]
    pub const fn new(white: u8) -> Self {
        Self {
            white,
            sequence: Deque::new(),
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
        let skipped = rng.generate_range(0_usize..3);
        let mut pair = [(skipped + 1) % 3, (skipped + 2) % 3];
        if coin(rng) {
            pair.reverse();
        }
        let mut rgb = [0_u8; 3];
        for &index in &pair {
            for _ in 0..STEPS_PER_CHANNEL {
                if let Some(value) = rgb.get_mut(index) {
                    *value += INCREMENT;
                }
                // SEQUENCE_LEN covers all four passes.
                let _ = self.sequence.push_back(rgb);
            }
        }
        if coin(rng) {
            pair.reverse();
        }
        for &index in &pair {
            for _ in 0..STEPS_PER_CHANNEL {
                if let Some(value) = rgb.get_mut(index) {
                    *value -= INCREMENT;
                }
                let _ = self.sequence.push_back(rgb);
            }
        }
    }
}

fn coin(rng: &mut WyRand) -> bool {
    rng.generate_range(0_u8..2) == 1
}

pub(super) fn build(args: &[&str], _rng: &mut WyRand) -> Result<LedMode> {
    Cascade::from_args(args).map(LedMode::Cascade)
}

impl Animation for Cascade {
    fn cycle(&mut self, frame: &mut Frame, rng: &mut WyRand) -> Step {
        let Some([r, g, b]) = self.sequence.pop_front() else {
            self.refill(rng);
            return Step::Wait(Duration::from_ticks(0));
        };
        frame.push_left(rgbw(r, g, b, self.white));
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
