//! Reading light: a few fixed pixels lit dim warm, the rest off.

use embassy_time::Duration;
use nanorand::WyRand;

use super::{Animation, LedMode, Step};
use crate::Result;
use crate::led_strip::{Frame, OFF, Rgbw, rgbw};

const CYCLE: Duration = Duration::from_millis(100);
const READING_COLOR: Rgbw = rgbw(75, 0, 0, 75);
const ONE_READER: &[usize] = &[19, 20, 21];
const TWO_READERS: &[usize] = &[0, 1, 2, 19, 20, 21];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Read {
    lit: &'static [usize],
}

impl Read {
    #[must_use]
    pub const fn one() -> Self {
        Self { lit: ONE_READER }
    }

    #[must_use]
    pub const fn two() -> Self {
        Self { lit: TWO_READERS }
    }

    /// `read` or `read 2`; any other argument is treated as one reader.
    #[must_use]
    pub fn from_args(args: &[&str]) -> Self {
        match args.first() {
            Some(&"2") => Self::two(),
            _ => Self::one(),
        }
    }

    #[must_use]
    pub const fn lit(&self) -> &'static [usize] {
        self.lit
    }
}

pub(super) fn build(args: &[&str], _rng: &mut WyRand) -> Result<LedMode> {
    Ok(LedMode::Read(Read::from_args(args)))
}

pub(super) fn build_two(_args: &[&str], _rng: &mut WyRand) -> Result<LedMode> {
    Ok(LedMode::Read(Read::two()))
}

impl Animation for Read {
    fn cycle(&mut self, frame: &mut Frame, _rng: &mut WyRand) -> Step {
        frame.fill(OFF);
        // Pixels past the end of a short strip are skipped.
        for &index in self.lit {
            frame.set(index, READING_COLOR);
        }
        Step::Wait(CYCLE)
    }
}
