//! Wake-up light: a slow blue/white ramp, a hold at full level, then off.

use embassy_time::Duration;
use nanorand::WyRand;

use super::{Animation, LedMode, Step};
use crate::led_strip::{Frame, rgbw};
use crate::{Error, Result};

/// Steps in the ramp, and again in the hold.
pub const STEPS: u32 = 1_000;
/// Per-pixel blue and white level at the top of the ramp.
pub const MAX_LEVEL: u8 = 5;

/// `alarm <seconds>`: ramp for half the time, hold for the other half.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alarm {
    step_time: Duration,
    ramp_done: u32,
    hold_done: u32,
}

impl Alarm {
    /// An alarm lasting `seconds` in total.
    ///
    /// # Errors
    /// Returns [`Error::DurationNotPositive`] if `seconds` is zero.
    pub fn new(seconds: u32) -> Result<Self> {
        if seconds == 0 {
            return Err(Error::DurationNotPositive);
        }
        Ok(Self {
            // seconds / 2 / STEPS, in microseconds
            step_time: Duration::from_micros(u64::from(seconds) * 1_000_000 / 2 / u64::from(STEPS)),
            ramp_done: 0,
            hold_done: 0,
        })
    }

    /// Parse `alarm <seconds>`.
    ///
    /// # Errors
    /// Returns an error for a missing, non-numeric, or non-positive duration.
    pub fn from_args(args: &[&str]) -> Result<Self> {
        let [seconds] = args else {
            return Err(Error::ArgumentCount { expected: 1 });
        };
        let seconds: i64 = seconds.parse().map_err(|_| Error::NotANumber)?;
        if seconds < 1 {
            return Err(Error::DurationNotPositive);
        }
        Self::new(u32::try_from(seconds).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub const fn step_time(&self) -> Duration {
        self.step_time
    }
}

pub(super) fn build(args: &[&str], _rng: &mut WyRand) -> Result<LedMode> {
    Alarm::from_args(args).map(LedMode::Alarm)
}

impl Animation for Alarm {
    fn cycle(&mut self, frame: &mut Frame, _rng: &mut WyRand) -> Step {
        if self.ramp_done < STEPS {
            self.ramp_done += 1;
            let total = u64::from(MAX_LEVEL) * frame.len() as u64 * u64::from(self.ramp_done)
                / u64::from(STEPS);
            flatten(frame, total);
        } else if self.hold_done < STEPS {
            self.hold_done += 1;
            frame.fill(rgbw(0, 0, MAX_LEVEL, MAX_LEVEL));
        } else {
            return Step::Finished;
        }
        Step::Wait(self.step_time)
    }
}

/// Spread `total` units of blue+white evenly over the strip, the first pixels taking the
/// remainder.
fn flatten(frame: &mut Frame, total: u64) {
    let len = frame.len() as u64;
    let Some(quotient) = total.checked_div(len) else {
        return;
    };
    let remainder = total % len;
    for (index, pixel) in frame.iter_mut().enumerate() {
        let level = quotient + u64::from((index as u64) < remainder);
        let level = u8::try_from(level).unwrap_or(u8::MAX);
        *pixel = rgbw(0, 0, level, level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_spreads_remainder_over_first_pixels() {
        let mut frame = Frame::new(4);
        flatten(&mut frame, 10);
        assert_eq!(frame[0], rgbw(0, 0, 3, 3));
        assert_eq!(frame[1], rgbw(0, 0, 3, 3));
        assert_eq!(frame[2], rgbw(0, 0, 2, 2));
        assert_eq!(frame[3], rgbw(0, 0, 2, 2));
    }

    #[test]
    fn step_time_is_half_the_duration_over_the_steps() {
        let alarm = Alarm::new(1_200).expect("positive");
        assert_eq!(alarm.step_time(), Duration::from_millis(600));
    }

    #[test]
    fn zero_or_negative_duration_is_rejected() {
        assert_eq!(Alarm::from_args(&["0"]), Err(Error::DurationNotPositive));
        assert_eq!(Alarm::from_args(&["-5"]), Err(Error::DurationNotPositive));
        assert_eq!(Alarm::from_args(&[]), Err(Error::ArgumentCount { expected: 1 }));
    }
}
