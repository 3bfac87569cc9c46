use embassy_time::Duration;
use nanorand::{Rng, WyRand};

use super::{Animation, LedMode, Step};
use crate::Result;
use crate::led_strip::{Frame, rgbw};

const CYCLE: Duration = Duration::from_millis(50);
const START: [u8; 3] = [128, 128, 128];

/// Random-walks one color and feeds it in at the far end of the strip.
///
/// Each cycle one of red, green or blue moves 30% of the way up toward 256 or down toward 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scroll {
    rgb: [u8; 3],
}

impl Scroll {
    #[must_use]
    pub const fn new() -> Self {
        Self { rgb: START }
    }
}

impl Default for Scroll {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn build(_args: &[&str], _rng: &mut WyRand) -> Result<LedMode> {
    Ok(LedMode::Scroll(Scroll::new()))
}

/// Move `value` 30% of the way toward 256 (`up`) or toward 0.
const fn nudge(value: u8, up: bool) -> u8 {
    let value = value as u16;
    let nudged = if up {
        value + 3 * (256 - value) / 10
    } else {
        value * 7 / 10
    };
    // Up never reaches 256: 0.3 * (256 - v) < 256 - v.
    nudged as u8
}

impl Animation for Scroll {
    fn cycle(&mut self, frame: &mut Frame, rng: &mut WyRand) -> Step {
        let channel = rng.generate_range(0_usize..3);
        let up = rng.generate_range(0_u8..2) == 1;
        if let Some(value) = self.rgb.get_mut(channel) {
            *value = nudge(*value, up);
        }
        let [r, g, b] = self.rgb;
        frame.push_right(rgbw(r, g, b, 0));
        Step::Wait(CYCLE)
    }
}
