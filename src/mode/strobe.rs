use embassy_time::Duration;
use nanorand::WyRand;

use super::{Animation, LedMode, Step};
use crate::Result;
use crate::led_strip::{Frame, OFF, rgbw};

const FLASH: Duration = Duration::from_millis(200);
const FLICKER: Duration = Duration::from_millis(100);
const FLASHES: usize = 4;
const FLICKERS: usize = 8;
/// Frames in one full pattern: each flash and each flicker is followed by an off frame.
const PATTERN_LEN: usize = 2 * (FLASHES + FLICKERS);

/// Four full-strip flashes, then eight alternating-pixel flickers, repeating.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Strobe {
    frame_index: usize,
}

impl Strobe {
    #[must_use]
    pub const fn new() -> Self {
        Self { frame_index: 0 }
    }
}

pub(super) fn build(_args: &[&str], _rng: &mut WyRand) -> Result<LedMode> {
    Ok(LedMode::Strobe(Strobe::new()))
}

impl Animation for Strobe {
    fn cycle(&mut self, frame: &mut Frame, _rng: &mut WyRand) -> Step {
        let index = self.frame_index;
        self.frame_index = (index + 1) % PATTERN_LEN;

        let off_frame = index % 2 == 1;
        if index < 2 * FLASHES {
            frame.fill(if off_frame { OFF } else { rgbw(255, 255, 255, 255) });
            return Step::Wait(FLASH);
        }

        if off_frame {
            frame.fill(OFF);
        } else {
            let flicker = (index - 2 * FLASHES) / 2;
            for (pixel_index, pixel) in frame.iter_mut().enumerate() {
                let level = if (flicker + pixel_index) % 2 == 1 { 255 } else { 0 };
                *pixel = rgbw(level, level, level, level);
            }
        }
        Step::Wait(FLICKER)
    }
}
