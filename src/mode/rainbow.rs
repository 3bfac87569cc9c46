use embassy_time::Duration;
use nanorand::WyRand;

use super::{Animation, LedMode, Step};
use crate::Result;
use crate::led_strip::{Frame, Rgbw, rgbw};

const CYCLE: Duration = Duration::from_millis(1);

/// A hue wheel spread over the strip, rotating one notch per cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rainbow {
    phase: u8,
}

impl Rainbow {
    #[must_use]
    pub const fn new() -> Self {
        Self { phase: 0 }
    }
}

pub(super) fn build(_args: &[&str], _rng: &mut WyRand) -> Result<LedMode> {
    Ok(LedMode::Rainbow(Rainbow::new()))
}

impl Animation for Rainbow {
    fn cycle(&mut self, frame: &mut Frame, _rng: &mut WyRand) -> Step {
        let len = frame.len();
        for (index, pixel) in frame.iter_mut().enumerate() {
            let position = (index * 256 / len + usize::from(self.phase)) & 0xFF;
            *pixel = wheel(position as u8);
        }
        self.phase = self.phase.wrapping_add(1);
        Step::Wait(CYCLE)
    }
}

/// Map `0..=255` around the red, blue, green color wheel.
#[must_use]
pub const fn wheel(position: u8) -> Rgbw {
    match position {
        0..85 => rgbw(position * 3, 255 - position * 3, 0, 0),
        85..170 => {
            let position = position - 85;
            rgbw(255 - position * 3, 0, position * 3, 0)
        }
        _ => {
            let position = position - 170;
            rgbw(0, position * 3, 255 - position * 3, 0)
        }
    }
}
