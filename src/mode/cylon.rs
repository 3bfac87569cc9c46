use embassy_time::Duration;
use nanorand::WyRand;

use super::{Animation, LedMode, Step};
use crate::Result;
use crate::led_strip::{Frame, OFF, Rgbw, rgbw};

const CYCLE: Duration = Duration::from_millis(4);
const DOT: Rgbw = rgbw(0, 0, 0, 10);

/// One dim dot sweeping end to end and back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cylon {
    tick: usize,
}

impl Cylon {
    #[must_use]
    pub const fn new() -> Self {
        Self { tick: 0 }
    }
}

pub(super) fn build(_args: &[&str], _rng: &mut WyRand) -> Result<LedMode> {
    Ok(LedMode::Cylon(Cylon::new()))
}

/// Dot position for `tick` on a strip of `len` pixels: `0..len-1` outbound, `len-1..=1` back.
fn position(tick: usize, len: usize) -> usize {
    let last = len.saturating_sub(1);
    if last == 0 {
        return 0;
    }
    let tick = tick % (2 * last);
    if tick < last { tick } else { 2 * last - tick }
}

impl Animation for Cylon {
    fn cycle(&mut self, frame: &mut Frame, _rng: &mut WyRand) -> Step {
        let len = frame.len();
        frame.fill(OFF);
        frame.set(position(self.tick, len), DOT);
        self.tick = (self.tick + 1) % (2 * len.saturating_sub(1)).max(1);
        Step::Wait(CYCLE)
    }
}
