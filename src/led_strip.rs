//! Colors and the in-memory pixel buffer for a 4-channel (RGBW) LED strip.
//!
//! See [`Frame`] for the main usage example.

use heapless::Vec;
/// RGBW color building blocks re-exported from `smart_leds`.
pub use smart_leds::{RGBW, White};

use crate::hardware::PixelStrip;
use crate::{Error, Result};

/// RGBW color representation re-exported from `smart_leds`.
pub type Rgbw = RGBW<u8>;

/// Longest strip a [`Frame`] can describe.
pub const MAX_PIXELS: usize = 150;

/// All channels off.
pub const OFF: Rgbw = rgbw(0, 0, 0, 0);

/// Build an [`Rgbw`] from its four channels.
#[must_use]
pub const fn rgbw(r: u8, g: u8, b: u8, w: u8) -> Rgbw {
    Rgbw {
        r,
        g,
        b,
        a: White(w),
    }
}

/// Build an [`Rgbw`] from `[r, g, b, w]`.
#[must_use]
pub const fn from_channels([r, g, b, w]: [u8; 4]) -> Rgbw {
    rgbw(r, g, b, w)
}

/// Pixel buffer sized to the strip, owned by the LED engine.
///
/// Frames deref to `[Rgbw]`, so you can mutate pixels directly before calling
/// [`Frame::show`].
///
/// ```
/// use window_light::led_strip::{Frame, OFF, rgbw};
///
/// let mut frame = Frame::new(4);
/// frame.fill(rgbw(0, 0, 0, 10));
/// frame.push_left(rgbw(255, 0, 0, 0));
/// assert_eq!(frame[0], rgbw(255, 0, 0, 0));
/// assert_eq!(frame[3], rgbw(0, 0, 0, 10));
/// frame.push_right(OFF);
/// assert_eq!(frame[3], OFF);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame(Vec<Rgbw, MAX_PIXELS>);

impl Frame {
    /// A blank frame of `len` pixels, capped at [`MAX_PIXELS`].
    #[must_use]
    pub fn new(len: usize) -> Self {
        let mut pixels = Vec::new();
        // Capacity is checked by `min`.
        let _ = pixels.resize(len.min(MAX_PIXELS), OFF);
        Self(pixels)
    }

    pub fn fill(&mut self, color: Rgbw) {
        self.0.iter_mut().for_each(|pixel| *pixel = color);
    }

    /// Set one pixel, ignoring positions past the end of the strip.
    pub fn set(&mut self, index: usize, color: Rgbw) {
        if let Some(pixel) = self.0.get_mut(index) {
            *pixel = color;
        }
    }

    /// Shift every pixel one place toward the far end and put `color` at index 0.
    pub fn push_left(&mut self, color: Rgbw) {
        if self.0.is_empty() {
            return;
        }
        self.0.rotate_right(1);
        self.set(0, color);
    }

    /// Shift every pixel one place toward index 0 and put `color` at the far end.
    pub fn push_right(&mut self, color: Rgbw) {
        let Some(last) = self.0.len().checked_sub(1) else {
            return;
        };
        self.0.rotate_left(1);
        self.set(last, color);
    }

    /// Copy the buffer to `strip` and latch it.
    ///
    /// # Errors
    /// Returns [`Error::Strip`] if the strip driver rejects a write.
    pub fn show(&self, strip: &mut dyn PixelStrip) -> Result<()> {
        for (index, pixel) in self.0.iter().enumerate() {
            strip.set_pixel(index, *pixel).map_err(|_| Error::Strip)?;
        }
        strip.flush().map_err(|_| Error::Strip)
    }
}

impl core::ops::Deref for Frame {
    type Target = [Rgbw];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl core::ops::DerefMut for Frame {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
