//! Collaborators the control plane consumes but does not implement.
//!
//! A board crate implements these over its GPIO, pixel driver, flash or file store, sensor bus
//! and process supervisor, then hands them to [`control_plane::run`](crate::control_plane::run).

use time::PrimitiveDateTime;

use crate::Result;
use crate::led_strip::Rgbw;

/// Logic level reported with an edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

/// One transition on a digital input, as delivered to an edge callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeEvent {
    /// Level after the transition.
    pub level: Level,
    /// Monotonic timestamp in microseconds.
    pub timestamp_us: u64,
}

/// An addressable 4-channel pixel buffer.
pub trait PixelStrip {
    /// Number of pixels on the strip.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stage one pixel; nothing is shown until [`flush`](Self::flush).
    ///
    /// # Errors
    /// Implementations report driver failures.
    fn set_pixel(&mut self, index: usize, color: Rgbw) -> Result<()>;

    /// Stage every pixel to `color`.
    ///
    /// # Errors
    /// Implementations report driver failures.
    fn fill(&mut self, color: Rgbw) -> Result<()> {
        for index in 0..self.len() {
            self.set_pixel(index, color)?;
        }
        Ok(())
    }

    /// Latch staged pixels onto the strip.
    ///
    /// # Errors
    /// Implementations report driver failures.
    fn flush(&mut self) -> Result<()>;
}

/// A durable slot holding one small document, replaced whole on every save.
pub trait BlobStore {
    /// Read the stored document into `buffer`, returning its length.
    ///
    /// # Errors
    /// Implementations report a missing document or I/O failure.
    fn load(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Atomically replace the stored document with `bytes`.
    ///
    /// # Errors
    /// Implementations report I/O failure.
    fn save(&mut self, bytes: &[u8]) -> Result<()>;
}

/// One temperature/humidity sample.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Climate {
    pub celsius: f32,
    pub relative_humidity: f32,
}

/// A temperature/humidity sensor.
pub trait ClimateSensor {
    /// # Errors
    /// Implementations report bus or checksum failures.
    fn read(&mut self) -> Result<Climate>;
}

/// One line in the climate log.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClimateRecord {
    pub at: PrimitiveDateTime,
    pub fahrenheit: f32,
    pub relative_humidity: f32,
}

/// Durable append-only storage for climate samples.
pub trait ClimateLog {
    /// # Errors
    /// Implementations report I/O failure.
    fn append(&mut self, record: &ClimateRecord) -> Result<()>;
}

/// Local wall-clock time, used for alarm scheduling and log stamps.
pub trait WallClock {
    fn now(&self) -> PrimitiveDateTime;
}

/// Process-level control offered by the host.
pub trait Supervisor {
    /// Ask the host to restart this service.
    ///
    /// # Errors
    /// Implementations report a rejected request.
    fn restart(&mut self) -> Result<()>;

    /// Ask the host to reboot the machine.
    ///
    /// # Errors
    /// Implementations report a rejected request.
    fn reboot(&mut self) -> Result<()>;
}
