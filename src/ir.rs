//! Pulse-distance decoder for the living-room remote.
//!
//! See [`IrDecoder`] for usage examples.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel as EmbassyChannel;

use crate::config::Config;
use crate::hardware::{EdgeEvent, Level};
use crate::ir_mapping::RemoteButton;

// ===== Public API ===========================================================

/// One finalized transmission.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrFrame {
    /// Decoded code after corrections.
    pub code: u64,
    /// Timestamp, in microseconds, of the edge that finished the frame.
    pub timestamp_us: u64,
}

/// Queue from the edge callback to the [`RemoteMapper`](crate::ir_mapping::RemoteMapper).
///
/// See [`IrDecoder`] for usage examples.
pub type IrFrameQueue = EmbassyChannel<CriticalSectionRawMutex, IrFrame, 8>;

/// Turns raw edges from the IR receiver pin into [`IrFrame`]s.
///
/// The decoder lives in the edge callback. Each call to [`IrDecoder::on_edge`] is O(1): some
/// integer arithmetic and at most one non-blocking enqueue.
///
/// # Examples
/// ```
/// use window_light::Config;
/// use window_light::hardware::{EdgeEvent, Level};
/// use window_light::ir::{IrDecoder, IrFrameQueue};
///
/// static IR_FRAMES: IrFrameQueue = IrDecoder::new_static();
///
/// let mut decoder = IrDecoder::new(&Config::default(), &IR_FRAMES);
/// // Board code forwards every edge on the receiver pin.
/// decoder.on_edge(EdgeEvent { level: Level::Low, timestamp_us: 50_000 });
/// assert_eq!(IR_FRAMES.try_receive().map(|frame| frame.code), Ok(1));
/// ```
pub struct IrDecoder<'a> {
    code: u64,
    last_edge_us: u64,
    idle_us: u64,
    bit_threshold_us: u64,
    frames: &'a IrFrameQueue,
}

impl<'a> IrDecoder<'a> {
    /// Create the static frame queue.
    ///
    /// See [`IrDecoder`] for usage examples.
    #[must_use]
    pub const fn new_static() -> IrFrameQueue {
        EmbassyChannel::new()
    }

    /// Create a decoder that pushes finished frames into `frames`.
    ///
    /// See [`IrDecoder`] for usage examples.
    #[must_use]
    pub const fn new(config: &Config, frames: &'a IrFrameQueue) -> Self {
        Self {
            code: 1,
            last_edge_us: 0,
            idle_us: config.ir_idle_us,
            bit_threshold_us: config.ir_bit_threshold_us,
            frames,
        }
    }

    /// Feed one edge from the receiver pin.
    ///
    /// See [`IrDecoder`] for usage examples.
    pub fn on_edge(&mut self, edge: EdgeEvent) {
        let pulse_us = edge.timestamp_us.saturating_sub(self.last_edge_us);
        self.last_edge_us = edge.timestamp_us;

        let mut done = false;
        if pulse_us > self.idle_us {
            // Trailing silence.
            done = true;
            self.code = corrected(self.code);
        } else if edge.level == Level::Low {
            // Logical 1 is ~1687us low, logical 0 ~562us; split the difference.
            self.code = (self.code << 1) | u64::from(pulse_us > self.bit_threshold_us);
        }

        // Known codes finish as soon as the last bit lands.
        done |= RemoteButton::from_code(self.code).is_some();

        if done {
            let frame = IrFrame {
                code: self.code,
                timestamp_us: edge.timestamp_us,
            };
            if self.frames.try_send(frame).is_err() {
                warn!("IR frame queue full, dropping code {=u64:#x}", frame.code);
            }
            self.code = 0;
        }
    }
}

/// Bits in a well-formed frame.
const FRAME_BITS: u32 = 34;
/// A spurious leading one above the frame.
const EXTRA_LEADING_ONE: u64 = 0x2_0000_0000;
/// Marker and offset of an auto-repeat frame.
const ECHO_MARKER: u64 = 0x100;
const ECHO_OFFSET: u64 = 0xFF;

/// Repair the common reception errors of a frame ended by silence.
fn corrected(mut code: u64) -> u64 {
    let bit_len = u64::BITS - code.leading_zeros();
    if bit_len > FRAME_BITS {
        code >>= bit_len - FRAME_BITS;
    }
    if code > EXTRA_LEADING_ONE {
        code -= EXTRA_LEADING_ONE;
    }
    if code & ECHO_MARKER != 0 && code % 2 == 0 {
        code -= ECHO_OFFSET;
    }
    code
}
