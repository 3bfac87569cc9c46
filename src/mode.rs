//! The closed set of LED animations and the registry that builds them from commands.
//!
//! See [`LedMode`] for usage examples.

pub mod alarm;
pub mod cascade;
pub mod color;
pub mod cylon;
pub mod fade;
pub mod random;
pub mod rainbow;
pub mod read;
pub mod scroll;
pub mod strobe;

use core::fmt::Write as _;

use embassy_time::Duration;
use nanorand::WyRand;

use crate::led_strip::Frame;
use crate::mailbox::Payload;
use crate::{Error, Result};

pub use alarm::Alarm;
pub use cascade::Cascade;
pub use color::Color;
pub use cylon::Cylon;
pub use fade::Fade;
pub use random::Random;
pub use rainbow::Rainbow;
pub use read::Read;
pub use scroll::Scroll;
pub use strobe::Strobe;

// ===== Public API ===========================================================

/// What a mode wants after one cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Show the frame, then wait this long before the next cycle.
    Wait(Duration),
    /// The animation has ended; the engine switches the strip off.
    Finished,
}

/// Which way a `modify` command moves a value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    /// `"In"` or `"De"`, for replies like "Increased white".
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Increase => "In",
            Self::Decrease => "De",
        }
    }
}

/// One color channel of the strip.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Red,
    Green,
    Blue,
    White,
}

impl Channel {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::White => "white",
        }
    }

    /// Position of this channel in `[r, g, b, w]`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::White => 3,
        }
    }
}

/// The behavior shared by every LED mode.
///
/// `cycle` advances one short time slice and draws into `frame`; the engine then shows the
/// frame and sleeps for the returned delay, checking its mailbox between cycles.
pub trait Animation {
    fn cycle(&mut self, frame: &mut Frame, rng: &mut WyRand) -> Step;

    fn modify_brightness(&mut self, _direction: Direction) -> Payload {
        reply("Nothing defined to modify brightness for this mode")
    }

    fn modify_channel(&mut self, _direction: Direction, _channel: Channel) -> Payload {
        reply("Nothing defined to modify color for this mode")
    }
}

/// Exactly one active animation.
///
/// ```
/// use nanorand::WyRand;
/// use window_light::led_strip::{Frame, rgbw};
/// use window_light::mode::LedMode;
///
/// let mut rng = WyRand::new_seed(7);
/// let mut mode = LedMode::from_command("color", &["10", "20", "30", "40"], &mut rng)?;
/// let reply = mode.modify(&["increase", "brightness"]);
/// assert_eq!(reply.as_str(), "Increased brightness. New color is 132, 137, 142, 147");
///
/// let mut frame = Frame::new(3);
/// mode.cycle(&mut frame, &mut rng);
/// assert_eq!(frame[2], rgbw(132, 137, 142, 147));
/// # Ok::<(), window_light::Error>(())
/// ```
#[derive(Clone, Debug)]
pub enum LedMode {
    Alarm(Alarm),
    Color(Color),
    Rainbow(Rainbow),
    Fade(Fade),
    Random(Random),
    Strobe(Strobe),
    Cylon(Cylon),
    Scroll(Scroll),
    Cascade(Cascade),
    Read(Read),
}

impl LedMode {
    /// The strip switched off.
    #[must_use]
    pub const fn off() -> Self {
        Self::Color(Color::off())
    }

    /// Build the mode `name` from its arguments.
    ///
    /// # Errors
    /// Returns [`Error::UnknownMode`] for a name not in [`MODES`], or the mode's own validation
    /// error for bad arguments.
    pub fn from_command(name: &str, args: &[&str], rng: &mut WyRand) -> Result<Self> {
        let entry = MODES
            .iter()
            .find(|entry| entry.name == name)
            .ok_or(Error::UnknownMode)?;
        (entry.build)(args, rng)
    }

    /// Run one cycle of the active animation.
    pub fn cycle(&mut self, frame: &mut Frame, rng: &mut WyRand) -> Step {
        self.animation().cycle(frame, rng)
    }

    /// Apply `modify <increase|decrease> <brightness|r|g|b|w>` to the active animation.
    pub fn modify(&mut self, args: &[&str]) -> Payload {
        let direction = match args.first().copied() {
            Some("increase") => Direction::Increase,
            Some("decrease") => Direction::Decrease,
            _ => return reply("Did nothing, invalid first argument"),
        };
        let animation = self.animation();
        match args.get(1).copied() {
            Some("brightness") => animation.modify_brightness(direction),
            Some("r") => animation.modify_channel(direction, Channel::Red),
            Some("g") => animation.modify_channel(direction, Channel::Green),
            Some("b") => animation.modify_channel(direction, Channel::Blue),
            Some("w") => animation.modify_channel(direction, Channel::White),
            _ => reply("Did nothing, invalid second argument"),
        }
    }

    fn animation(&mut self) -> &mut dyn Animation {
        match self {
            Self::Alarm(mode) => mode,
            Self::Color(mode) => mode,
            Self::Rainbow(mode) => mode,
            Self::Fade(mode) => mode,
            Self::Random(mode) => mode,
            Self::Strobe(mode) => mode,
            Self::Cylon(mode) => mode,
            Self::Scroll(mode) => mode,
            Self::Cascade(mode) => mode,
            Self::Read(mode) => mode,
        }
    }
}

/// Registry row: command name, help rows, and constructor.
pub struct ModeEntry {
    pub name: &'static str,
    /// `(argument, description)` pairs shown by `help`.
    pub help: &'static [(&'static str, &'static str)],
    pub build: fn(&[&str], &mut WyRand) -> Result<LedMode>,
}

/// Every mode a command can select, in `help` order.
pub static MODES: [ModeEntry; 11] = [
    ModeEntry {
        name: "alarm",
        help: &[("seconds", "Wake-up ramp over half the time, then hold")],
        build: alarm::build,
    },
    ModeEntry {
        name: "color",
        help: &[("four 8 bit numbers", "Set the LED strip to the specified color")],
        build: color::build,
    },
    ModeEntry {
        name: "rainbow",
        help: &[("none", "Rainbow pattern")],
        build: rainbow::build,
    },
    ModeEntry {
        name: "fade",
        help: &[
            ("none", "Fade in and out of random colors"),
            ("0-255", "Fade in and out of random colors with the specified white value"),
        ],
        build: fade::build,
    },
    ModeEntry {
        name: "strobe",
        help: &[("none", "Strobe pattern")],
        build: strobe::build,
    },
    ModeEntry {
        name: "random",
        help: &[
            ("none", "Picks random colors and transitions towards them"),
            ("0-255", "Picks random colors and transitions towards them with the specified white value"),
        ],
        build: random::build,
    },
    ModeEntry {
        name: "cylon",
        help: &[("none", "Moving dot pattern")],
        build: cylon::build,
    },
    ModeEntry {
        name: "scroll",
        help: &[("none", "Scrolls through random colors")],
        build: scroll::build,
    },
    ModeEntry {
        name: "cascade",
        help: &[
            ("none", "Scrolls through R, G and B randomly"),
            ("0-255", "Same, with the specified white value"),
        ],
        build: cascade::build,
    },
    ModeEntry {
        name: "read",
        help: &[("none", "Reading light"), ("2", "Reading light for two people")],
        build: read::build,
    },
    ModeEntry {
        name: "read2",
        help: &[("none", "Same as read 2")],
        build: read::build_two,
    },
];

// ===== Helpers shared by the modes ==========================================

/// Build a reply, truncating if it does not fit.
pub(crate) fn reply(text: &str) -> Payload {
    crate::mailbox::truncated(text)
}

/// Build a reply from format arguments, truncating if it does not fit.
pub(crate) fn reply_fmt(args: core::fmt::Arguments<'_>) -> Payload {
    let mut out = Payload::new();
    // A full buffer just truncates the reply.
    let _ = out.write_fmt(args);
    out
}

/// Parse one channel value in `0..=255`.
pub(crate) fn parse_channel(text: &str) -> Result<u8> {
    let value: i64 = text.parse().map_err(|_| Error::NotANumber)?;
    u8::try_from(value).map_err(|_| Error::ChannelOutOfRange)
}

/// Parse an optional white level, falling back to `default`.
pub(crate) fn parse_optional_white(args: &[&str], default: u8) -> Result<u8> {
    args.first().map_or(Ok(default), |text| parse_channel(text))
}

/// Move `value` halfway toward 255 or 0.
#[must_use]
pub const fn scale_brightness(value: u8, direction: Direction) -> u8 {
    match direction {
        Direction::Increase => value + (255 - value) / 2,
        Direction::Decrease => value / 2,
    }
}

/// Add or subtract `amount`, clamped to `0..=255`.
#[must_use]
pub const fn step_channel(value: u8, direction: Direction, amount: u8) -> u8 {
    match direction {
        Direction::Increase => value.saturating_add(amount),
        Direction::Decrease => value.saturating_sub(amount),
    }
}
