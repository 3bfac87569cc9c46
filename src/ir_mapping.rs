//! Maps decoded remote codes to buttons, and buttons to LED commands.
//!
//! See [`RemoteMapper`] for usage examples.

use embassy_time::with_timeout;

use crate::config::Config;
use crate::ir::{IrFrame, IrFrameQueue};
use crate::mailbox::{Mailbox, Message, Sender};
use crate::stop_flag::StopFlag;
use crate::Result;

/// Buttons on the remote.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteButton {
    Mute,
    VolumeDown,
    Vudu,
    Arrow,
    Rewind,
    DisneyPlus,
    PlayPause,
    Moon,
    Netflix,
    Ok,
    Back,
    Left,
    Star,
    Up,
    FastForward,
    Hulu,
    Right,
    Home,
    Down,
    Power,
    VolumeUp,
}

/// Decoded code of every button.
pub const BUTTON_CODES: [(u64, RemoteButton); 21] = [
    (0x1_57e3_04fb, RemoteButton::Mute),
    (0x1_57e3_08f7, RemoteButton::VolumeDown),
    (0x1_57e3_10ef, RemoteButton::Vudu),
    (0x1_57e3_1ee1, RemoteButton::Arrow),
    (0x1_57e3_2cd3, RemoteButton::Rewind),
    (0x1_57e3_30cf, RemoteButton::DisneyPlus),
    (0x1_57e3_32cd, RemoteButton::PlayPause),
    (0x1_57e3_46b9, RemoteButton::Moon),
    (0x1_57e3_4ab5, RemoteButton::Netflix),
    (0x1_57e3_54ab, RemoteButton::Ok),
    (0x1_57e3_6699, RemoteButton::Back),
    (0x1_57e3_7887, RemoteButton::Left),
    (0x1_57e3_8679, RemoteButton::Star),
    (0x1_57e3_9867, RemoteButton::Up),
    (0x1_57e3_aa55, RemoteButton::FastForward),
    (0x1_57e3_b24d, RemoteButton::Hulu),
    (0x1_57e3_b44b, RemoteButton::Right),
    (0x1_57e3_c03f, RemoteButton::Home),
    (0x1_57e3_cc33, RemoteButton::Down),
    (0x1_57e3_e817, RemoteButton::Power),
    (0x1_57e3_f00f, RemoteButton::VolumeUp),
];

/// Codes at or below this are line noise and are dropped without logging.
const NOISE_FLOOR: u64 = 0xFF;

impl RemoteButton {
    /// Look up the button a decoded code belongs to.
    #[must_use]
    pub fn from_code(code: u64) -> Option<Self> {
        BUTTON_CODES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|&(_, button)| button)
    }

    /// LED command sent when this button is pressed.
    #[must_use]
    pub const fn command(self) -> &'static str {
        match self {
            Self::Power => "color 0 0 0 0",
            Self::Netflix => "color 255 0 0 255",
            Self::Mute => "color 255 255 255 255",
            Self::DisneyPlus => "read",
            Self::Hulu => "read 2",
            Self::Left => "fade",
            Self::Right => "random",
            Self::Ok => "rainbow",
            Self::Back => "scroll",
            Self::Home => "cascade",
            Self::Vudu => "cylon",
            Self::Up => "modify increase brightness",
            Self::Down => "modify decrease brightness",
            Self::Arrow => "modify increase r",
            Self::Rewind => "modify decrease r",
            Self::Moon => "modify increase g",
            Self::PlayPause => "modify decrease g",
            Self::Star => "modify increase b",
            Self::FastForward => "modify decrease b",
            Self::VolumeUp => "modify increase w",
            Self::VolumeDown => "modify decrease w",
        }
    }
}

/// Actor that drains the IR frame queue and forwards button commands to the LED engine.
///
/// A repeat of the same button within `echo_gap_us` is a held key and is not forwarded.
///
/// # Examples
/// ```
/// use window_light::Config;
/// use window_light::ir::{IrDecoder, IrFrame, IrFrameQueue};
/// use window_light::ir_mapping::RemoteMapper;
/// use window_light::mailbox::Mailbox;
/// use window_light::stop_flag::StopFlag;
///
/// static IR_FRAMES: IrFrameQueue = IrDecoder::new_static();
/// static LED_MAILBOX: Mailbox = Mailbox::new();
/// static STOP: StopFlag = StopFlag::new();
///
/// let mut remote = RemoteMapper::new(&Config::default(), &IR_FRAMES, &LED_MAILBOX, &STOP);
/// remote.handle_frame(IrFrame { code: 0x1_57e3_54ab, timestamp_us: 1_000_000 });
/// let message = LED_MAILBOX.try_receive().expect("command forwarded");
/// assert_eq!(message.payload.as_str(), "rainbow");
/// ```
pub struct RemoteMapper<'a> {
    frames: &'a IrFrameQueue,
    led_mailbox: &'a Mailbox,
    stop: &'a StopFlag,
    config: Config,
    last_button: Option<RemoteButton>,
    last_timestamp_us: u64,
}

impl<'a> RemoteMapper<'a> {
    #[must_use]
    pub fn new(
        config: &Config,
        frames: &'a IrFrameQueue,
        led_mailbox: &'a Mailbox,
        stop: &'a StopFlag,
    ) -> Self {
        Self {
            frames,
            led_mailbox,
            stop,
            config: config.clone(),
            last_button: None,
            last_timestamp_us: 0,
        }
    }

    /// Run until the stop flag is raised.
    ///
    /// # Errors
    /// Never fails today; the signature matches the other actors.
    pub async fn run(&mut self) -> Result<()> {
        info!("remote mapper started");
        while !self.stop.is_raised() {
            if let Ok(frame) = with_timeout(self.config.ir_poll, self.frames.receive()).await {
                self.handle_frame(frame);
            }
        }
        info!("remote mapper stopped");
        Ok(())
    }

    /// Interpret one frame, forwarding a command if it is a new press.
    pub fn handle_frame(&mut self, frame: IrFrame) {
        let Some(button) = RemoteButton::from_code(frame.code) else {
            if frame.code > NOISE_FLOOR {
                debug!("IR garbage {=u64:#x}", frame.code);
            }
            return;
        };

        let gap_us = frame.timestamp_us.saturating_sub(self.last_timestamp_us);
        if self.last_button == Some(button) && gap_us < self.config.echo_gap_us {
            debug!("echo on {} button, gap {=u64}us", button, gap_us);
        } else {
            let command = button.command();
            debug!("{} pressed, sending {=str}", button, command);
            self.led_mailbox.send(Message::new(Sender::Remote, 0, command));
        }
        self.last_button = Some(button);
        self.last_timestamp_us = frame.timestamp_us;
    }
}
