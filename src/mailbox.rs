//! Point-to-point message queues between actors.
//!
//! See [`Mailbox`] for usage examples.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel as EmbassyChannel;
use embassy_time::{Duration, TimeoutError, with_timeout};
use heapless::String;
use portable_atomic::{AtomicU32, Ordering};

// ===== Public API ===========================================================

/// Pending messages a mailbox holds before the oldest is evicted.
pub const MAILBOX_CAPACITY: usize = 16;

/// Maximum length of one command or reply carried between actors.
pub const PAYLOAD_CAPACITY: usize = 192;

/// Text carried by a [`Message`].
pub type Payload = String<PAYLOAD_CAPACITY>;

/// Identity of the actor that produced a [`Message`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sender {
    Dispatcher,
    Remote,
    Button,
    AlarmClock,
    LedEngine,
    Sensor,
}

/// One command or reply moved into exactly one mailbox.
///
/// `seq` ties a reply to the request that caused it. Actors that answer copy the request's
/// `seq` into the reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub seq: u32,
    pub payload: Payload,
}

impl Message {
    /// Build a message, truncating `text` at a character boundary if it is too long.
    #[must_use]
    pub fn new(sender: Sender, seq: u32, text: &str) -> Self {
        Self {
            sender,
            seq,
            payload: truncated(text),
        }
    }
}

/// A bounded inbox whose `send` never blocks.
///
/// When the inbox is full, the oldest pending message is dropped (and logged) to make room, so
/// a receiver that stops polling cannot stall its senders or grow without bound.
///
/// # Examples
/// ```
/// # embassy_futures::block_on(async {
/// use embassy_time::Duration;
/// use window_light::mailbox::{Mailbox, Message, Sender};
///
/// static LED_MAILBOX: Mailbox = Mailbox::named("led");
///
/// LED_MAILBOX.send(Message::new(Sender::Remote, 0, "rainbow"));
/// let message = LED_MAILBOX
///     .receive_timeout(Duration::from_millis(10))
///     .await
///     .expect("message was queued");
/// assert_eq!(message.payload.as_str(), "rainbow");
/// assert!(LED_MAILBOX.try_receive().is_none());
/// assert_eq!(LED_MAILBOX.dropped(), 0);
/// # });
/// ```
pub struct Mailbox {
    name: &'static str,
    channel: EmbassyChannel<CriticalSectionRawMutex, Message, MAILBOX_CAPACITY>,
    dropped: AtomicU32,
}

impl Mailbox {
    /// Create an empty, unnamed mailbox, usable in a `static`.
    #[must_use]
    pub const fn new() -> Self {
        Self::named("mailbox")
    }

    /// Create an empty mailbox whose `name` appears in its log lines.
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            channel: EmbassyChannel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Messages evicted so far because the mailbox was full.
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Enqueue `message` without blocking.
    pub fn send(&self, message: Message) {
        let mut message = message;
        loop {
            match self.channel.try_send(message) {
                Ok(()) => return,
                Err(embassy_sync::channel::TrySendError::Full(rejected)) => {
                    if let Ok(dropped) = self.channel.try_receive() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            "{=str} mailbox full, dropped oldest message from {} (seq {=u32})",
                            self.name,
                            dropped.sender,
                            dropped.seq
                        );
                    }
                    message = rejected;
                }
            }
        }
    }

    /// Take the next message if one is waiting.
    pub fn try_receive(&self) -> Option<Message> {
        self.channel.try_receive().ok()
    }

    /// Wait for the next message.
    pub async fn receive(&self) -> Message {
        self.channel.receive().await
    }

    /// Wait at most `timeout` for the next message.
    ///
    /// # Errors
    /// Returns [`TimeoutError`] if nothing arrived in time.
    pub async fn receive_timeout(&self, timeout: Duration) -> Result<Message, TimeoutError> {
        with_timeout(timeout, self.channel.receive()).await
    }

    /// Discard every pending message.
    pub fn clear(&self) {
        self.channel.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy `text` into a [`Payload`], cutting at the last character boundary that fits.
#[must_use]
pub fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut end = text.len().min(N);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::new();
    // `end <= N` and lands on a boundary, so this fits.
    let _ = out.push_str(text.get(..end).unwrap_or_default());
    out
}
