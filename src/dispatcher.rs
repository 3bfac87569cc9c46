//! Routing one client command line to a built-in, a macro, or the LED engine.
//!
//! See [`Dispatcher`] for usage examples.

use core::fmt::Write as _;

use embassy_time::Instant;
use heapless::String;

use crate::command::Command;
use crate::config::Config;
use crate::hardware::Supervisor;
use crate::mailbox::{Mailbox, Message, Payload, Sender, truncated};
use crate::mode::{MODES, reply_fmt};
use crate::stop_flag::StopFlag;
use crate::{Error, Result};

// ===== Public API ===========================================================

/// Largest reply the dispatcher produces; `help` is the longest.
pub const REPLY_CAPACITY: usize = 4096;

/// One reply line (it may contain embedded newlines) for the transport.
pub type Reply = String<REPLY_CAPACITY>;

/// What the transport should do with a handled line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Send this text back to the client.
    Reply(Reply),
    /// The client sent an empty line; close the connection.
    Close,
}

/// Mailboxes the dispatcher talks to.
#[derive(Copy, Clone)]
pub struct Routes<'a> {
    pub led: &'a Mailbox,
    pub alarm_clock: &'a Mailbox,
    pub sensor: &'a Mailbox,
    /// The dispatcher's own reply mailbox.
    pub replies: &'a Mailbox,
}

/// Parses client lines and mediates request/reply with the other actors.
///
/// At most one request is outstanding at a time. Each request carries a fresh `seq`, and a
/// reply with any other `seq` (a late answer to a request that already timed out) is dropped.
///
/// # Examples
/// Macros are expanded before anything is sent to the LED engine:
///
/// ```
/// use window_light::dispatcher::expand_macro;
///
/// let expanded = expand_macro("rg", &["200"]).expect("is a macro")?;
/// assert_eq!(expanded.as_str(), "color 200 200 0 0");
/// let expanded = expand_macro("off", &[]).expect("is a macro")?;
/// assert_eq!(expanded.as_str(), "color 0 0 0 0");
/// assert!(expand_macro("rainbow", &[]).is_none());
/// # Ok::<(), window_light::Error>(())
/// ```
pub struct Dispatcher<'a> {
    routes: Routes<'a>,
    supervisor: &'a mut dyn Supervisor,
    stop: &'a StopFlag,
    config: Config,
    seq: u32,
}

impl<'a> Dispatcher<'a> {
    #[must_use]
    pub fn new(
        config: &Config,
        routes: Routes<'a>,
        supervisor: &'a mut dyn Supervisor,
        stop: &'a StopFlag,
    ) -> Self {
        Self {
            routes,
            supervisor,
            stop,
            config: config.clone(),
            seq: 0,
        }
    }

    /// Handle one line from a client.
    ///
    /// The line is lower-cased and a trailing `\r` removed. An empty line asks the transport to
    /// close the connection.
    pub async fn handle(&mut self, line: &str) -> Dispatch {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            info!("client ended connection");
            return Dispatch::Close;
        }
        let mut lowered: Payload = truncated(line);
        lowered.make_ascii_lowercase();
        debug!("received command {=str}", lowered.as_str());

        let Some(command) = Command::parse(&lowered) else {
            return Dispatch::Reply(text("Did nothing, no command given"));
        };
        let reply = match command.name {
            "help" => help(),
            "alarm" | "snooze" => {
                let target = self.routes.alarm_clock;
                self.request(target, &lowered, "Timed out waiting for the alarm clock to respond")
                    .await
            }
            "th" | "temperature" => {
                let target = self.routes.sensor;
                self.request(target, "th", "Timed out waiting for the temperature sensor to respond")
                    .await
            }
            "restart" => self.shut_down(Shutdown::Restart),
            "reboot" => self.shut_down(Shutdown::Reboot),
            name => match expand_macro(name, &command.args) {
                Some(Ok(expanded)) => self.forward_to_led(&expanded).await,
                Some(Err(error)) => {
                    text(&reply_fmt(format_args!("Couldn't expand macro, encountered error: {error}")))
                }
                None => self.forward_to_led(&lowered).await,
            },
        };
        debug!("sending reply {=str}", reply.as_str());
        Dispatch::Reply(reply)
    }

    async fn forward_to_led(&mut self, line: &str) -> Reply {
        let target = self.routes.led;
        self.request(target, line, "Timed out waiting for the LED strip to respond")
            .await
    }

    /// Send `line` to `target` and wait up to the reply timeout for the matching answer.
    async fn request(&mut self, target: &Mailbox, line: &str, timed_out: &str) -> Reply {
        self.seq = self.seq.wrapping_add(1);
        let seq = self.seq;
        target.send(Message::new(Sender::Dispatcher, seq, line));

        let deadline = Instant::now() + self.config.reply_timeout();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.routes.replies.receive_timeout(remaining).await {
                Ok(message) if message.seq == seq => return text(&message.payload),
                Ok(message) => {
                    debug!(
                        "dropping late reply from {} (seq {=u32}, want {=u32})",
                        message.sender,
                        message.seq,
                        seq
                    );
                }
                Err(_) => {
                    warn!("{=str}", timed_out);
                    return text(timed_out);
                }
            }
        }
    }

    fn shut_down(&mut self, action: Shutdown) -> Reply {
        let (result, requested) = match action {
            Shutdown::Restart => (self.supervisor.restart(), "Restarting service"),
            Shutdown::Reboot => (self.supervisor.reboot(), "Rebooting"),
        };
        info!("{=str}", requested);
        // The dispatcher ends either way; the supervisor owns what happens next.
        self.stop.raise();
        match result {
            Ok(()) => text(requested),
            Err(error) => {
                error!("supervisor request failed: {}", error);
                text(&reply_fmt(format_args!("{requested} failed, encountered error: {error}")))
            }
        }
    }
}

#[derive(Copy, Clone)]
enum Shutdown {
    Restart,
    Reboot,
}

// ===== Macros ===============================================================

const OFF: &str = "color 0 0 0 0";
const MAX: &str = "color 255 255 255 255";

/// Expand a macro command into a `color` command.
///
/// Returns `None` if `name` is not a macro. The `rgbw` macro accepts any combination of the
/// letters `r`, `g`, `b`, `w`, each at most once, in any order.
///
/// # Errors
/// The inner result is [`Error::MissingIntensity`] if an `rgbw` macro has no intensity.
#[must_use]
pub fn expand_macro(name: &str, args: &[&str]) -> Option<Result<Payload>> {
    match name {
        "off" | "o" => Some(Ok(truncated(OFF))),
        "max" | "m" => Some(Ok(truncated(MAX))),
        "c" => Some(expand_color(args)),
        _ if is_channel_set(name) => Some(expand_rgbw(name, args)),
        _ => None,
    }
}

fn is_channel_set(name: &str) -> bool {
    let mut seen = [false; 4];
    !name.is_empty()
        && name.chars().all(|letter| {
            let Some(index) = "rgbw".find(letter) else {
                return false;
            };
            seen.get_mut(index)
                .is_some_and(|slot| !core::mem::replace(slot, true))
        })
}

fn expand_rgbw(name: &str, args: &[&str]) -> Result<Payload> {
    let intensity = args.first().ok_or(Error::MissingIntensity)?;
    let mut out = Payload::new();
    out.push_str("color")?;
    for letter in ['r', 'g', 'b', 'w'] {
        let value = if name.contains(letter) { *intensity } else { "0" };
        write!(out, " {value}")?;
    }
    Ok(out)
}

fn expand_color(args: &[&str]) -> Result<Payload> {
    let mut out = Payload::new();
    out.push_str("color")?;
    for arg in args {
        write!(out, " {arg}")?;
    }
    Ok(out)
}

// ===== Help =================================================================

const MACRO_HELP: [(&str, &str, &str); 4] = [
    ("r?g?b?w?", "0-255", "Applies the specified intensity across the specified colors"),
    ("off|o", "none", "Turn the lights off"),
    ("max|m", "none", "Turn the lights to the highest intensity"),
    ("c", "same as color", "Expands to color"),
];

const COMMAND_HELP: [(&str, &str, &str); 8] = [
    ("help", "none", "Displays a list of commands and what they do"),
    ("alarm", "none", "list alarms"),
    ("alarm", "3-letter day/\"weekend\"/\"weekday\", time", "set alarm"),
    ("th", "none", "display temperature (F) and % relative humidity measurement"),
    ("snooze", "on", "snooze next alarm"),
    ("snooze", "off", "don't snooze next alarm"),
    ("restart", "none", "restart service"),
    ("reboot", "none", "reboot Pi"),
];

/// Render the `help` table: macros, built-in commands, then modes.
#[must_use]
pub fn help() -> Reply {
    let mut out = Reply::new();
    // A full buffer just truncates the table.
    let _ = render_help(&mut out);
    out
}

fn render_help(out: &mut Reply) -> core::fmt::Result {
    row(out, "Name", "Argument(s)", "Description")?;
    out.write_str("================================ MACROS =================================\n")?;
    for (name, arg, description) in MACRO_HELP {
        row(out, name, arg, description)?;
    }
    out.write_str("=============================== COMMANDS ================================\n")?;
    for (name, arg, description) in COMMAND_HELP {
        row(out, name, arg, description)?;
    }
    out.write_str("================================ MODES ==================================\n")?;
    for entry in &MODES {
        for (arg, description) in entry.help {
            row(out, entry.name, arg, description)?;
        }
    }
    Ok(())
}

fn row(out: &mut Reply, name: &str, arg: &str, description: &str) -> core::fmt::Result {
    writeln!(out, "{name:<16}{arg:<32}{description}")
}

fn text(reply: &str) -> Reply {
    truncated::<REPLY_CAPACITY>(reply)
}
