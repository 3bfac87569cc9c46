//! Tunable constants for the control plane, injected into each actor's constructor.
//!
//! See [`Config`] for the defaults.

use embassy_time::Duration;
use heapless::String;
use serde::{Deserialize, Serialize};

// ===== Defaults =============================================================

/// Two identical remote codes closer than this are one held key.
pub const ECHO_GAP_US: u64 = 500_000;
/// A button high pulse must last longer than this to count as a press.
pub const DEBOUNCE_US: u64 = 25_000;
/// Silence longer than this ends an IR frame.
pub const IR_IDLE_US: u64 = 10_000;
/// A low gap longer than this is a logical one.
pub const IR_BIT_THRESHOLD_US: u64 = 1_125;
/// Length of the wake ramp plus hold, and of the arm window.
pub const ALARM_DURATION_SECS: u32 = 1_200;
/// Idle time after which the transport drops a client.
pub const CLIENT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);
/// Bounded wait used by the polling actors between stop-flag checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Time between periodic temperature/humidity samples.
pub const SENSOR_INTERVAL: Duration = Duration::from_secs(300);
/// Mode the LED engine starts in.
pub const INITIAL_MODE: &str = "color 0 0 0 0";

const DEFAULT_RNG_SEED: u64 = 0x5EED_0F7A_11C0_FFEE;

// ===== Public API ===========================================================

/// Runtime configuration shared by every actor.
///
/// All fields are public so a board crate can override individual constants:
///
/// ```
/// use window_light::Config;
///
/// let config = Config {
///     debounce_us: 10_000,
///     ..Config::default()
/// };
/// assert_eq!(config.reply_timeout().as_secs(), 60);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub echo_gap_us: u64,
    pub debounce_us: u64,
    pub ir_idle_us: u64,
    pub ir_bit_threshold_us: u64,
    pub alarm_duration_secs: u32,
    #[serde(with = "duration_micros")]
    pub client_idle_timeout: Duration,
    #[serde(with = "duration_micros")]
    pub ir_poll: Duration,
    #[serde(with = "duration_micros")]
    pub button_poll: Duration,
    #[serde(with = "duration_micros")]
    pub alarm_poll: Duration,
    #[serde(with = "duration_micros")]
    pub sensor_poll: Duration,
    #[serde(with = "duration_micros")]
    pub sensor_interval: Duration,
    pub initial_mode: String<32>,
    pub rng_seed: u64,
}

impl Config {
    /// How long the dispatcher waits for another actor to answer.
    #[must_use]
    pub const fn reply_timeout(&self) -> Duration {
        Duration::from_ticks(self.client_idle_timeout.as_ticks() / 2)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut initial_mode = String::new();
        // INITIAL_MODE is shorter than the capacity.
        let _ = initial_mode.push_str(INITIAL_MODE);
        Self {
            echo_gap_us: ECHO_GAP_US,
            debounce_us: DEBOUNCE_US,
            ir_idle_us: IR_IDLE_US,
            ir_bit_threshold_us: IR_BIT_THRESHOLD_US,
            alarm_duration_secs: ALARM_DURATION_SECS,
            client_idle_timeout: CLIENT_IDLE_TIMEOUT,
            ir_poll: POLL_INTERVAL,
            button_poll: POLL_INTERVAL,
            alarm_poll: POLL_INTERVAL,
            sensor_poll: POLL_INTERVAL,
            sensor_interval: SENSOR_INTERVAL,
            initial_mode,
            rng_seed: DEFAULT_RNG_SEED,
        }
    }
}

mod duration_micros {
    use embassy_time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_micros())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_micros)
    }
}
