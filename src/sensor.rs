//! Periodic temperature/humidity sampling into the climate log.

use embassy_time::{Instant, with_timeout};

use crate::config::Config;
use crate::hardware::{Climate, ClimateLog, ClimateRecord, ClimateSensor, WallClock};
use crate::mailbox::{Mailbox, Message, Payload, Sender};
use crate::mode::reply_fmt;
use crate::stop_flag::StopFlag;
use crate::Result;

/// Convert Celsius to Fahrenheit.
#[must_use]
#[allow(clippy::suboptimal_flops, reason = "f32::mul_add is not in core")]
pub fn fahrenheit(celsius: f32) -> f32 {
    32.0 + 1.8 * celsius
}

/// Actor that samples the sensor every `sensor_interval`, and on request.
///
/// Every sample is appended to the log. A request from the [`Sender::Dispatcher`] is answered
/// with `"{temp:.1}F, {rh:.1}%"`.
pub struct ClimateMonitor<'a> {
    sensor: &'a mut dyn ClimateSensor,
    log: &'a mut dyn ClimateLog,
    clock: &'a dyn WallClock,
    mailbox: &'a Mailbox,
    reply_to: &'a Mailbox,
    stop: &'a StopFlag,
    config: Config,
}

impl<'a> ClimateMonitor<'a> {
    #[must_use]
    pub fn new(
        config: &Config,
        sensor: &'a mut dyn ClimateSensor,
        log: &'a mut dyn ClimateLog,
        clock: &'a dyn WallClock,
        mailbox: &'a Mailbox,
        reply_to: &'a Mailbox,
        stop: &'a StopFlag,
    ) -> Self {
        Self {
            sensor,
            log,
            clock,
            mailbox,
            reply_to,
            stop,
            config: config.clone(),
        }
    }

    /// Run until the stop flag is raised.
    ///
    /// # Errors
    /// A failed periodic read or log append is returned as a fault.
    pub async fn run(&mut self) -> Result<()> {
        info!("climate monitor started");
        let mut due = Instant::now();
        while !self.stop.is_raised() {
            if Instant::now() >= due {
                self.sample()?;
                due = Instant::now() + self.config.sensor_interval;
            }
            let wait = due
                .saturating_duration_since(Instant::now())
                .min(self.config.sensor_poll);
            if let Ok(message) = with_timeout(wait, self.mailbox.receive()).await {
                let reply = self.answer();
                if message.sender == Sender::Dispatcher {
                    self.reply_to
                        .send(Message::new(Sender::Sensor, message.seq, &reply));
                }
            }
        }
        info!("climate monitor stopped");
        Ok(())
    }

    /// Read the sensor now and render the reply text.
    pub fn answer(&mut self) -> Payload {
        match self.sample() {
            Ok(record) => reply_fmt(format_args!(
                "{:.1}F, {:.1}%",
                record.fahrenheit, record.relative_humidity
            )),
            Err(error) => {
                warn!("climate request failed: {}", error);
                reply_fmt(format_args!("Couldn't read temperature, encountered error: {error}"))
            }
        }
    }

    /// Read the sensor once and append the sample to the log.
    ///
    /// # Errors
    /// Returns the sensor's or the log's error.
    pub fn sample(&mut self) -> Result<ClimateRecord> {
        let Climate {
            celsius,
            relative_humidity,
        } = self.sensor.read()?;
        let record = ClimateRecord {
            at: self.clock.now(),
            fahrenheit: fahrenheit(celsius),
            relative_humidity,
        };
        self.log.append(&record)?;
        debug!("climate sample logged");
        Ok(record)
    }
}
