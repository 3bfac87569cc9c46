//! Control plane for an addressable RGBW window light: IR remote, off button, LED animations,
//! wake alarm, and climate log, connected by mailboxes.
#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module below.
mod logging;

pub mod alarm_clock;
pub mod alarm_table;
pub mod button;
pub mod command;
pub mod config;
pub mod control_plane;
pub mod dispatcher;
mod error;
pub mod hardware;
pub mod ir;
pub mod ir_mapping;
pub mod led_engine;
pub mod led_strip;
pub mod mailbox;
pub mod mode;
pub mod sensor;
pub mod stop_flag;

// Re-export commonly used items
pub use config::Config;
pub use error::{Error, Result};
