//! # ESP8266 AT driver
//!
//! Blocking driver for ESP8266 WiFi modems running the AT command firmware. Covers resetting the
//! modem, joining an access point and a single TCP connection for simple HTTP and SMTP clients.
//!
//! The modem is attached by any serial transport implementing [embedded_io] traits. Timeouts are
//! measured by a [fugit_timer::Timer].
//!
//! * [wifi::Adapter]: Session object, reset and access point handling
//! * [stack]: TCP connection and HTTP GET requests
//! * [smtp::MailSession]: Mail submission on top of an open connection
//! * [framer]: Response matching, the core of all operations
//!
//! All traffic may be mirrored to a debug sink, s. [wifi::Adapter::with_debug].
#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]

// Needs to be declared first, so that the logging macros are available in all modules
mod fmt;

pub use atat;

pub mod commands;
pub mod framer;
pub mod mirror;
pub mod reset;
pub mod responses;
pub mod smtp;
pub mod stack;
pub mod timeouts;
pub mod wifi;

#[cfg(feature = "examples")]
pub mod example;

#[cfg(test)]
mod tests;
