//! # Hardware reset line
//!
//! The ESP8266 is reset by momentarily pulling RST to GND. The pin must never be driven high, as
//! the modem is a 3.3V device. So the line is released to high impedance instead.
use embedded_hal::digital::OutputPin;

/// Capability for pulsing the modem reset line
pub trait ResetPin {
    /// Upstream pin error
    type Error: core::fmt::Debug;

    /// Pulls the reset line to GND
    fn drive_low(&mut self) -> Result<(), Self::Error>;

    /// Releases the reset line to high impedance
    fn release(&mut self) -> Result<(), Self::Error>;
}

/// Placeholder for adapters without a connected reset line
pub enum NoResetPin {}

impl ResetPin for NoResetPin {
    type Error = core::convert::Infallible;

    fn drive_low(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }
}

/// Reset line backed by an open drain [OutputPin]
///
/// The pin needs to be configured in open drain mode, so that setting it high releases the line.
pub struct OpenDrainResetPin<P: OutputPin> {
    pin: P,
}

impl<P: OutputPin> OpenDrainResetPin<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Returns the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> ResetPin for OpenDrainResetPin<P> {
    type Error = P::Error;

    fn drive_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }
}
