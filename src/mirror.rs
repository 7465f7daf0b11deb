//! # Debug mirror
//!
//! Duplicates all traffic between host and modem to an optional secondary sink, e.g. a console
//! UART. The transcript is line oriented:
//!
//! ````text
//! ---> AT+CIPSTART="TCP","example.com",80
//! <--- 'CONNECT
//!
//! Linked'
//! ````
use core::convert::Infallible;
use embedded_io::{ErrorType, Read, ReadReady, Write};

/// Placeholder sink type for adapters without debug output
pub enum NoDebug {}

impl ErrorType for NoDebug {
    type Error = Infallible;
}

impl Write for NoDebug {
    fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
        match *self {}
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }
}

impl Read for NoDebug {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        match *self {}
    }
}

impl ReadReady for NoDebug {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        match *self {}
    }
}

/// Currently open transcript line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Idle,
    Writing,
    Reading,
}

/// Tees bytes to the debug sink, if one is configured
pub(crate) struct DebugMirror<'d, D: Write> {
    sink: Option<&'d mut D>,
    direction: Direction,
}

impl<'d, D: Write> DebugMirror<'d, D> {
    pub(crate) fn new(sink: Option<&'d mut D>) -> Self {
        Self {
            sink,
            direction: Direction::Idle,
        }
    }

    /// Copies a byte sent to the modem, opening a write line if necessary
    pub(crate) fn echo_write(&mut self, byte: u8) {
        if self.direction != Direction::Writing {
            self.emit(b"---> ");
            self.direction = Direction::Writing;
        }

        self.emit(&[byte]);
    }

    /// Opens a read line. Implicitly ends a pending write line.
    pub(crate) fn begin_read(&mut self) {
        if self.direction != Direction::Reading {
            self.emit(b"<--- '");
            self.direction = Direction::Reading;
        }
    }

    /// Copies a byte received from the modem
    pub(crate) fn echo_read(&mut self, byte: u8) {
        self.emit(&[byte]);
    }

    /// Closes the current read line
    pub(crate) fn end_read(&mut self) {
        if self.direction == Direction::Reading {
            self.emit(b"'\r\n");
            self.direction = Direction::Idle;
        }
    }

    /// Writes a message outside the transcript, e.g. a banner
    pub(crate) fn message(&mut self, text: &[u8]) {
        self.emit(text);
        self.direction = Direction::Idle;
    }

    pub(crate) fn is_present(&self) -> bool {
        self.sink.is_some()
    }

    pub(crate) fn sink(&mut self) -> Option<&mut D> {
        self.sink.as_deref_mut()
    }

    #[cfg(test)]
    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    /// Sink errors are ignored, debug output must never affect the modem session
    fn emit(&mut self, data: &[u8]) {
        if let Some(sink) = self.sink.as_deref_mut() {
            let _ = sink.write_all(data);
        }
    }
}
