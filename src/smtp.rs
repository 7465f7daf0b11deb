//! # Mail submission
//!
//! Thin SMTP layer on top of an open TCP connection. Every SMTP line is sent as separate
//! transmission (`AT+CIPSEND`) and confirmed by the expected reply code of the server.
//!
//! The session just borrows the [Adapter] and uses its raw command primitives.
//!
//! ## Example
//!
//! ````
//! # use esp8266_at::example::{ExampleSerial, ExampleTimer};
//! # use esp8266_at::smtp::MailSession;
//! # use esp8266_at::wifi::Adapter;
//! #
//! let mut adapter: Adapter<_, _, _, _, 1_000> = Adapter::new(ExampleSerial::default(), ExampleTimer::default());
//! adapter.connect("mail.example.com", 25).unwrap();
//!
//! let mut mail = MailSession::new(&mut adapter);
//! mail.hello("device.local").unwrap();
//! ````
use crate::framer::Error as FramerError;
use crate::reset::ResetPin;
use crate::wifi::Adapter;
use embedded_io::{Read, ReadReady, Write};
use fugit_timer::Timer;
use heapless::Vec;
use numtoa::NumToA;

/// Max. length of a single SMTP line, without line terminator
pub const MAX_LINE_LENGTH: usize = 256;

/// Possible errors when sending SMTP commands
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Transmission was not prompted by the modem (CIPSEND command)
    TransmissionStartFailed(FramerError),

    /// Expected reply was not received
    CommandFailed(FramerError),

    /// Line exceeds [MAX_LINE_LENGTH]
    LineTooLong,
}

/// SMTP client borrowing an adapter with an open TCP connection
pub struct MailSession<'a, 'd, T, TM, R, D, const TIMER_HZ: u32>
where
    T: Read + ReadReady + Write,
    TM: Timer<TIMER_HZ>,
    R: ResetPin,
    D: Write,
{
    adapter: &'a mut Adapter<'d, T, TM, R, D, TIMER_HZ>,
}

impl<'a, 'd, T, TM, R, D, const TIMER_HZ: u32> MailSession<'a, 'd, T, TM, R, D, TIMER_HZ>
where
    T: Read + ReadReady + Write,
    TM: Timer<TIMER_HZ>,
    R: ResetPin,
    D: Write,
{
    pub fn new(adapter: &'a mut Adapter<'d, T, TM, R, D, TIMER_HZ>) -> Self {
        Self { adapter }
    }

    /// Sends the given line (CRLF gets appended) and waits for `ack`, or `OK\r\n` if None
    pub fn send_command(&mut self, line: &[u8], ack: Option<&[u8]>) -> Result<(), Error> {
        if line.len() > MAX_LINE_LENGTH {
            return Err(Error::LineTooLong);
        }

        let mut digits = [0x0; 20];
        let length = (line.len() + 2) as u64;

        let mut command: Vec<u8, 32> = Vec::new();
        command.extend_from_slice(b"AT+CIPSEND=").map_err(|_| Error::LineTooLong)?;
        command
            .extend_from_slice(length.numtoa(10, &mut digits))
            .map_err(|_| Error::LineTooLong)?;

        self.adapter
            .send_raw(&command, Some(b"> ".as_slice()))
            .map_err(Error::TransmissionStartFailed)?;

        self.adapter.write_raw(line).map_err(Error::CommandFailed)?;
        self.adapter.write_raw(b"\r\n").map_err(Error::CommandFailed)?;
        self.adapter.find(ack, false).map_err(Error::CommandFailed)
    }

    /// Greets the server by `HELO`
    pub fn hello(&mut self, domain: &str) -> Result<(), Error> {
        self.send_parts(&[b"HELO ", domain.as_bytes()], b"250")
    }

    /// Announces the sender address
    pub fn mail_from(&mut self, address: &str) -> Result<(), Error> {
        self.send_parts(&[b"MAIL FROM:<", address.as_bytes(), b">"], b"250")
    }

    /// Adds a recipient address
    pub fn recipient(&mut self, address: &str) -> Result<(), Error> {
        self.send_parts(&[b"RCPT TO:<", address.as_bytes(), b">"], b"250")
    }

    /// Starts the message body. Body lines are sent by [MailSession::send_command] without ack.
    pub fn data(&mut self) -> Result<(), Error> {
        self.send_command(b"DATA", Some(b"354".as_slice()))
    }

    /// Terminates the message body
    pub fn end_data(&mut self) -> Result<(), Error> {
        self.send_command(b".", Some(b"250".as_slice()))
    }

    /// Ends the SMTP session
    pub fn quit(&mut self) -> Result<(), Error> {
        self.send_command(b"QUIT", Some(b"221".as_slice()))
    }

    fn send_parts(&mut self, parts: &[&[u8]], ack: &[u8]) -> Result<(), Error> {
        let mut line: Vec<u8, MAX_LINE_LENGTH> = Vec::new();
        for part in parts {
            line.extend_from_slice(part).map_err(|_| Error::LineTooLong)?;
        }

        self.send_command(&line, Some(ack))
    }
}
