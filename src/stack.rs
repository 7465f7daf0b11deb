//! # TCP client
//!
//! A single TCP connection to a named host. The modem resolves the host name itself.
//!
//! ## Example
//!
//! ````
//! # use esp8266_at::example::{ExampleSerial, ExampleTimer};
//! # use esp8266_at::wifi::Adapter;
//! #
//! let mut adapter: Adapter<_, _, _, _, 1_000> = Adapter::new(ExampleSerial::default(), ExampleTimer::default());
//!
//! // Creating a TCP connection
//! adapter.connect("example.com", 80).unwrap();
//! assert_eq!(Some("example.com"), adapter.connected_host());
//!
//! // Requesting a page. The response is printed to the debug sink, if any.
//! adapter.request("/").unwrap();
//! adapter.find(Some(b"Unlink".as_slice()), true).unwrap();
//!
//! // Closing connection
//! adapter.close().unwrap();
//! assert_eq!(None, adapter.connected_host());
//! ````
use crate::commands::{CloseSocketCommand, ConnectCommand, TransmissionPrepareCommand, MAX_HOST_LENGTH};
use crate::framer::Error as FramerError;
use crate::reset::ResetPin;
use crate::wifi::Adapter;
use core::str::FromStr;
use embedded_io::{Read, ReadReady, Write};
use fugit_timer::Timer;
use heapless::String;

/// Length of the fixed parts of a GET request:
/// `GET ` (4) + ` HTTP/1.1\r\nHost: ` (17) + `\r\n\r\n` (4)
pub const REQUEST_OVERHEAD: usize = 25;

/// Network related errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// TCP connect command failed or was not confirmed by `Linked`
    ConnectError(FramerError),

    /// Host name exceeds [MAX_HOST_LENGTH]
    InvalidHostLength,

    /// No TCP connection is open
    NotConnected,

    /// Connection is closed internally, but closing was not confirmed by the modem
    UnconfirmedClose(FramerError),

    /// Preparing the transmission failed (CIPSEND command)
    TransmissionStartFailed(FramerError),

    /// Transmission of data failed
    SendFailed(FramerError),
}

impl<'d, T, TM, R, D, const TIMER_HZ: u32> Adapter<'d, T, TM, R, D, TIMER_HZ>
where
    T: Read + ReadReady + Write,
    TM: Timer<TIMER_HZ>,
    R: ResetPin,
    D: Write,
{
    /// Opens a TCP connection to the given host.
    ///
    /// On failure the session remains unchanged.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), Error> {
        let host = String::<MAX_HOST_LENGTH>::from_str(host).map_err(|_| Error::InvalidHostLength)?;

        self.link.send_command(ConnectCommand::tcp(host.clone(), port))?;
        debug!("TCP connection to {}:{} established", host.as_str(), port);
        self.session.host = Some(host);
        Ok(())
    }

    /// Closes the current TCP connection.
    ///
    /// The connection is considered closed even if the modem does not confirm by `Unlink`. In
    /// this case [Error::UnconfirmedClose] is returned.
    pub fn close(&mut self) -> Result<(), Error> {
        let result = self.link.send_command(CloseSocketCommand);

        // Cleared even on error, the connection would be lost otherwise
        self.session.host = None;

        result?;
        Ok(())
    }

    /// Returns the host of the current TCP connection
    pub fn connected_host(&self) -> Option<&str> {
        self.session.host.as_ref().map(|host| host.as_str())
    }

    /// Sends a HTTP GET request for the given path on the current connection.
    ///
    /// Returns as soon as the modem confirmed the transmission. The response needs to be handled
    /// by the caller, e.g. by [Adapter::find] in chunked mode.
    pub fn request(&mut self, path: &str) -> Result<(), Error> {
        self.request_bytes(path.as_bytes())
    }

    /// Same as [Adapter::request], but the path is given as raw bytes
    pub fn request_bytes(&mut self, path: &[u8]) -> Result<(), Error> {
        let Some(host) = self.session.host.clone() else {
            return Err(Error::NotConnected);
        };

        let length = REQUEST_OVERHEAD + path.len() + host.len();
        self.link.send_command(TransmissionPrepareCommand::new(length))?;

        self.send_request(path, host.as_bytes()).map_err(Error::SendFailed)
    }

    /// Writes the request line + host header and waits for the send confirmation.
    /// Written bytes need to match the announced length exactly, otherwise the modem keeps waiting.
    fn send_request(&mut self, path: &[u8], host: &[u8]) -> Result<(), FramerError> {
        self.link.write_all(b"GET ")?;
        self.link.write_all(path)?;
        self.link.write_all(b" HTTP/1.1\r\nHost: ")?;
        self.link.write_all(host)?;
        self.link.write_all(b"\r\n\r\n")?;

        // SEND OK
        self.link.find(None, false)
    }
}
