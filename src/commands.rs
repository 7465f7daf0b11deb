use crate::framer::{Error as FramerError, Link, DEFAULT_ACK};
use crate::responses::NoResponse;
use crate::stack::Error as StackError;
use crate::wifi::{JoinError, ResetError};
use atat::atat_derive::AtatCmd;
use atat::heapless::String;
use atat::AtatCmd as AtatCommand;
use core::str::FromStr;
use embedded_io::{Read, ReadReady, Write};
use fugit_timer::Timer;

/// Buffer size for encoding a single command line
pub(crate) const COMMAND_BUFFER_SIZE: usize = 256;

/// Max. length of a remote host name
pub const MAX_HOST_LENGTH: usize = 128;

/// Trait for mapping command errors
pub trait CommandErrorHandler {
    type Error;

    /// Responses acknowledging the command, the first received one wins
    const ACKNOWLEDGEMENTS: &'static [&'static [u8]] = &[DEFAULT_ACK];

    /// Maps regular errors
    fn command_error(&self, error: FramerError) -> Self::Error;
}

impl<'d, T, TM, D, const TIMER_HZ: u32> Link<'d, T, TM, D, TIMER_HZ>
where
    T: Read + ReadReady + Write,
    TM: Timer<TIMER_HZ>,
    D: Write,
{
    /// Encodes the command as single CRLF terminated line and writes it to the modem
    pub(crate) fn issue<Cmd: AtatCommand>(&mut self, command: &Cmd) -> Result<(), FramerError> {
        if Cmd::MAX_LEN > COMMAND_BUFFER_SIZE {
            return Err(FramerError::CommandOverflow);
        }

        let mut buffer = [0x0; COMMAND_BUFFER_SIZE];
        let length = command.write(&mut buffer);
        trace!(
            "Sending command: {}",
            core::str::from_utf8(&buffer[..length]).unwrap_or("<binary>").trim_end()
        );

        self.write_all(&buffer[..length])
    }

    /// Sends a command and awaits one of its acknowledgements. Returns the index of the received one.
    pub(crate) fn send_command<Cmd: AtatCommand + CommandErrorHandler>(
        &mut self,
        command: Cmd,
    ) -> Result<usize, Cmd::Error> {
        self.issue(&command).map_err(|error| command.command_error(error))?;
        self.find_any(Cmd::ACKNOWLEDGEMENTS, false)
            .map_err(|error| command.command_error(error))
    }

    /// Writes the given line followed by CRLF
    pub(crate) fn issue_raw(&mut self, line: &[u8]) -> Result<(), FramerError> {
        self.write_all(line)?;
        self.write_all(b"\r\n")
    }
}

/// Restarts the module
#[derive(Clone, Default, AtatCmd)]
#[at_cmd("+RST", NoResponse)]
pub struct RestartCommand;

impl CommandErrorHandler for RestartCommand {
    type Error = ResetError;

    fn command_error(&self, error: FramerError) -> Self::Error {
        ResetError::BootMarker(error)
    }
}

/// Disables the command echo
#[derive(Clone, Default, AtatCmd)]
#[at_cmd("E0", NoResponse)]
pub struct EchoOffCommand;

impl CommandErrorHandler for EchoOffCommand {
    type Error = ResetError;

    fn command_error(&self, error: FramerError) -> Self::Error {
        ResetError::EchoOff(error)
    }
}

/// Sets the WIFI mode
#[derive(Clone, Default, AtatCmd)]
#[at_cmd("+CWMODE", NoResponse)]
pub struct WifiModeCommand {
    /// WIFI mode:
    ///     1: Station mode.
    ///     2: SoftAP mode.
    ///     3: SoftAP+Station mode.
    #[at_arg(position = 0)]
    mode: usize,
}

impl WifiModeCommand {
    pub fn station_mode() -> Self {
        Self { mode: 1 }
    }
}

impl CommandErrorHandler for WifiModeCommand {
    type Error = JoinError;

    /// Older firmware answers `no change` if the mode is already active
    const ACKNOWLEDGEMENTS: &'static [&'static [u8]] = &[DEFAULT_ACK, b"no change"];

    fn command_error(&self, error: FramerError) -> Self::Error {
        JoinError::ModeError(error)
    }
}

/// Command for joining the target WIFI access point.
///
/// SSID and password are sent as quoted strings without any escaping.
#[derive(Clone, Default, AtatCmd)]
#[at_cmd("+CWJAP", NoResponse)]
pub struct AccessPointConnectCommand {
    /// The SSID of the target access point
    #[at_arg(position = 0)]
    ssid: String<32>,

    /// The password/key of the target access point
    #[at_arg(position = 1)]
    password: String<64>,
}

impl AccessPointConnectCommand {
    pub fn new(ssid: String<32>, password: String<64>) -> Self {
        Self { ssid, password }
    }
}

impl CommandErrorHandler for AccessPointConnectCommand {
    type Error = JoinError;

    fn command_error(&self, error: FramerError) -> Self::Error {
        JoinError::ConnectError(error)
    }
}

/// Leaves the current access point
#[derive(Clone, Default, AtatCmd)]
#[at_cmd("+CWQAP", NoResponse)]
pub struct AccessPointDisconnectCommand;

impl CommandErrorHandler for AccessPointDisconnectCommand {
    type Error = FramerError;

    fn command_error(&self, error: FramerError) -> Self::Error {
        error
    }
}

/// Enables/Disables multiple connections
#[derive(Clone, AtatCmd)]
#[at_cmd("+CIPMUX", NoResponse)]
pub struct SetMultipleConnectionsCommand {
    /// 0: single connection, 1: multiple connections
    mode: usize,
}

impl SetMultipleConnectionsCommand {
    /// Restricts the modem to a single connection
    pub fn single() -> Self {
        Self { mode: 0 }
    }
}

impl CommandErrorHandler for SetMultipleConnectionsCommand {
    type Error = JoinError;

    fn command_error(&self, error: FramerError) -> Self::Error {
        JoinError::SingleConnectionError(error)
    }
}

/// Establishes a TCP connection
#[derive(Clone, AtatCmd)]
#[at_cmd("+CIPSTART", NoResponse)]
pub struct ConnectCommand {
    /// Connection type, always TCP
    connection_type: String<5>,

    /// Remote host name or IP address
    remote_host: String<MAX_HOST_LENGTH>,

    /// Remote port
    port: u16,
}

impl ConnectCommand {
    pub fn tcp(remote_host: String<MAX_HOST_LENGTH>, port: u16) -> Self {
        Self {
            connection_type: String::from_str("TCP").unwrap_or_default(),
            remote_host,
            port,
        }
    }
}

impl CommandErrorHandler for ConnectCommand {
    type Error = StackError;

    const ACKNOWLEDGEMENTS: &'static [&'static [u8]] = &[b"Linked"];

    fn command_error(&self, error: FramerError) -> Self::Error {
        StackError::ConnectError(error)
    }
}

/// Closes the current TCP connection
#[derive(Clone, Default, AtatCmd)]
#[at_cmd("+CIPCLOSE", NoResponse)]
pub struct CloseSocketCommand;

impl CommandErrorHandler for CloseSocketCommand {
    type Error = StackError;

    const ACKNOWLEDGEMENTS: &'static [&'static [u8]] = &[b"Unlink\r\n"];

    fn command_error(&self, error: FramerError) -> Self::Error {
        StackError::UnconfirmedClose(error)
    }
}

/// Announces the length of data to be sent
#[derive(Clone, AtatCmd)]
#[at_cmd("+CIPSEND", NoResponse)]
pub struct TransmissionPrepareCommand {
    /// Data length in bytes
    length: usize,
}

impl TransmissionPrepareCommand {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl CommandErrorHandler for TransmissionPrepareCommand {
    type Error = StackError;

    /// Send prompt
    const ACKNOWLEDGEMENTS: &'static [&'static [u8]] = &[b"> "];

    fn command_error(&self, error: FramerError) -> Self::Error {
        StackError::TransmissionStartFailed(error)
    }
}
