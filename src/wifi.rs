//! # ESP8266 adapter
//!
//! Central session object owning the serial transport. Resetting the modem and joining a network
//! is implemented here, TCP connections are handled by [crate::stack].
//!
//! All operations block until the modem responded or the inactivity timeout expired.
//!
//! ## Example
//!
//! ````
//! # use esp8266_at::example::{ExampleSerial, ExampleTimer};
//! # use esp8266_at::wifi::{Adapter, ModemState};
//! #
//! let mut adapter: Adapter<_, _, _, _, 1_000> = Adapter::new(ExampleSerial::default(), ExampleTimer::default());
//!
//! adapter.soft_reset().unwrap();
//! adapter.join("test_wifi", "secret").unwrap();
//! assert_eq!(ModemState::AccessPointJoined, adapter.state());
//! ````
use crate::commands::{
    AccessPointConnectCommand, AccessPointDisconnectCommand, CommandErrorHandler, EchoOffCommand, RestartCommand,
    SetMultipleConnectionsCommand, WifiModeCommand, MAX_HOST_LENGTH,
};
use crate::framer::{Error as FramerError, Link};
use crate::mirror::NoDebug;
use crate::reset::{NoResetPin, ResetPin};
use crate::timeouts::Timeouts;
use atat::AtatCmd;
use core::str::FromStr;
use embedded_io::{Error as IoError, Read, ReadReady, Write};
use fugit_timer::Timer;
use heapless::String;

/// Default boot message of the modem
pub const DEFAULT_BOOT_MARKER: &[u8] = b"ready\r\n";

/// Duration the reset line is held low in ms
const RESET_PULSE_MS: u32 = 10;

/// Central client for the modem session
///
/// T: Serial transport, needs to support non-blocking availability checks by [ReadReady]
///
/// TM: Timer used for inactivity timeouts
///
/// R: Optional hardware reset line, s. [Adapter::with_reset_pin]
///
/// D: Optional debug sink, s. [Adapter::with_debug]
pub struct Adapter<'d, T, TM, R, D, const TIMER_HZ: u32>
where
    T: Read + ReadReady + Write,
    TM: Timer<TIMER_HZ>,
    R: ResetPin,
    D: Write,
{
    /// Transport, timer and debug mirror
    pub(crate) link: Link<'d, T, TM, D, TIMER_HZ>,

    /// Hardware reset line, None if not connected
    pub(crate) reset_pin: Option<R>,

    /// Message expected after a reset
    pub(crate) boot_marker: &'static [u8],

    /// Connection state
    pub(crate) session: Session,
}

/// Internal connection state
#[derive(Clone, Debug, Default)]
pub(crate) struct Session {
    /// Boot marker was received after the last reset
    pub(crate) ready: bool,

    /// Access point was joined successfully
    pub(crate) joined: bool,

    /// Remote host of the open TCP connection. Set only by a successful connect.
    pub(crate) host: Option<String<MAX_HOST_LENGTH>>,
}

impl Session {
    fn reset(&mut self) {
        self.ready = true;
        self.joined = false;
        self.host = None;
    }
}

/// Current state of the modem session
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemState {
    /// No reset was confirmed yet
    Idle,

    /// Modem booted and is ready for commands
    Ready,

    /// Joined to an access point
    AccessPointJoined,

    /// TCP connection is open
    TcpOpen,
}

/// Possible errors when resetting the modem
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetError {
    /// Error while driving the reset line
    ResetPin,

    /// Upstream timer error while holding the reset line
    Timer,

    /// Boot message was not received
    BootMarker(FramerError),

    /// Disabling the command echo was not confirmed
    EchoOff(FramerError),
}

/// Possible errors when joining an access point
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoinError {
    /// Error while setting WIFI mode to station
    ModeError(FramerError),

    /// Error while joining the access point
    ConnectError(FramerError),

    /// Error while switching to single connection mode
    SingleConnectionError(FramerError),

    /// Given SSID is longer then the max. size of 32 chars
    InvalidSSIDLength,

    /// Given password is longer then the max. size of 63 chars
    InvalidPasswordLength,
}

impl<T, TM, const TIMER_HZ: u32> Adapter<'static, T, TM, NoResetPin, NoDebug, TIMER_HZ>
where
    T: Read + ReadReady + Write,
    TM: Timer<TIMER_HZ>,
{
    /// Creates a new adapter without reset line and debug output
    pub fn new(transport: T, timer: TM) -> Self {
        Self {
            link: Link::new(transport, timer, None),
            reset_pin: None,
            boot_marker: DEFAULT_BOOT_MARKER,
            session: Session::default(),
        }
    }
}

impl<'d, T, TM, R, D, const TIMER_HZ: u32> Adapter<'d, T, TM, R, D, TIMER_HZ>
where
    T: Read + ReadReady + Write,
    TM: Timer<TIMER_HZ>,
    R: ResetPin,
    D: Write,
{
    /// Duplicates all traffic to the given sink. The sink is just borrowed and never closed.
    pub fn with_debug<'e, E: Write>(self, sink: &'e mut E) -> Adapter<'e, T, TM, R, E, TIMER_HZ> {
        Adapter {
            link: self.link.with_sink(Some(sink)),
            reset_pin: self.reset_pin,
            boot_marker: self.boot_marker,
            session: self.session,
        }
    }

    /// Uses the given pin for hardware resets
    pub fn with_reset_pin<P: ResetPin>(self, pin: P) -> Adapter<'d, T, TM, P, D, TIMER_HZ> {
        Adapter {
            link: self.link,
            reset_pin: Some(pin),
            boot_marker: self.boot_marker,
            session: self.session,
        }
    }

    /// Overrides the timeouts in ms. Passing 0 for a value keeps the current setting.
    ///
    /// * `receive`: inactivity timeout for regular responses
    /// * `reset`: timeout for the boot message after a soft reset
    /// * `connect`: timeout for joining an access point
    /// * `chunked`: inactivity timeout while receiving `+IPD` network data
    pub fn set_timeouts(&mut self, receive: u32, reset: u32, connect: u32, chunked: u32) {
        self.link.set_timeouts(receive, reset, connect, chunked);
    }

    /// Returns the current timeout profile
    pub fn timeouts(&self) -> Timeouts {
        self.link.timeouts
    }

    /// Overrides the boot message, `None` restores the default `ready\r\n`
    pub fn set_boot_marker(&mut self, marker: Option<&'static [u8]>) {
        self.boot_marker = marker.unwrap_or(DEFAULT_BOOT_MARKER);
    }

    /// Resets the modem by pulsing the reset line and waits for the boot message.
    ///
    /// Returns Ok without any action if no reset line is connected.
    pub fn hard_reset(&mut self) -> Result<(), ResetError> {
        let Some(pin) = self.reset_pin.as_mut() else {
            return Ok(());
        };

        warn!("Hard resetting ESP8266");
        pin.drive_low().map_err(|_| ResetError::ResetPin)?;
        let hold = self.link.delay_ms(RESET_PULSE_MS);
        pin.release().map_err(|_| ResetError::ResetPin)?;
        hold.map_err(|_| ResetError::Timer)?;

        self.link.find(Some(self.boot_marker), false).map_err(ResetError::BootMarker)?;
        self.session.reset();
        Ok(())
    }

    /// Restarts the modem by AT command and disables the command echo.
    ///
    /// The reset timeout is applied while waiting, the receive timeout is restored afterwards.
    pub fn soft_reset(&mut self) -> Result<(), ResetError> {
        warn!("Soft resetting ESP8266");
        let timeout = self.link.timeouts.reset;
        let boot_marker = self.boot_marker;

        self.link.with_timeout(timeout, |link| -> Result<(), ResetError> {
            let command = RestartCommand;
            link.issue(&command).map_err(|e| command.command_error(e))?;
            link.find(Some(boot_marker), false).map_err(|e| command.command_error(e))?;
            link.send_command(EchoOffCommand)?;
            Ok(())
        })?;

        self.session.reset();
        debug!("ESP8266 ready");
        Ok(())
    }

    /// Joins the given access point and switches to single connection mode.
    ///
    /// SSID and key are embedded as quoted strings as they are. Quote characters are not escaped.
    pub fn join(&mut self, ssid: &str, key: &str) -> Result<(), JoinError> {
        if ssid.len() > 32 {
            return Err(JoinError::InvalidSSIDLength);
        }

        if key.len() > 63 {
            return Err(JoinError::InvalidPasswordLength);
        }

        let command = AccessPointConnectCommand::new(
            String::from_str(ssid).map_err(|_| JoinError::InvalidSSIDLength)?,
            String::from_str(key).map_err(|_| JoinError::InvalidPasswordLength)?,
        );

        self.link.send_command(WifiModeCommand::station_mode())?;

        let timeout = self.link.timeouts.connect;
        self.link.with_timeout(timeout, |link| link.send_command(command))?;

        self.link.send_command(SetMultipleConnectionsCommand::single())?;
        self.session.joined = true;
        debug!("Joined access point");
        Ok(())
    }

    /// Leaves the current access point. An open TCP connection is dropped by the modem as well.
    ///
    /// The session is updated even if the modem did not confirm.
    pub fn leave(&mut self) -> Result<(), FramerError> {
        let result = self.link.send_command(AccessPointDisconnectCommand);
        self.session.joined = false;
        self.session.host = None;
        result?;
        Ok(())
    }

    /// Returns the current session state
    pub fn state(&self) -> ModemState {
        if self.session.host.is_some() {
            return ModemState::TcpOpen;
        }

        if self.session.joined {
            return ModemState::AccessPointJoined;
        }

        if self.session.ready {
            return ModemState::Ready;
        }

        ModemState::Idle
    }

    /// Waits for the given pattern, `None` awaits `OK\r\n`.
    ///
    /// `chunked` needs to be set if received network data may be interleaved, e.g. after a
    /// request. The data is passed through to the debug output but not matched, and the chunked
    /// timeout is applied.
    pub fn find(&mut self, pattern: Option<&[u8]>, chunked: bool) -> Result<(), FramerError> {
        self.link.find(pattern, chunked)
    }

    /// Waits for the first of the given patterns and returns its index
    pub fn find_any(&mut self, patterns: &[&[u8]], chunked: bool) -> Result<usize, FramerError> {
        self.link.find_any(patterns, chunked)
    }

    /// Reads a single response line into the buffer and returns the stored length.
    /// Longer lines are truncated, but consumed entirely.
    pub fn read_line(&mut self, buffer: &mut [u8]) -> Result<usize, FramerError> {
        self.link.read_line(buffer)
    }

    /// Sends an AT command and waits for its acknowledgement
    pub fn send_command<Cmd: AtatCmd + CommandErrorHandler>(&mut self, command: Cmd) -> Result<usize, Cmd::Error> {
        self.link.send_command(command)
    }

    /// Sends a raw command line, e.g. `AT+GMR`, and waits for the given acknowledgement or `OK\r\n`.
    /// The line terminator is appended.
    pub fn send_raw(&mut self, line: &[u8], ack: Option<&[u8]>) -> Result<(), FramerError> {
        self.link.issue_raw(line)?;
        self.link.find(ack, false)
    }

    /// Writes the given data without any framing
    pub fn write_raw(&mut self, data: &[u8]) -> Result<(), FramerError> {
        self.link.write_all(data)
    }
}

impl<'d, T, TM, R, D, const TIMER_HZ: u32> Adapter<'d, T, TM, R, D, TIMER_HZ>
where
    T: Read + ReadReady + Write,
    TM: Timer<TIMER_HZ>,
    R: ResetPin,
    D: Read + ReadReady + Write,
{
    /// Shuttles at most one byte in each direction between debug sink and modem
    pub fn passthrough_step(&mut self) -> Result<(), FramerError> {
        let mut console_byte = None;
        if let Some(sink) = self.link.mirror.sink() {
            let mut buffer = [0x0; 1];
            if sink.read_ready().unwrap_or(false) && sink.read(&mut buffer).unwrap_or(0) == 1 {
                console_byte = Some(buffer[0]);
            }
        }

        if let Some(byte) = console_byte {
            self.link.transport.write_all(&[byte]).map_err(|e| FramerError::Transport(e.kind()))?;
        }

        if let Some(byte) = self.link.poll_byte()? {
            if let Some(sink) = self.link.mirror.sink() {
                let _ = sink.write_all(&[byte]);
            }
        }

        Ok(())
    }

    /// Interactive debugging: forwards data between debug sink and modem forever.
    ///
    /// Spins without any action if no debug sink is configured.
    pub fn debug_loop(&mut self) -> ! {
        if !self.link.mirror.is_present() {
            loop {
                core::hint::spin_loop();
            }
        }

        self.link.mirror.message(b"\r\n========================\r\n");
        loop {
            let _ = self.passthrough_step();
        }
    }
}
