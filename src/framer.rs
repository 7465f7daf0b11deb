//! # Pattern framer
//!
//! Scans the modem byte stream for an expected response pattern. Every received byte restarts
//! the inactivity timer, so a call only fails if the modem falls silent for longer than the active
//! timeout, the stream ends or the transport fails.
//!
//! Matching is a naive restart: on mismatch the cursor falls back to zero and the mismatching byte
//! is not tested again. Patterns with internal repeats (e.g. `aab` in `aaab`) may therefore be
//! missed. None of the modem responses awaited by this crate is affected.
//!
//! In chunked mode received network data framed by `+IPD,<length>:` headers is passed through
//! without being matched, s. [ChunkDecoder].
use crate::mirror::DebugMirror;
use crate::timeouts::Timeouts;
use embedded_io::{Error as IoError, ErrorKind, Read, ReadReady, Write};
use fugit::TimerDurationU32;
use fugit_timer::Timer;
use heapless::Vec;

/// Response terminating most AT commands
pub const DEFAULT_ACK: &[u8] = b"OK\r\n";

/// Header preceding a chunk of received network data
pub(crate) const CHUNK_MARKER: &[u8] = b"+IPD,";

/// Max. number of alternative patterns per call
pub const MAX_PATTERNS: usize = 4;

/// Reasons why an expected response was not received
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No matching response within the inactivity timeout. Also covers unexpected responses.
    Timeout,

    /// Transport signaled end of stream
    EndOfStream,

    /// Non digit character or overflow in the length of a `+IPD` header
    MalformedChunk,

    /// Upstream transport error
    Transport(ErrorKind),

    /// Upstream timer error
    Timer,

    /// Encoded command does not fit in the command buffer
    CommandOverflow,
}

/// Cursor of a single expected pattern
#[derive(Clone, Debug)]
pub(crate) struct Matcher<'a> {
    pattern: &'a [u8],
    matched: usize,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(pattern: &'a [u8]) -> Self {
        Self { pattern, matched: 0 }
    }

    /// Feeds the next byte and returns true once the whole pattern was matched
    pub(crate) fn feed(&mut self, byte: u8) -> bool {
        if self.pattern.get(self.matched) == Some(&byte) {
            self.matched += 1;
            return self.matched == self.pattern.len();
        }

        self.matched = 0;
        false
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }
}

/// Classification of a byte received in chunked mode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Chunk {
    /// Regular response byte, to be matched against the expected pattern
    Response,

    /// Part of a `+IPD` length header
    Header,

    /// Network payload, passed through unmatched
    Payload,
}

/// State machine splitting the `+IPD` framing from the regular response stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ChunkDecoder {
    /// Chunked mode disabled, all bytes are response bytes
    Disabled,

    /// Looking for the next `+IPD,` marker. Holds the matched marker length.
    SeekingMarker(usize),

    /// Reading the decimal payload length
    ReadingLength(usize),

    /// Remaining payload bytes of the current chunk
    SkippingPayload(usize),
}

impl ChunkDecoder {
    pub(crate) fn new(chunked: bool) -> Self {
        if chunked {
            return Self::SeekingMarker(0);
        }

        Self::Disabled
    }

    /// Advances the state machine by one received byte
    pub(crate) fn feed(&mut self, byte: u8) -> Result<Chunk, Error> {
        match *self {
            Self::Disabled => Ok(Chunk::Response),
            Self::SeekingMarker(matched) => {
                if CHUNK_MARKER[matched] != byte {
                    *self = Self::SeekingMarker(0);
                    return Ok(Chunk::Response);
                }

                if matched + 1 == CHUNK_MARKER.len() {
                    *self = Self::ReadingLength(0);
                } else {
                    *self = Self::SeekingMarker(matched + 1);
                }

                Ok(Chunk::Response)
            }
            Self::ReadingLength(length) => {
                if byte == b':' {
                    *self = match length {
                        0 => Self::SeekingMarker(0),
                        _ => Self::SkippingPayload(length),
                    };
                    return Ok(Chunk::Header);
                }

                if !byte.is_ascii_digit() {
                    return Err(Error::MalformedChunk);
                }

                let length = length
                    .checked_mul(10)
                    .and_then(|length| length.checked_add((byte - b'0') as usize))
                    .ok_or(Error::MalformedChunk)?;
                *self = Self::ReadingLength(length);
                Ok(Chunk::Header)
            }
            Self::SkippingPayload(remaining) => {
                *self = match remaining {
                    1 => Self::SeekingMarker(0),
                    _ => Self::SkippingPayload(remaining - 1),
                };
                Ok(Chunk::Payload)
            }
        }
    }
}

/// Byte level connection to the modem
///
/// Bundles the transport, the inactivity timer, the debug mirror and the timeout profile.
pub(crate) struct Link<'d, T, TM, D, const TIMER_HZ: u32>
where
    T: Read + ReadReady + Write,
    TM: Timer<TIMER_HZ>,
    D: Write,
{
    /// Serial connection to the modem
    pub(crate) transport: T,

    /// Timer used for timeout measurement
    pub(crate) timer: TM,

    /// Debug output
    pub(crate) mirror: DebugMirror<'d, D>,

    /// Configured timeouts
    pub(crate) timeouts: Timeouts,

    /// Inactivity timeout applied by the framer, usually `timeouts.receive`
    pub(crate) active_timeout: u32,
}

impl<'d, T, TM, D, const TIMER_HZ: u32> Link<'d, T, TM, D, TIMER_HZ>
where
    T: Read + ReadReady + Write,
    TM: Timer<TIMER_HZ>,
    D: Write,
{
    pub(crate) fn new(transport: T, timer: TM, sink: Option<&'d mut D>) -> Self {
        let timeouts = Timeouts::default();

        Self {
            transport,
            timer,
            mirror: DebugMirror::new(sink),
            active_timeout: timeouts.receive,
            timeouts,
        }
    }

    /// Replaces the debug sink
    pub(crate) fn with_sink<'e, E: Write>(self, sink: Option<&'e mut E>) -> Link<'e, T, TM, E, TIMER_HZ> {
        Link {
            transport: self.transport,
            timer: self.timer,
            mirror: DebugMirror::new(sink),
            timeouts: self.timeouts,
            active_timeout: self.active_timeout,
        }
    }

    /// Updates the timeout profile, zero keeps the current value
    pub(crate) fn set_timeouts(&mut self, receive: u32, reset: u32, connect: u32, chunked: u32) {
        self.timeouts.update(receive, reset, connect, chunked);
        if receive != 0 {
            self.active_timeout = receive;
        }
    }

    /// Runs the given closure with a temporary inactivity timeout.
    /// The previous timeout is restored regardless of the outcome.
    pub(crate) fn with_timeout<R>(&mut self, timeout_ms: u32, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.active_timeout;
        self.active_timeout = timeout_ms;
        let result = f(self);
        self.active_timeout = saved;
        result
    }

    /// Waits for the given pattern, `None` awaits `OK\r\n`
    pub(crate) fn find(&mut self, pattern: Option<&[u8]>, chunked: bool) -> Result<(), Error> {
        self.find_any(&[pattern.unwrap_or(DEFAULT_ACK)], chunked)?;
        Ok(())
    }

    /// Waits for the first of the given patterns and returns its index.
    /// Patterns beyond [MAX_PATTERNS] are ignored.
    pub(crate) fn find_any(&mut self, patterns: &[&[u8]], chunked: bool) -> Result<usize, Error> {
        let mut matchers: Vec<Matcher<'_>, MAX_PATTERNS> =
            patterns.iter().copied().take(MAX_PATTERNS).map(Matcher::new).collect();

        self.mirror.begin_read();
        let result = if chunked {
            let timeout = self.timeouts.chunked;
            self.with_timeout(timeout, |link| link.scan(&mut matchers, true))
        } else {
            self.scan(&mut matchers, false)
        };
        self.mirror.end_read();

        if let Err(error) = &result {
            debug!("Awaited response not received: {:?}", error);
        }

        result
    }

    /// Reads a single line into the given buffer and returns the stored length.
    ///
    /// Bytes exceeding the buffer are discarded, but the stream is always advanced past the
    /// terminating `\n`. The line terminator is not stored.
    pub(crate) fn read_line(&mut self, buffer: &mut [u8]) -> Result<usize, Error> {
        self.mirror.begin_read();
        let result = self.read_line_inner(buffer);
        self.mirror.end_read();
        result
    }

    fn read_line_inner(&mut self, buffer: &mut [u8]) -> Result<usize, Error> {
        self.restart_timer()?;
        let mut length = 0;

        loop {
            let byte = self.next_byte()?;
            if byte == b'\r' {
                break;
            }

            // Line without CR
            if byte == b'\n' {
                return Ok(length);
            }

            if let Some(slot) = buffer.get_mut(length) {
                *slot = byte;
                length += 1;
            }
        }

        while self.next_byte()? != b'\n' {}
        Ok(length)
    }

    /// Writes the given bytes verbatim and copies them to the debug mirror
    pub(crate) fn write_all(&mut self, data: &[u8]) -> Result<(), Error> {
        for byte in data {
            self.mirror.echo_write(*byte);
        }

        self.transport.write_all(data).map_err(|e| Error::Transport(e.kind()))
    }

    /// Blocks for the given number of milliseconds
    pub(crate) fn delay_ms(&mut self, duration_ms: u32) -> Result<(), Error> {
        self.timer
            .start(TimerDurationU32::millis(duration_ms))
            .map_err(|_| Error::Timer)?;
        nb::block!(self.timer.wait()).map_err(|_| Error::Timer)
    }

    fn scan(&mut self, matchers: &mut [Matcher<'_>], chunked: bool) -> Result<usize, Error> {
        if let Some(index) = matchers.iter().position(|matcher| matcher.is_empty()) {
            return Ok(index);
        }

        let mut decoder = ChunkDecoder::new(chunked);
        self.restart_timer()?;

        loop {
            let byte = self.next_byte()?;

            if decoder.feed(byte)? != Chunk::Response {
                continue;
            }

            for (index, matcher) in matchers.iter_mut().enumerate() {
                if matcher.feed(byte) {
                    return Ok(index);
                }
            }
        }
    }

    /// Polls the transport until a byte is received or the inactivity timeout expired
    fn next_byte(&mut self) -> Result<u8, Error> {
        loop {
            if let Some(byte) = self.poll_byte()? {
                self.restart_timer()?;
                self.mirror.echo_read(byte);
                return Ok(byte);
            }

            match self.timer.wait() {
                Ok(()) => return Err(Error::Timeout),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(_)) => return Err(Error::Timer),
            }
        }
    }

    /// Reads a single byte if available without blocking
    pub(crate) fn poll_byte(&mut self) -> Result<Option<u8>, Error> {
        if !self.transport.read_ready().map_err(|e| Error::Transport(e.kind()))? {
            return Ok(None);
        }

        let mut buffer = [0x0; 1];
        match self.transport.read(&mut buffer) {
            Ok(0) => Err(Error::EndOfStream),
            Ok(_) => Ok(Some(buffer[0])),
            Err(error) => Err(Error::Transport(error.kind())),
        }
    }

    fn restart_timer(&mut self) -> Result<(), Error> {
        self.timer
            .start(TimerDurationU32::millis(self.active_timeout))
            .map_err(|_| Error::Timer)
    }
}
