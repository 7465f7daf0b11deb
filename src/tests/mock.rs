use crate::reset::ResetPin;
use core::convert::Infallible;
use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer as FugitTimer;
use mockall::mock;
use std::collections::VecDeque;

/// Scripted behaviour of the serial line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Byte available for reading
    Byte(u8),

    /// No data available for the given number of polls
    Idle(usize),

    /// Transport signals end of stream
    Eof,

    /// Transport fails with the given error
    Fail(ErrorKind),
}

/// Serial mock returning scripted events and recording all written data
pub struct MockSerial {
    /// Remaining events in the same order as inserted
    events: VecDeque<Event>,

    /// All bytes written by the driver
    pub written: Vec<u8>,

    /// Simulates a broken transport on write
    pub fail_writes: bool,
}

impl MockSerial {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            written: Vec::new(),
            fail_writes: false,
        }
    }

    /// Adds the given bytes as received data
    pub fn add_response(&mut self, response: &[u8]) {
        for byte in response {
            self.events.push_back(Event::Byte(*byte));
        }
    }

    /// Simulates silence for the given number of polls
    pub fn add_idle(&mut self, polls: usize) {
        self.events.push_back(Event::Idle(polls));
    }

    pub fn add_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Number of not yet consumed events
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Returns the written data as string
    pub fn written_as_string(&self) -> String {
        String::from_utf8(self.written.clone()).unwrap()
    }
}

impl ErrorType for MockSerial {
    type Error = ErrorKind;
}

impl ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        loop {
            match self.events.front_mut() {
                None => return Ok(false),
                Some(Event::Idle(0)) => {
                    self.events.pop_front();
                }
                Some(Event::Idle(polls)) => {
                    *polls -= 1;
                    if *polls == 0 {
                        self.events.pop_front();
                    }
                    return Ok(false);
                }
                Some(Event::Fail(kind)) => return Err(*kind),
                Some(_) => return Ok(true),
            }
        }
    }
}

impl Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.events.pop_front() {
            Some(Event::Byte(byte)) => {
                buf[0] = byte;
                Ok(1)
            }
            Some(Event::Fail(kind)) => Err(kind),
            _ => Ok(0),
        }
    }
}

impl Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_writes {
            return Err(ErrorKind::BrokenPipe);
        }

        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Deterministic timer, every wait() call advances the clock by one tick (1 ms)
pub struct ClockTimer {
    /// Current tick
    clock: u32,

    /// Tick of the last start() call
    started: u32,

    /// Duration of the running countdown in ticks
    duration: u32,

    /// Durations of all start() calls in ms
    pub starts: Vec<u32>,
}

impl ClockTimer {
    pub fn new() -> Self {
        Self {
            clock: 0,
            started: 0,
            duration: 0,
            starts: Vec::new(),
        }
    }

    /// Ticks elapsed since creation
    pub fn elapsed(&self) -> u32 {
        self.clock
    }
}

impl FugitTimer<1_000> for ClockTimer {
    type Error = Infallible;

    fn now(&mut self) -> TimerInstantU32<1_000> {
        TimerInstantU32::from_ticks(self.clock)
    }

    fn start(&mut self, duration: TimerDurationU32<1_000>) -> Result<(), Self::Error> {
        self.started = self.clock;
        self.duration = duration.ticks();
        self.starts.push(duration.ticks());
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        self.clock += 1;

        if self.clock - self.started >= self.duration {
            return Ok(());
        }

        Err(nb::Error::WouldBlock)
    }
}

/// Debug console capturing the mirrored traffic and providing scripted user input
pub struct DebugConsole {
    /// Mirrored traffic
    pub output: Vec<u8>,

    /// Pending user input
    pub input: VecDeque<u8>,
}

impl DebugConsole {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            input: VecDeque::new(),
        }
    }

    pub fn output_as_string(&self) -> String {
        String::from_utf8(self.output.clone()).unwrap()
    }
}

impl ErrorType for DebugConsole {
    type Error = Infallible;
}

impl Write for DebugConsole {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Read for DebugConsole {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.input.pop_front() {
            Some(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

impl ReadReady for DebugConsole {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.input.is_empty())
    }
}

mock! {
    pub Timer{}

    impl FugitTimer<1_000> for Timer {
        type Error = u32;

        fn now(&mut self) -> TimerInstantU32<1000>;
        fn start(&mut self, duration: TimerDurationU32<1000>) -> Result<(), u32>;
        fn cancel(&mut self) -> Result<(), u32>;
        fn wait(&mut self) -> nb::Result<(), u32>;
    }
}

mock! {
    pub Pin{}

    impl ResetPin for Pin {
        type Error = u32;

        fn drive_low(&mut self) -> Result<(), u32>;
        fn release(&mut self) -> Result<(), u32>;
    }
}
