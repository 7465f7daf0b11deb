//! Mocks for doc examples
use core::convert::Infallible;
use embedded_io::{ErrorType, Read, ReadReady, Write};
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer;
use heapless::{Deque, Vec};

/// Simulated ESP8266 responding to a fixed set of commands
#[derive(Default)]
pub struct ExampleSerial {
    /// Pending response bytes
    rx: Deque<u8, 512>,

    /// Currently received command line
    line: Vec<u8, 256>,

    /// Remaining bytes of an announced transmission
    data_remaining: usize,

    /// First bytes of the current transmission
    data: Vec<u8, 8>,
}

impl ExampleSerial {
    fn respond(&mut self, response: &[u8]) {
        for byte in response {
            let _ = self.rx.push_back(*byte);
        }
    }

    fn handle_line(&mut self) {
        let line = self.line.clone();

        match line.as_slice() {
            b"AT+RST\r\n" => self.respond(b"\r\nOK\r\n ets Jan  8 2013,rst cause:2\r\n\r\nready\r\n"),
            b"ATE0\r\n" => self.respond(b"ATE0\r\n\r\nOK\r\n"),
            b"AT+CWMODE=1\r\n" => self.respond(b"\r\nno change\r\n"),
            b"AT+CWJAP=\"test_wifi\",\"secret\"\r\n" => self.respond(b"WIFI CONNECTED\r\nWIFI GOT IP\r\n\r\nOK\r\n"),
            b"AT+CIPMUX=0\r\n" => self.respond(b"\r\nOK\r\n"),
            b"AT+CIPCLOSE\r\n" =>self.respond(b"\r\nOK\r\nUnlink\r\n"),
            _ if line.starts_with(b"AT+CIPSTART=") => self.respond(b"\r\nOK\r\nLinked\r\n"),
            _ if line.starts_with(b"AT+CIPSEND=") => {
                self.data_remaining = core::str::from_utf8(&line[11..line.len() - 2])
                    .ok()
                    .and_then(|length| length.parse().ok())
                    .unwrap_or(0);
                self.data.clear();
                self.respond(b"\r\nOK\r\n> ");
            }
            _ => self.respond(b"\r\nERROR\r\n"),
        }
    }

    fn handle_data(&mut self) {
        self.respond(b"\r\nSEND OK\r\n");

        if self.data.starts_with(b"GET ") {
            self.respond(b"\r\n+IPD,17:HTTP/1.1 200 OK\r\n\r\nOK\r\nUnlink\r\n");
        } else if self.data.starts_with(b"HELO") {
            self.respond(b"\r\n+IPD,8:250 ok\r\n\r\nOK\r\n");
        }
    }
}

impl ErrorType for ExampleSerial {
    type Error = Infallible;
}

impl Read for ExampleSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut length = 0;
        while length < buf.len() {
            match self.rx.pop_front() {
                Some(byte) => buf[length] = byte,
                None => break,
            }
            length += 1;
        }

        Ok(length)
    }
}

impl ReadReady for ExampleSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl Write for ExampleSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for byte in buf {
            if self.data_remaining > 0 {
                let _ = self.data.push(*byte);
                self.data_remaining -= 1;
                if self.data_remaining == 0 {
                    self.handle_data();
                }
                continue;
            }

            let _ = self.line.push(*byte);
            if self.line.ends_with(b"\r\n") {
                self.handle_line();
                self.line.clear();
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Timer mock counting one tick per poll
#[derive(Default)]
pub struct ExampleTimer {
    ticks: u32,
    remaining: u32,
}

impl Timer<1_000> for ExampleTimer {
    type Error = Infallible;

    fn now(&mut self) -> TimerInstantU32<1_000> {
        TimerInstantU32::from_ticks(self.ticks)
    }

    fn start(&mut self, duration: TimerDurationU32<1_000>) -> Result<(), Self::Error> {
        self.remaining = duration.ticks();
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), Self::Error> {
        self.remaining = 0;
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        self.ticks = self.ticks.wrapping_add(1);

        if self.remaining <= 1 {
            self.remaining = 0;
            return Ok(());
        }

        self.remaining -= 1;
        Err(nb::Error::WouldBlock)
    }
}
