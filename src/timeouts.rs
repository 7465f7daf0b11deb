/// Default inactivity timeout for regular command responses in ms
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u32 = 1_000;

/// Default timeout for the boot message after a reset in ms
pub const DEFAULT_RESET_TIMEOUT_MS: u32 = 5_000;

/// Default timeout for joining an access point in ms
pub const DEFAULT_CONNECT_TIMEOUT_MS: u32 = 15_000;

/// Default inactivity timeout while receiving `+IPD` network data in ms.
/// The modem occasionally stalls for a long time in between chunks.
pub const DEFAULT_CHUNKED_TIMEOUT_MS: u32 = 120_000;

/// Timeout profile consulted by the framer
///
/// All values are inactivity timeouts in milliseconds, measured from the last received byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeouts {
    /// Timeout for regular command responses
    pub receive: u32,

    /// Timeout while waiting for the boot marker after a soft reset
    pub reset: u32,

    /// Timeout while joining an access point
    pub connect: u32,

    /// Timeout while receiving chunked network data
    pub chunked: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            receive: DEFAULT_RECEIVE_TIMEOUT_MS,
            reset: DEFAULT_RESET_TIMEOUT_MS,
            connect: DEFAULT_CONNECT_TIMEOUT_MS,
            chunked: DEFAULT_CHUNKED_TIMEOUT_MS,
        }
    }
}

impl Timeouts {
    /// Overrides the given timeouts. A value of zero keeps the current setting.
    pub fn update(&mut self, receive: u32, reset: u32, connect: u32, chunked: u32) {
        Self::apply(&mut self.receive, receive);
        Self::apply(&mut self.reset, reset);
        Self::apply(&mut self.connect, connect);
        Self::apply(&mut self.chunked, chunked);
    }

    fn apply(current: &mut u32, value: u32) {
        if value != 0 {
            *current = value;
        }
    }
}
