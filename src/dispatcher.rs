//! Bus command set of the panel.
//!
//! The transport hands every request to [`CommandDispatcher`] as a command
//! byte plus arguments and sends back whatever it produces. A status request
//! is the only consumer of the event counters: it drains each exactly once
//! and clears the attention signal in the same operation, so the controller
//! never sees the flag without the matching deltas or the other way round.

use heapless::Vec;

use crate::error::CommandError;
use crate::{Attention, PanelState};

/// Maximum request or response frame size handled by the transport.
pub const MAX_PACKET_LENGTH: usize = 32;

/// Largest press count the status byte can carry.
const MAX_REPORTED_PRESSES: u8 = 0x7F;

/// Status byte flag for the hopper sensor.
const HOPPER_EMPTY_BIT: u8 = 0x80;

/// Commands understood by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Raw readings of the last hopper measurement
    GetLastMeasurement = 0x80,
    /// Button presses, detents and hopper flag since the last status
    GetLastStatus = 0x81,
}

impl TryFrom<u8> for Command {
    type Error = CommandError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x80 => Ok(Command::GetLastMeasurement),
            0x81 => Ok(Command::GetLastStatus),
            _ => Err(CommandError::CommandNotSupported),
        }
    }
}

/// First byte of every response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    CommandOk = 0x00,
    CommandNotSupported = 0x01,
    InvalidArguments = 0x02,
}

impl From<CommandError> for Status {
    fn from(error: CommandError) -> Self {
        match error {
            CommandError::CommandNotSupported => Status::CommandNotSupported,
            CommandError::InvalidArguments => Status::InvalidArguments,
        }
    }
}

/// Contents of a `GET_LAST_STATUS` reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct StatusReport {
    pub presses: u8,
    pub detents: i8,
    pub hopper_empty: bool,
}

impl StatusReport {
    /// Packs the report into its two wire bytes.
    ///
    /// Byte 0 holds the press count clamped to 127 with the hopper flag in
    /// bit 7. Byte 1 is the detent count in two's complement.
    pub fn to_bytes(&self) -> [u8; 2] {
        let mut flags = self.presses.min(MAX_REPORTED_PRESSES);
        if self.hopper_empty {
            flags |= HOPPER_EMPTY_BIT;
        }
        [flags, self.detents as u8]
    }
}

/// Request handler for the panel's command set.
pub struct CommandDispatcher<'a, A: Attention> {
    state: &'a PanelState,
    attention: &'a A,
}

impl<'a, A: Attention> CommandDispatcher<'a, A> {
    pub fn new(state: &'a PanelState, attention: &'a A) -> Self {
        Self { state, attention }
    }

    /// Executes one command and writes its reply into `out`.
    ///
    /// # Arguments
    ///
    /// * `cmd` - Command byte
    /// * `args` - Argument bytes following the command byte
    /// * `out` - Reply buffer
    ///
    /// # Returns
    ///
    /// Number of bytes written to `out`
    pub fn dispatch(&self, cmd: u8, args: &[u8], out: &mut [u8]) -> Result<usize, CommandError> {
        match Command::try_from(cmd)? {
            Command::GetLastMeasurement => {
                if !args.is_empty() || out.len() < 4 {
                    return Err(CommandError::InvalidArguments);
                }
                out[..4].copy_from_slice(&self.state.hopper.measurement().to_be_bytes());
                Ok(4)
            }
            Command::GetLastStatus => {
                if !args.is_empty() || out.len() < 2 {
                    return Err(CommandError::InvalidArguments);
                }
                out[..2].copy_from_slice(&self.take_status().to_bytes());
                Ok(2)
            }
        }
    }

    /// Collects everything reported by a status request.
    ///
    /// Clears attention first: an event landing after the clear raises it
    /// again and is picked up by the next request.
    pub fn take_status(&self) -> StatusReport {
        self.attention.clear();

        StatusReport {
            presses: self.state.presses.drain(),
            detents: self.state.detents.drain(),
            hopper_empty: self.state.hopper.is_empty(),
        }
    }

    /// Builds a complete response frame `[status, payload...]` for a raw
    /// request `[cmd, args...]`.
    pub fn handle_request(&self, request: &[u8]) -> Vec<u8, MAX_PACKET_LENGTH> {
        let mut buffer = [0u8; MAX_PACKET_LENGTH];
        let (status_byte, payload) = buffer.split_at_mut(1);

        let result = match request.split_first() {
            Some((&cmd, args)) => self.dispatch(cmd, args, payload),
            None => Err(CommandError::InvalidArguments),
        };
        let (status, len) = match result {
            Ok(len) => (Status::CommandOk, len),
            Err(error) => (Status::from(error), 0),
        };
        status_byte[0] = status as u8;

        // `dispatch` never reports more than the payload slice it was given.
        let frame = Vec::from_slice(&buffer[..=len]);
        debug_assert!(frame.is_ok(), "response frame exceeds packet length");
        frame.unwrap_or_default()
    }
}
