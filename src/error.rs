//! Error types for the hopper panel core.

use core::fmt;

/// Rejected [`PanelConfig`](crate::PanelConfig) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum ConfigError {
    /// Sub-steps per detent outside 2–64.
    InvalidDetentSteps,

    /// Pin-change line not served by its input's interrupt handler
    /// (encoder 0–1, button 2–3).
    InvalidLine(u8),

    /// Both encoder outputs were assigned the same pin-change line.
    LineConflict(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::InvalidDetentSteps => write!(f, "Detent steps must be between 2 and 64"),
            ConfigError::InvalidLine(line) => write!(f, "Input line {} has no pin-change handler", line),
            ConfigError::LineConflict(line) => write!(f, "Input line {} assigned twice", line),
        }
    }
}

/// Reasons a bus command is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum CommandError {
    /// Unexpected argument bytes, or not enough room for the reply.
    InvalidArguments,

    /// Command byte is not part of the command set.
    CommandNotSupported,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CommandError::InvalidArguments => write!(f, "Invalid command arguments"),
            CommandError::CommandNotSupported => write!(f, "Command not supported"),
        }
    }
}
