//! CI-V command registry
//!
//! A fixed table maps each supported command to its command/subcommand byte
//! pair. Text names are resolved once into a [`CivCommand`] at the edge of
//! the system; everything past that point works with the typed value.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// How a command may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Access {
    /// No argument reads the value, an argument writes it
    ReadWrite,
    /// Always sends a fixed activate payload, never a pure read
    Trigger,
}

/// Static description of a command's wire bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandDescriptor {
    /// Registry name, upper case
    pub name: &'static str,
    /// CI-V command byte (`Cn`)
    pub code: u8,
    /// CI-V subcommand byte (`Sc`)
    pub subcode: u8,
    /// Read/write semantics
    pub access: Access,
}

/// Commands understood by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CivCommand {
    /// Operating frequency in Hz
    Frequency,
    /// IF filter width index
    FilterWidth,
    /// RF power output level
    PowerOutput,
    /// Operating mode
    Mode,
    /// QSK (break-in) setting
    Qsk,
    /// Start the antenna tuner
    Tune,
}

const FREQUENCY: CommandDescriptor = CommandDescriptor {
    name: "FREQUENCY",
    code: 0x25,
    subcode: 0x00,
    access: Access::ReadWrite,
};

const FILTER_WIDTH: CommandDescriptor = CommandDescriptor {
    name: "FILTER_WIDTH",
    code: 0x1A,
    subcode: 0x03,
    access: Access::ReadWrite,
};

const POWER_OUTPUT: CommandDescriptor = CommandDescriptor {
    name: "POWER_OUTPUT",
    code: 0x14,
    subcode: 0x0A,
    access: Access::ReadWrite,
};

const MODE: CommandDescriptor = CommandDescriptor {
    name: "MODE",
    code: 0x26,
    subcode: 0x00,
    access: Access::ReadWrite,
};

const QSK: CommandDescriptor = CommandDescriptor {
    name: "QSK",
    code: 0x16,
    subcode: 0x47,
    access: Access::ReadWrite,
};

const TUNE: CommandDescriptor = CommandDescriptor {
    name: "TUNE",
    code: 0x1C,
    subcode: 0x01,
    access: Access::Trigger,
};

impl CivCommand {
    /// Every registered command, in table order
    pub const ALL: [CivCommand; 6] = [
        CivCommand::Frequency,
        CivCommand::FilterWidth,
        CivCommand::PowerOutput,
        CivCommand::Mode,
        CivCommand::Qsk,
        CivCommand::Tune,
    ];

    /// Returns the static descriptor for this command
    pub fn descriptor(&self) -> &'static CommandDescriptor {
        match self {
            CivCommand::Frequency => &FREQUENCY,
            CivCommand::FilterWidth => &FILTER_WIDTH,
            CivCommand::PowerOutput => &POWER_OUTPUT,
            CivCommand::Mode => &MODE,
            CivCommand::Qsk => &QSK,
            CivCommand::Tune => &TUNE,
        }
    }

    /// Registry name
    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Command byte
    pub fn code(&self) -> u8 {
        self.descriptor().code
    }

    /// Subcommand byte
    pub fn subcode(&self) -> u8 {
        self.descriptor().subcode
    }

    /// Returns true for commands that always send an activate payload
    pub fn is_trigger(&self) -> bool {
        self.descriptor().access == Access::Trigger
    }

    /// Find the command addressed by a command/subcommand pair
    pub fn lookup(code: u8, subcode: u8) -> Option<CivCommand> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.code() == code && cmd.subcode() == subcode)
    }
}

impl FromStr for CivCommand {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ParseError::UnknownCommand(name.to_string()))
    }
}

impl fmt::Display for CivCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
