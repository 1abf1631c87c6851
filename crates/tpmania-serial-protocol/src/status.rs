//! Transfer outcomes and memory targets.

use crate::constants::*;
use serde::{Deserialize, Serialize};

/// Storage area on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryLocation {
    Ram,
    Eeprom,
}

impl MemoryLocation {
    /// Opcode requesting the sequence stored in this location.
    pub fn request_opcode(&self) -> u8 {
        match self {
            MemoryLocation::Ram => OP_REQUEST_RAM,
            MemoryLocation::Eeprom => OP_REQUEST_EEPROM,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryLocation::Ram => "RAM",
            MemoryLocation::Eeprom => "EEPROM",
        }
    }
}

/// Destinations selected for a sequence upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveTarget {
    pub ram: bool,
    pub eeprom: bool,
}

impl SaveTarget {
    pub const NONE: SaveTarget = SaveTarget { ram: false, eeprom: false };
    pub const RAM: SaveTarget = SaveTarget { ram: true, eeprom: false };
    pub const EEPROM: SaveTarget = SaveTarget { ram: false, eeprom: true };
    pub const BOTH: SaveTarget = SaveTarget { ram: true, eeprom: true };

    /// Upload opcode, or `None` if no destination is selected.
    pub fn opcode(&self) -> Option<u8> {
        match (self.ram, self.eeprom) {
            (true, true) => Some(OP_UPLOAD_BOTH),
            (true, false) => Some(OP_UPLOAD_RAM),
            (false, true) => Some(OP_UPLOAD_EEPROM),
            (false, false) => None,
        }
    }

    /// EEPROM writes are slow; the device acknowledges each beat with `RDY`.
    pub fn lock_step(&self) -> bool {
        self.eeprom
    }
}

/// Terminal outcome of a device operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// The upload completed and the device acknowledged it.
    Success,
    /// A sequence was received from the given location and saved.
    Received(MemoryLocation),
    /// The device did not answer within the wait bound.
    Timeout,
    /// No channel is open, or the channel failed and was dropped.
    DeviceNotConnected,
    /// Neither RAM nor EEPROM was selected for an upload.
    SaveLocationUnspecified,
    /// No sequence file is loaded.
    NoSequenceSelected,
    /// The timing windows are not strictly increasing.
    TimingWindowOrderInvalid,
    /// The device answered with something the host cannot use.
    UnknownDeviceResponse,
    /// The device holds no sequence in the requested location.
    NoSequenceOnDevice,
    /// A local sequence file could not be read or written.
    FileAccess,
}

impl TransferStatus {
    /// Whether the operation reached its goal.
    pub fn is_success(&self) -> bool {
        matches!(self, TransferStatus::Success | TransferStatus::Received(_))
    }
}
