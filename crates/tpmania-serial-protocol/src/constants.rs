//! Wire constants shared by the host and the controller firmware.

// ============================================================================
// Opcodes (host → device)
// ============================================================================

/// Upload a sequence into RAM.
pub const OP_UPLOAD_RAM: u8 = b'S';
/// Upload a sequence into EEPROM, one acknowledged beat at a time.
pub const OP_UPLOAD_EEPROM: u8 = b'E';
/// Upload a sequence into both RAM and EEPROM.
pub const OP_UPLOAD_BOTH: u8 = b'B';
/// Upload the four timing windows.
pub const OP_UPLOAD_WINDOWS: u8 = b'T';
/// Request the sequence stored in RAM.
pub const OP_REQUEST_RAM: u8 = b'R';
/// Request the sequence stored in EEPROM.
pub const OP_REQUEST_EEPROM: u8 = b'N';
/// Request the timing windows currently in use.
pub const OP_REQUEST_WINDOWS: u8 = b'W';

// ============================================================================
// Tokens (device → host)
// ============================================================================

/// Ready / per-beat acknowledgement line.
pub const READY_TOKEN: &str = "RDY";

/// End-of-transfer sentinel, sent without a line terminator.
pub const END_TRANSFER: &str = "X";

/// Padding byte the firmware may place around lines.
pub const NUL: u8 = 0x00;

/// Data line terminator.
pub const LINE_TERMINATOR: u8 = b'\n';

// ============================================================================
// Link parameters
// ============================================================================

/// Baud rate the firmware listens at.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Number of timing windows: Perfect, Good, OK, Poor.
pub const TIMING_WINDOW_COUNT: usize = 4;

/// Windows restored when the device reports none.
pub const DEFAULT_TIMING_WINDOWS: [u32; TIMING_WINDOW_COUNT] = [200, 300, 400, 500];
