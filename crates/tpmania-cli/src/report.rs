//! User-facing text for transfer outcomes.

use tpmania_serial_protocol::TransferStatus;

/// Message shown to the user for a finished operation.
pub fn describe(status: TransferStatus) -> String {
    match status {
        TransferStatus::Success => "Successfully saved to device.".to_string(),
        TransferStatus::Received(location) => format!(
            "Retrieved the sequence stored in {} from the device.",
            location.as_str()
        ),
        TransferStatus::Timeout => {
            "Process timed out. Check the device mode and connections.".to_string()
        }
        TransferStatus::DeviceNotConnected => "Device is not connected, or the connection \
             was lost. Select a serial port and try again."
            .to_string(),
        TransferStatus::SaveLocationUnspecified => {
            "Select a location on the device to save to (--ram and/or --eeprom).".to_string()
        }
        TransferStatus::NoSequenceSelected => {
            "No sequence file has been selected.".to_string()
        }
        TransferStatus::TimingWindowOrderInvalid => "Timing windows must be in strictly \
             increasing order: Perfect < Good < OK < Poor."
            .to_string(),
        TransferStatus::UnknownDeviceResponse => {
            "The device sent an unexpected response.".to_string()
        }
        TransferStatus::NoSequenceOnDevice => {
            "No sequence is stored in that location. Save a sequence and try again.".to_string()
        }
        TransferStatus::FileAccess => "The sequence file could not be read or written.".to_string(),
    }
}

/// Process exit code for a status.
pub fn exit_code(status: TransferStatus) -> i32 {
    match status {
        TransferStatus::Success | TransferStatus::Received(_) => 0,
        TransferStatus::Timeout => 2,
        TransferStatus::DeviceNotConnected => 3,
        _ => 1,
    }
}
