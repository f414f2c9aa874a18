use crate::storage::StorageError;

/// Update progress as reported on the status channel. The wire encoding is
/// the discriminant byte.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OtaStatus {
    Idle = 0,
    Ready = 1,
    Updating = 2,
    Complete = 3,
    Failed = 4,
}

/// One-byte commands accepted on the control channel.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OtaCommand {
    Start = 0,
    Cancel = 1,
    Confirm = 2,
}

impl OtaCommand {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(OtaCommand::Start),
            1 => Some(OtaCommand::Cancel),
            2 => Some(OtaCommand::Confirm),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OtaError {
    /// The layout advertises no bank to stage into.
    NoCandidateBank,
    /// The resolved candidate is the bank we are running from.
    CandidateIsRunning,
    /// Candidate bank too small for the largest expected image.
    BankTooSmall,
    /// Confirm received with no staged image to promote.
    NoStagedImage,
    Storage(StorageError),
}

impl From<StorageError> for OtaError {
    fn from(e: StorageError) -> Self {
        OtaError::Storage(e)
    }
}
