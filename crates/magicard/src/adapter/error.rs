//! Error types reported by reader adapters

/// Reader adapter error
///
/// Variants follow the negative status codes used by libnfc-style drivers so
/// that bindings can convert with [`AdapterError::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Input/output error
    #[error("Input/output error")]
    Io,

    /// Invalid argument passed to the driver
    #[error("Invalid argument")]
    InvalidArgument,

    /// Operation not supported by the device
    #[error("Operation not supported by device")]
    DeviceNotSupported,

    /// No such device
    #[error("No such device")]
    NoSuchDevice,

    /// Buffer overflow
    #[error("Buffer overflow")]
    Overflow,

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Operation aborted by the host
    #[error("Operation aborted")]
    OperationAborted,

    /// Not implemented by the driver
    #[error("Not implemented")]
    NotImplemented,

    /// Target released
    #[error("Target released")]
    TargetReleased,

    /// Invalid received frame
    ///
    /// Usually means the tag is reachable, but the requested Mifare command is
    /// not permitted by the current access bits.
    #[error("Invalid received frame")]
    FrameRejected,

    /// Mifare authentication failed
    #[error("Mifare authentication failed")]
    MifareAuthFailed,

    /// Software error (driver bug)
    #[error("Software error")]
    Software,

    /// Device's internal chip error
    #[error("Device's internal chip error")]
    Chip,

    /// Driver specific error code
    #[error("Driver error code: {0}")]
    Driver(i32),
}

impl AdapterError {
    /// Convert a negative driver status code
    pub const fn from_code(code: i32) -> Self {
        match code {
            -1 => Self::Io,
            -2 => Self::InvalidArgument,
            -3 => Self::DeviceNotSupported,
            -4 => Self::NoSuchDevice,
            -5 => Self::Overflow,
            -6 => Self::Timeout,
            -7 => Self::OperationAborted,
            -8 => Self::NotImplemented,
            -10 => Self::TargetReleased,
            -20 => Self::FrameRejected,
            -30 => Self::MifareAuthFailed,
            -80 => Self::Software,
            -90 => Self::Chip,
            other => Self::Driver(other),
        }
    }

    /// Driver status code of this error
    pub const fn code(&self) -> i32 {
        match self {
            Self::Io => -1,
            Self::InvalidArgument => -2,
            Self::DeviceNotSupported => -3,
            Self::NoSuchDevice => -4,
            Self::Overflow => -5,
            Self::Timeout => -6,
            Self::OperationAborted => -7,
            Self::NotImplemented => -8,
            Self::TargetReleased => -10,
            Self::FrameRejected => -20,
            Self::MifareAuthFailed => -30,
            Self::Software => -80,
            Self::Chip => -90,
            Self::Driver(code) => *code,
        }
    }

    /// Whether this is the benign "frame rejected" condition
    pub const fn is_frame_rejected(&self) -> bool {
        matches!(self, Self::FrameRejected)
    }
}
