//! Core error type for all card operations
//!
//! Every protocol operation reports failure through [`Error`]. Variants fall in
//! four groups: argument validation (no I/O was attempted), soft rejection by
//! the tag, transport failures and framing failures. Orchestration errors wrap
//! the first failing unit.

use crate::adapter::AdapterError;
use crate::types::MagicCardType;

/// Result type for card operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    //
    // Validation errors
    //
    /// Sector index out of range
    #[error("Invalid sector: {0}")]
    InvalidSector(u8),

    /// Block address out of range
    #[error("Invalid block: {0}")]
    InvalidBlock(u8),

    /// Key is not 6 bytes long
    #[error("Invalid key length: {0}")]
    InvalidKeyLength(usize),

    /// Payload has the wrong size
    #[error("Invalid data length: expected {expected}, got {actual}")]
    InvalidDataLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Target reported a UID shorter than 4 bytes
    #[error("Invalid UID length: {0}")]
    InvalidUid(usize),

    //
    // Protocol errors
    //
    /// Reader adapter failure, including soft rejections by the tag
    #[error(transparent)]
    Transport(#[from] AdapterError),

    /// Response of unexpected length
    #[error("Framing error: expected {expected} bytes, received {actual}")]
    Framing {
        /// Expected response length
        expected: usize,
        /// Received response length
        actual: usize,
    },

    /// Neither the factory key nor the provided key opened the sector
    #[error("Authentication failed for sector {sector}")]
    AuthenticationFailed {
        /// Sector index
        sector: u8,
    },

    /// The backdoor unlock was not acknowledged
    #[error("Backdoor unlock rejected")]
    BackdoorRejected,

    /// Operation needs a magic card of another kind
    #[error("Unsupported card: {0}")]
    UnsupportedCard(MagicCardType),

    /// No target is selected
    #[error("No target selected")]
    NoTarget,

    /// Waiting for a card was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    //
    // Orchestration errors
    //
    /// Writing or reading a sector failed
    #[error("Sector {sector}: {source}")]
    Sector {
        /// Sector index
        sector: u8,
        /// First failure within the sector
        source: Box<Self>,
    },

    /// Writing the manufacturer block failed
    #[error("Manufacturer block: {source}")]
    ManufacturerBlock {
        /// Underlying failure
        source: Box<Self>,
    },
}

impl Error {
    /// Wrap an error as the failure of `sector`
    pub fn in_sector(self, sector: u8) -> Self {
        Self::Sector {
            sector,
            source: Box::new(self),
        }
    }

    /// Whether the arguments were rejected before any I/O
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidSector(_)
                | Self::InvalidBlock(_)
                | Self::InvalidKeyLength(_)
                | Self::InvalidDataLength { .. }
                | Self::InvalidUid(_)
        )
    }

    /// Whether the tag refused the command under its current access bits
    pub fn is_soft_rejection(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_frame_rejected(),
            Self::Sector { source, .. } | Self::ManufacturerBlock { source } => {
                source.is_soft_rejection()
            }
            _ => false,
        }
    }

    /// Sector that failed, for orchestration errors
    pub const fn failed_sector(&self) -> Option<u8> {
        match self {
            Self::Sector { sector, .. } | Self::AuthenticationFailed { sector } => Some(*sector),
            _ => None,
        }
    }
}
