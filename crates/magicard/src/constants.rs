//! Mifare Classic 1K geometry, command opcodes and magic-card constants

/// Number of UID bytes used for authentication (single size NFCID1)
pub const UID_SIZE: usize = 4;
/// Size of a sector key in bytes
pub const KEY_SIZE: usize = 6;
/// Size of a data block in bytes
pub const BLOCK_SIZE: usize = 16;
/// Number of sectors on a 1K card
pub const SECTOR_COUNT: u8 = 16;
/// Number of blocks in each sector
pub const BLOCKS_PER_SECTOR: u8 = 4;
/// Total number of addressable blocks
pub const BLOCKS_TOTAL: u8 = SECTOR_COUNT * BLOCKS_PER_SECTOR;
/// Size of one sector in bytes
pub const SECTOR_SIZE: usize = BLOCK_SIZE * BLOCKS_PER_SECTOR as usize;
/// Size of a full card image in bytes
pub const DUMP_SIZE: usize = SECTOR_SIZE * SECTOR_COUNT as usize;

/// Offset of the access condition bytes inside a trailer block
pub const ACS_OFFSET: usize = 6;
/// Access bytes plus the general purpose byte
pub const ACS_SIZE: usize = 4;

/// Capacity of the receive scratch buffer
pub const RX_BUFFER_SIZE: usize = 264;

/// Key every blank card ships with
pub const FACTORY_KEY: [u8; KEY_SIZE] = [0xFF; KEY_SIZE];

/// Mifare Classic command opcodes
pub mod cmd {
    /// Authenticate with key A
    pub const AUTH_A: u8 = 0x60;
    /// Authenticate with key B
    pub const AUTH_B: u8 = 0x61;
    /// Read one block
    pub const READ: u8 = 0x30;
    /// Write one block
    pub const WRITE: u8 = 0xA0;
    /// HLTA, sent with the second byte zeroed
    pub const HALT: [u8; 2] = [0x50, 0x00];
}

/// Chinese backdoor ("magic") commands and fingerprints
pub mod magic {
    /// First unlock command, sent as a 7-bit short frame
    pub const UNLOCK_1: u8 = 0x40;
    /// Number of bits transmitted for [`UNLOCK_1`]
    pub const UNLOCK_1_BITS: usize = 7;
    /// Second unlock command, only answered by Gen1A cards
    pub const UNLOCK_2: u8 = 0x43;
    /// 4-bit acknowledgement returned by the tag
    pub const ACK: u8 = 0x0A;
    /// Leading ATS bytes reported by known Gen2 (CUID) cards
    pub const GEN2_ATS: [u8; 9] = [0x09, 0x78, 0x00, 0x91, 0x02, 0xDA, 0xBC, 0x19, 0x10];
}
