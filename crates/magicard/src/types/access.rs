//! Sector trailer access conditions
//!
//! A trailer stores the access bits of its four blocks in bytes 6..9, each
//! bit stored twice (once inverted):
//!
//! ```text
//! byte 6:  !C2_3 !C2_2 !C2_1 !C2_0  !C1_3 !C1_2 !C1_1 !C1_0
//! byte 7:   C1_3  C1_2  C1_1  C1_0  !C3_3 !C3_2 !C3_1 !C3_0
//! byte 8:   C3_3  C3_2  C3_1  C3_0   C2_3  C2_2  C2_1  C2_0
//! ```
//!
//! Byte 9 is the general purpose (user) byte.

use crate::constants::{ACS_OFFSET, ACS_SIZE, BLOCKS_PER_SECTOR};
use crate::types::Block;

/// Access bits (C1, C2, C3) of one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessBits {
    /// C1
    pub c1: bool,
    /// C2
    pub c2: bool,
    /// C3
    pub c3: bool,
}

impl AccessBits {
    /// Bits packed as `C1 C2 C3`, as access tables list them
    pub const fn value(&self) -> u8 {
        ((self.c1 as u8) << 2) | ((self.c2 as u8) << 1) | self.c3 as u8
    }
}

/// Raw access condition bytes of a sector trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessConditions([u8; ACS_SIZE]);

impl AccessConditions {
    /// Transport configuration of blank cards (`FF 07 80 69`)
    pub const TRANSPORT: Self = Self([0xFF, 0x07, 0x80, 0x69]);

    /// Create access conditions from raw bytes
    pub const fn new(bytes: [u8; ACS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Extract the access conditions of a trailer block
    pub fn from_trailer(trailer: &Block) -> Self {
        let mut bytes = [0u8; ACS_SIZE];
        bytes.copy_from_slice(&trailer[ACS_OFFSET..ACS_OFFSET + ACS_SIZE]);
        Self(bytes)
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; ACS_SIZE] {
        &self.0
    }

    /// General purpose byte
    pub const fn user_byte(&self) -> u8 {
        self.0[3]
    }

    /// Whether the inverted copies match the access bits
    pub const fn is_valid(&self) -> bool {
        let [b6, b7, b8, _] = self.0;
        // Non inverted nibbles: C1 (b7 high), C2 (b8 low), C3 (b8 high)
        let c1 = b7 >> 4;
        let c2 = b8 & 0x0F;
        let c3 = b8 >> 4;
        (!b6 & 0x0F) == c1 && ((!b6 >> 4) & 0x0F) == c2 && (!b7 & 0x0F) == c3
    }

    /// Access bits of a block within the sector (0 to 3, 3 being the trailer)
    ///
    /// Returns `None` when the index is out of range or the bytes are
    /// inconsistent.
    pub const fn access_bits(&self, block_in_sector: u8) -> Option<AccessBits> {
        if block_in_sector >= BLOCKS_PER_SECTOR || !self.is_valid() {
            return None;
        }
        let [_, b7, b8, _] = self.0;
        Some(AccessBits {
            c1: (b7 >> (4 + block_in_sector)) & 1 == 1,
            c2: (b8 >> block_in_sector) & 1 == 1,
            c3: (b8 >> (4 + block_in_sector)) & 1 == 1,
        })
    }
}

impl AsRef<[u8]> for AccessConditions {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
