//! Manufacturer block (block 0) layout

use crate::types::{Block, Uid};

/// Decoded manufacturer block
///
/// ```text
/// 0..4   UID
/// 4      BCC (XOR of the UID bytes)
/// 5      SAK
/// 6..8   ATQA
/// 8..16  manufacturer data
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturerInfo {
    /// UID
    pub uid: Uid,
    /// Block check character
    pub bcc: u8,
    /// Select acknowledge
    pub sak: u8,
    /// Answer to request, as stored on the card
    pub atqa: [u8; 2],
    /// Manufacturer data
    pub data: [u8; 8],
}

impl ManufacturerInfo {
    /// Whether the stored BCC matches the UID
    ///
    /// Writing a block 0 with a bad BCC bricks most Gen1 cards.
    pub fn is_bcc_valid(&self) -> bool {
        self.uid.bcc() == self.bcc
    }

    /// Encode back to a block
    pub fn to_block(&self) -> Block {
        let mut block = Block::EMPTY;
        block[0..4].copy_from_slice(self.uid.as_bytes());
        block[4] = self.bcc;
        block[5] = self.sak;
        block[6..8].copy_from_slice(&self.atqa);
        block[8..16].copy_from_slice(&self.data);
        block
    }
}

impl From<&Block> for ManufacturerInfo {
    fn from(block: &Block) -> Self {
        let mut uid = [0u8; 4];
        uid.copy_from_slice(&block[0..4]);
        let mut data = [0u8; 8];
        data.copy_from_slice(&block[8..16]);
        Self {
            uid: Uid::new(uid),
            bcc: block[4],
            sak: block[5],
            atqa: [block[6], block[7]],
            data,
        }
    }
}
