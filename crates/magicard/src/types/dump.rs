//! Full card images

use std::fmt;

use crate::constants::{BLOCK_SIZE, BLOCKS_PER_SECTOR, DUMP_SIZE, SECTOR_COUNT, SECTOR_SIZE};
use crate::types::Block;
use crate::types::block::{check_block, check_sector, first_block};
use crate::{Error, Result};

/// 1K card image, sector-major then block-minor, no header or checksum
#[derive(Clone, PartialEq, Eq)]
pub struct Dump(Box<[u8; DUMP_SIZE]>);

impl Dump {
    /// Create an image from raw bytes, checking the length
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; DUMP_SIZE] = bytes.try_into().map_err(|_| Error::InvalidDataLength {
            expected: DUMP_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(Box::new(bytes)))
    }

    /// Raw image bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Bytes of one sector
    pub fn sector(&self, sector: u8) -> Result<&[u8]> {
        check_sector(sector)?;
        let start = sector as usize * SECTOR_SIZE;
        Ok(&self.0[start..start + SECTOR_SIZE])
    }

    /// One block
    pub fn block(&self, block: u8) -> Result<Block> {
        check_block(block)?;
        let start = block as usize * BLOCK_SIZE;
        Block::from_slice(&self.0[start..start + BLOCK_SIZE])
    }

    /// Replace one block
    pub fn set_block(&mut self, block: u8, data: &Block) -> Result<()> {
        check_block(block)?;
        let start = block as usize * BLOCK_SIZE;
        self.0[start..start + BLOCK_SIZE].copy_from_slice(data.as_bytes());
        Ok(())
    }

    /// Replace the four blocks of a sector
    pub fn set_sector(
        &mut self,
        sector: u8,
        blocks: &[Block; BLOCKS_PER_SECTOR as usize],
    ) -> Result<()> {
        check_sector(sector)?;
        for (offset, block) in blocks.iter().enumerate() {
            self.set_block(first_block(sector) + offset as u8, block)?;
        }
        Ok(())
    }

    /// Manufacturer block (block 0)
    pub fn manufacturer_block(&self) -> Block {
        let mut block = Block::EMPTY;
        block.copy_from_slice(&self.0[..BLOCK_SIZE]);
        block
    }

    /// Iterate over `(sector, bytes)` pairs
    pub fn sectors(&self) -> impl Iterator<Item = (u8, &[u8])> {
        (0..SECTOR_COUNT).zip(self.0.chunks_exact(SECTOR_SIZE))
    }
}

impl Default for Dump {
    fn default() -> Self {
        Self(Box::new([0; DUMP_SIZE]))
    }
}

impl TryFrom<&[u8]> for Dump {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl AsRef<[u8]> for Dump {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Dump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dump")
            .field("manufacturer_block", &self.manufacturer_block())
            .finish_non_exhaustive()
    }
}
