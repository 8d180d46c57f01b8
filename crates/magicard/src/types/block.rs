//! Blocks, UIDs and sector/block arithmetic

use std::fmt;

use derive_more::{Deref, DerefMut, From};

use crate::constants::{BLOCK_SIZE, BLOCKS_PER_SECTOR, BLOCKS_TOTAL, SECTOR_COUNT, UID_SIZE};
use crate::{Error, Result};

/// 4 byte UID of the selected tag
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Deref, From)]
pub struct Uid([u8; UID_SIZE]);

impl Uid {
    /// Create a UID from its bytes
    pub const fn new(bytes: [u8; UID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Take the first [`UID_SIZE`] bytes of an NFCID1
    pub fn from_nfcid(nfcid: &[u8]) -> Result<Self> {
        nfcid
            .get(..UID_SIZE)
            .and_then(|bytes| bytes.try_into().ok())
            .map(Self)
            .ok_or(Error::InvalidUid(nfcid.len()))
    }

    /// Block check character, XOR of the UID bytes
    pub fn bcc(&self) -> u8 {
        self.0.iter().fold(0, |acc, byte| acc ^ byte)
    }

    /// UID bytes
    pub const fn as_bytes(&self) -> &[u8; UID_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", hex::encode_upper(self.0))
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

/// 16 byte data block
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Deref, DerefMut, From)]
pub struct Block([u8; BLOCK_SIZE]);

impl Block {
    /// All zero block
    pub const EMPTY: Self = Self([0; BLOCK_SIZE]);

    /// Create a block from its bytes
    pub const fn new(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a block from a slice, checking its length
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; BLOCK_SIZE] = bytes.try_into().map_err(|_| Error::InvalidDataLength {
            expected: BLOCK_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(bytes))
    }

    /// Block bytes
    pub const fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for Block {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", hex::encode_upper(self.0))
    }
}

/// Whether `block` is the first block of its sector
pub const fn is_first_block(block: u8) -> bool {
    block % BLOCKS_PER_SECTOR == 0
}

/// Whether `block` is the trailer (keys and access bits) of its sector
pub const fn is_trailer_block(block: u8) -> bool {
    (block as u16 + 1) % BLOCKS_PER_SECTOR as u16 == 0
}

/// Trailer block of the sector containing `block`
pub const fn trailer_block(block: u8) -> u8 {
    block | (BLOCKS_PER_SECTOR - 1)
}

/// Sector containing `block`
pub const fn sector_of(block: u8) -> u8 {
    block / BLOCKS_PER_SECTOR
}

/// First block of `sector`
pub const fn first_block(sector: u8) -> u8 {
    sector * BLOCKS_PER_SECTOR
}

pub(crate) const fn check_sector(sector: u8) -> Result<()> {
    if sector >= SECTOR_COUNT {
        return Err(Error::InvalidSector(sector));
    }
    Ok(())
}

pub(crate) const fn check_block(block: u8) -> Result<()> {
    if block >= BLOCKS_TOTAL {
        return Err(Error::InvalidBlock(block));
    }
    Ok(())
}
