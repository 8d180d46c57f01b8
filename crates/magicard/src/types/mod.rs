//! Data types for Mifare Classic cards

pub mod access;
pub mod block;
mod dump;
mod key;
mod magic;
mod manufacturer;

pub use access::{AccessBits, AccessConditions};
pub use block::{
    Block, Uid, first_block, is_first_block, is_trailer_block, sector_of, trailer_block,
};
pub use dump::Dump;
pub use key::{Key, KeyType};
pub use magic::MagicCardType;
pub use manufacturer::ManufacturerInfo;
