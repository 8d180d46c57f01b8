//! Detection and block-level access for magic Mifare Classic 1K cards
//!
//! "Magic" cards are Mifare Classic clones whose manufacturer block (block 0,
//! holding the UID) can be rewritten. This crate drives such cards through any
//! contactless reader implementing [`ReaderAdapter`].
//!
//! ## Overview
//!
//! - Classify the card in the field: Gen1A and Gen1B answer a backdoor unlock
//!   sequence, Gen2 (CUID) cards accept normal writes to block 0
//! - Authenticate sectors with the factory key or keys from a [`KeyProvider`]
//! - Read and write blocks, sectors and full 1024 byte dumps
//! - Rewrite the manufacturer block through the path the card generation allows
//!
//! ```ignore
//! use magicard::prelude::*;
//!
//! let mut card = MifareClassic::builder(reader)
//!     .logger(TracingLogger)
//!     .build();
//! card.initialize_device()?;
//! card.wait_for_card()?;
//! if card.identify_magic_card_type()?.is_magic() {
//!     card.write_dump(&image)?;
//! }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::Bytes;

// Main modules
pub mod adapter;
pub mod cancel;
pub mod card;
pub mod config;
pub mod constants;
pub mod provider;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Core error types
mod error;
pub use error::{Error, Result};

pub use adapter::{AdapterError, Modulation, Property, ReaderAdapter, Target};
pub use cancel::CancellationToken;
pub use card::{MifareClassic, MifareClassicBuilder};
pub use config::{Gen2Probe, SessionConfig};
pub use provider::{
    KeyProvider, Logger, NoKeyProvider, NoopLogger, StaticKeyProvider, TracingLogger,
};
pub use types::{
    AccessBits, AccessConditions, Block, Dump, Key, KeyType, MagicCardType, ManufacturerInfo, Uid,
};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        AccessConditions, Block, CancellationToken, Dump, Error, Gen2Probe, Key, KeyProvider,
        KeyType, Logger, MagicCardType, ManufacturerInfo, MifareClassic, Result, SessionConfig,
        StaticKeyProvider, TracingLogger, Uid,
        adapter::{AdapterError, ReaderAdapter},
    };
}
