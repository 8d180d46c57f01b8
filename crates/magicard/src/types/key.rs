//! Sector keys

use derive_more::Deref;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{FACTORY_KEY, KEY_SIZE, cmd};
use crate::{Error, Result};

/// Which of the two sector keys is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum KeyType {
    /// Key A
    #[display("A")]
    A,
    /// Key B
    #[display("B")]
    B,
}

impl KeyType {
    /// Authentication opcode for this key
    pub const fn auth_command(&self) -> u8 {
        match self {
            Self::A => cmd::AUTH_A,
            Self::B => cmd::AUTH_B,
        }
    }
}

/// A 6 byte Mifare Classic sector key, wiped on drop
#[derive(Clone, PartialEq, Eq, Deref, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Transport key of blank cards (`FF FF FF FF FF FF`)
    pub const FACTORY: Self = Self(FACTORY_KEY);

    /// Create a key from its bytes
    pub const fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a key from a slice, checking its length
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::InvalidKeyLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    /// Key bytes
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl From<[u8; KEY_SIZE]> for Key {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_slice(bytes)
    }
}

// Keys never end up in logs
impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key(**)")
    }
}
