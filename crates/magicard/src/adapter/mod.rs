//! Reader adapter abstraction
//!
//! The protocol engine never talks to hardware directly. A reader driver
//! (libnfc binding, PN532 over UART, a simulator...) implements
//! [`ReaderAdapter`] and the engine drives it through ISO14443A frames.

pub mod error;

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
pub use error::AdapterError;
use tracing::{debug, error, trace};

/// Boolean reader properties toggled by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Keep polling forever when selecting a target
    InfiniteSelect,
    /// Switch to ISO14443-4 automatically when the target supports it
    AutoIso14443_4,
    /// Append CRC to sent frames and check it on received frames
    HandleCrc,
    /// Let the reader wrap Mifare commands ("easy framing")
    ///
    /// Disabled, frames go to the tag as-is.
    EasyFraming,
}

/// Modulation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationType {
    /// ISO/IEC 14443 type A
    Iso14443a,
}

/// Baud rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    /// 106 kbps
    Nbr106,
}

/// Modulation used to select a passive target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modulation {
    /// Modulation type
    pub modulation_type: ModulationType,
    /// Baud rate
    pub baud_rate: BaudRate,
}

impl Modulation {
    /// ISO14443A at 106 kbps, the only modulation Mifare Classic speaks
    pub const ISO14443A_106: Self = Self {
        modulation_type: ModulationType::Iso14443a,
        baud_rate: BaudRate::Nbr106,
    };
}

/// Target information returned by a successful selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    /// NFCID1 as reported by anticollision
    pub uid: Bytes,
    /// Answer to select, empty when the tag sent none
    pub ats: Bytes,
}

impl Target {
    /// Create target information
    pub fn new(uid: impl Into<Bytes>, ats: impl Into<Bytes>) -> Self {
        Self {
            uid: uid.into(),
            ats: ats.into(),
        }
    }
}

/// Capability the engine needs from a contactless reader
///
/// Calls block until the reader answers or its own timeout fires. A reader
/// holds card state (framing mode, authenticated sector) across calls and is
/// driven by one session at a time.
pub trait ReaderAdapter: fmt::Debug {
    /// Initialise the device as initiator
    fn initiator_init(&mut self) -> Result<(), AdapterError>;

    /// Set a boolean device property
    fn set_property(&mut self, property: Property, enable: bool) -> Result<(), AdapterError>;

    /// Select a passive target, `None` when no tag is in the field
    fn select_passive_target(
        &mut self,
        modulation: Modulation,
    ) -> Result<Option<Target>, AdapterError>;

    /// Send bytes and receive the answer into `rx`
    ///
    /// Returns the number of bytes received.
    fn transceive_bytes(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, AdapterError> {
        trace!(tx = %hex::encode(tx), "Transceiving bytes");
        let result = self.do_transceive_bytes(tx, rx, timeout);
        match &result {
            Ok(len) => {
                trace!(rx = %hex::encode(&rx[..(*len).min(rx.len())]), "Received bytes");
            }
            Err(e) => {
                debug!(error = ?e, "Transceive failed");
            }
        }
        result
    }

    /// Driver implementation of [`ReaderAdapter::transceive_bytes`]
    fn do_transceive_bytes(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, AdapterError>;

    /// Send the first `tx_bits` bits of `tx` and receive the answer into `rx`
    ///
    /// Returns the number of bits received.
    fn transceive_bits(
        &mut self,
        tx: &[u8],
        tx_bits: usize,
        rx: &mut [u8],
    ) -> Result<usize, AdapterError> {
        trace!(tx = %hex::encode(tx), tx_bits, "Transceiving bits");
        let result = self.do_transceive_bits(tx, tx_bits, rx);
        if let Err(e) = &result {
            debug!(error = ?e, "Bit transceive failed");
        }
        result
    }

    /// Driver implementation of [`ReaderAdapter::transceive_bits`]
    fn do_transceive_bits(
        &mut self,
        tx: &[u8],
        tx_bits: usize,
        rx: &mut [u8],
    ) -> Result<usize, AdapterError>;

    /// Append the ISO14443A CRC of `frame` to it
    fn append_crc_a(&self, frame: &mut Vec<u8>) {
        let crc = crc_a(frame);
        frame.extend_from_slice(&crc);
    }

    /// Error sink for transport failures
    fn report_error(&self, context: &str, error: &AdapterError) {
        error!(context, code = error.code(), "{error}");
    }
}

/// ISO14443A CRC (CRC_A), least significant byte first
pub fn crc_a(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0x6363;
    for &byte in data {
        let mut bt = byte ^ (crc & 0x00FF) as u8;
        bt ^= bt << 4;
        crc = (crc >> 8) ^ ((bt as u16) << 8) ^ ((bt as u16) << 3) ^ ((bt as u16) >> 4);
    }
    crc.to_le_bytes()
}
