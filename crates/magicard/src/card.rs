//! Mifare Classic session: magic card detection, authentication, block I/O
//! and sector/dump orchestration.

use std::fmt;
use std::thread;

use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

use crate::adapter::{AdapterError, Modulation, Property, ReaderAdapter, Target};
use crate::cancel::CancellationToken;
use crate::config::{Gen2Probe, SessionConfig};
use crate::constants::{
    BLOCK_SIZE, BLOCKS_PER_SECTOR, KEY_SIZE, RX_BUFFER_SIZE, SECTOR_COUNT, SECTOR_SIZE, cmd, magic,
};
use crate::provider::{
    BoxedKeyProvider, BoxedLogger, KeyProvider, Logger, NoKeyProvider, NoopLogger,
};
use crate::types::block::{check_block, check_sector};
use crate::types::{
    AccessConditions, Block, Dump, Key, KeyType, MagicCardType, ManufacturerInfo, Uid,
    first_block, trailer_block,
};
use crate::{Error, Result};

/// Properties disabled while talking to the backdoor
const RAW_FRAMING: [Property; 2] = [Property::HandleCrc, Property::EasyFraming];

/// Session with the Mifare Classic card in a reader's field
///
/// The session owns the reader, the selected target and its magic
/// classification, plus the single receive buffer every exchange uses. All
/// protocol operations take `&mut self`: one operation at a time, and callers
/// sharing a session across threads must serialize access themselves.
pub struct MifareClassic<A: ReaderAdapter> {
    /// Reader driving the field
    adapter: A,
    /// Last selected target
    target: Option<Target>,
    /// UID of the last selected target
    uid: Option<Uid>,
    /// Classification from the last detection run
    magic_card_type: MagicCardType,
    /// Receive scratch buffer
    rx: Box<[u8; RX_BUFFER_SIZE]>,
    key_provider: BoxedKeyProvider,
    logger: BoxedLogger,
    config: SessionConfig,
    cancellation: CancellationToken,
}

impl<A: ReaderAdapter> fmt::Debug for MifareClassic<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MifareClassic")
            .field("adapter", &self.adapter)
            .field("uid", &self.uid)
            .field("magic_card_type", &self.magic_card_type)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`MifareClassic`]
pub struct MifareClassicBuilder<A: ReaderAdapter> {
    adapter: A,
    key_provider: BoxedKeyProvider,
    logger: BoxedLogger,
    config: SessionConfig,
    cancellation: CancellationToken,
}

impl<A: ReaderAdapter> fmt::Debug for MifareClassicBuilder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MifareClassicBuilder")
            .field("adapter", &self.adapter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<A: ReaderAdapter> MifareClassicBuilder<A> {
    /// Key provider consulted when the factory key fails
    pub fn key_provider(mut self, provider: impl KeyProvider + Send + 'static) -> Self {
        self.key_provider = BoxedKeyProvider(Box::new(provider));
        self
    }

    /// Logger receiving sector and dump write progress
    pub fn logger(mut self, logger: impl Logger + Send + 'static) -> Self {
        self.logger = BoxedLogger(Box::new(logger));
        self
    }

    /// Session configuration
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Token aborting [`MifareClassic::wait_for_card`]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Build the session
    pub fn build(self) -> MifareClassic<A> {
        MifareClassic {
            adapter: self.adapter,
            target: None,
            uid: None,
            magic_card_type: MagicCardType::None,
            rx: Box::new([0; RX_BUFFER_SIZE]),
            key_provider: self.key_provider,
            logger: self.logger,
            config: self.config,
            cancellation: self.cancellation,
        }
    }
}

impl<A: ReaderAdapter> MifareClassic<A> {
    /// Create a session with no key provider, no logger and default config
    pub fn new(adapter: A) -> Self {
        Self::builder(adapter).build()
    }

    /// Start building a session
    pub fn builder(adapter: A) -> MifareClassicBuilder<A> {
        MifareClassicBuilder {
            adapter,
            key_provider: BoxedKeyProvider(Box::new(NoKeyProvider)),
            logger: BoxedLogger(Box::new(NoopLogger)),
            config: SessionConfig::default(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Classification from the last detection run
    pub const fn magic_card_type(&self) -> MagicCardType {
        self.magic_card_type
    }

    /// UID of the selected target
    pub const fn uid(&self) -> Option<Uid> {
        self.uid
    }

    /// Selected target information
    pub const fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Session configuration
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Underlying reader
    pub const fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Mutable access to the underlying reader
    pub const fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Take the reader back
    pub fn into_adapter(self) -> A {
        self.adapter
    }

    //
    // Target selection
    //

    /// Initialise the reader as initiator for Mifare Classic
    ///
    /// Failures are reported to the reader's error sink; the first one is
    /// returned after every step was attempted.
    pub fn initialize_device(&mut self) -> Result<()> {
        let mut outcome = Ok(());
        if let Err(e) = self.adapter.initiator_init() {
            self.adapter.report_error("initiator_init", &e);
            outcome = Err(e.into());
        }
        for (property, enable) in [
            (Property::InfiniteSelect, self.config.infinite_select),
            (Property::AutoIso14443_4, self.config.auto_iso14443_4),
        ] {
            if let Err(e) = self.adapter.set_property(property, enable) {
                self.adapter.report_error("set_property", &e);
                if outcome.is_ok() {
                    outcome = Err(e.into());
                }
            }
        }
        outcome
    }

    /// Try once to select an ISO14443A target
    ///
    /// Returns whether a target answered. Selecting a card with another UID
    /// drops the previous classification.
    pub fn select_card(&mut self) -> Result<bool> {
        let Some(target) = self.adapter.select_passive_target(Modulation::ISO14443A_106)? else {
            return Ok(false);
        };
        let uid = Uid::from_nfcid(&target.uid)?;
        if self.uid.is_some_and(|previous| previous != uid) {
            debug!(%uid, "Different card selected, dropping classification");
            self.magic_card_type = MagicCardType::None;
        }
        self.uid = Some(uid);
        self.target = Some(target);
        Ok(true)
    }

    /// Poll until a target is selected
    ///
    /// Returns [`Error::Cancelled`] once the session's cancellation token
    /// fires; there is no other timeout.
    #[instrument(level = "debug", skip(self))]
    pub fn wait_for_card(&mut self) -> Result<()> {
        loop {
            if self.cancellation.is_cancelled() {
                debug!("Waiting for card cancelled");
                return Err(Error::Cancelled);
            }
            match self.select_card() {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => debug!(error = %e, "Selection attempt failed"),
            }
            if let Some(interval) = self.config.poll_interval {
                thread::sleep(interval);
            }
        }
    }

    fn reselect(&mut self) {
        // A failed command leaves the tag idle until it is selected again
        if let Err(e) = self.select_card() {
            debug!(error = %e, "Reselection failed");
        }
    }

    fn require_uid(&self) -> Result<Uid> {
        self.uid.ok_or(Error::NoTarget)
    }

    //
    // Magic card detection
    //

    /// Classify the selected card
    ///
    /// Runs the backdoor probe, then the Gen2 probe when no backdoor answered.
    /// With [`Gen2Probe::WriteBack`] configured the Gen2 probe may write block 0
    /// back with its own content, see [`MifareClassic::probe_gen2_write_back`].
    ///
    /// Only fails when waiting for the card again is cancelled.
    #[instrument(level = "debug", skip(self))]
    pub fn identify_magic_card_type(&mut self) -> Result<MagicCardType> {
        self.magic_card_type = MagicCardType::None;

        let detected = self.unlock_card();
        if detected.is_magic() {
            debug!(%detected, "Backdoor answered");
            self.magic_card_type = detected;
            return Ok(detected);
        }

        // The backdoor probe halted the card
        if let Err(e) = self.initialize_device() {
            debug!(error = %e, "Reinitialising the reader failed");
        }
        self.wait_for_card()?;

        let detected = if self.is_magic_gen2() {
            MagicCardType::Gen2
        } else {
            MagicCardType::None
        };
        debug!(%detected, "Card classified");
        self.magic_card_type = detected;
        Ok(detected)
    }

    /// Probe the Gen1 backdoor
    ///
    /// Returns [`MagicCardType::Gen1A`] or [`MagicCardType::Gen1B`] depending on
    /// which unlock commands were acknowledged, [`MagicCardType::None`] when
    /// none was or raw framing could not be entered.
    pub fn unlock_card(&mut self) -> MagicCardType {
        self.with_raw_framing(Self::send_unlock_sequence)
            .unwrap_or(MagicCardType::None)
    }

    fn send_unlock_sequence(&mut self) -> MagicCardType {
        let mut halt = cmd::HALT.to_vec();
        self.adapter.append_crc_a(&mut halt);
        // The tag does not answer HALT
        let _ = self
            .adapter
            .transceive_bytes(&halt, &mut self.rx[..], self.config.transceive_timeout);

        let acknowledged = |result: std::result::Result<usize, AdapterError>, rx: &[u8]| {
            matches!(result, Ok(received) if received > 0) && rx[0] == magic::ACK
        };

        let result =
            self.adapter
                .transceive_bits(&[magic::UNLOCK_1], magic::UNLOCK_1_BITS, &mut self.rx[..]);
        if !acknowledged(result, &self.rx[..]) {
            return MagicCardType::None;
        }

        let result = self.adapter.transceive_bytes(
            &[magic::UNLOCK_2],
            &mut self.rx[..],
            self.config.transceive_timeout,
        );
        if acknowledged(result, &self.rx[..]) {
            MagicCardType::Gen1A
        } else {
            MagicCardType::Gen1B
        }
    }

    /// Run `operation` with CRC handling and easy framing disabled
    ///
    /// Framing is restored afterwards; restoration failures are reported but
    /// do not change the outcome.
    fn with_raw_framing<T>(&mut self, operation: impl FnOnce(&mut Self) -> T) -> Result<T> {
        for (index, property) in RAW_FRAMING.into_iter().enumerate() {
            if let Err(e) = self.adapter.set_property(property, false) {
                self.adapter.report_error("set_property", &e);
                self.restore_framing(&RAW_FRAMING[..index]);
                return Err(e.into());
            }
        }

        let outcome = operation(self);
        self.restore_framing(&RAW_FRAMING);
        Ok(outcome)
    }

    fn restore_framing(&mut self, properties: &[Property]) {
        for &property in properties {
            if let Err(e) = self.adapter.set_property(property, true) {
                self.adapter.report_error("set_property", &e);
            }
        }
    }

    fn is_magic_gen2(&mut self) -> bool {
        let ats_matches = self
            .target
            .as_ref()
            .is_some_and(|target| target.ats.starts_with(&magic::GEN2_ATS));
        if ats_matches {
            return true;
        }
        match self.config.gen2_probe {
            Gen2Probe::AtsOnly => false,
            Gen2Probe::WriteBack => self.probe_gen2_write_back().is_ok(),
        }
    }

    /// Detect a Gen2 card by writing block 0 back with its own content
    ///
    /// This is a real write: on a Gen2 card block 0 is rewritten, on other
    /// cards the tag rejects it.
    #[instrument(level = "debug", skip(self))]
    pub fn probe_gen2_write_back(&mut self) -> Result<()> {
        warn!(uid = ?self.uid, "Probing for Gen2 by rewriting block 0");
        self.authenticate_sector(0)?;
        let block = self.read_block(0)?;
        self.write_block(0, block)
    }

    //
    // Authentication
    //

    /// Authenticate `sector` with `key`
    ///
    /// A tag rejecting the frame is not reported to the error sink, other
    /// transport errors are. Either way the target is reselected, as a failed
    /// authentication resets the tag's crypto state.
    #[instrument(level = "debug", skip(self, key))]
    pub fn authenticate<K: AsRef<[u8]>>(
        &mut self,
        sector: u8,
        key_type: KeyType,
        key: K,
    ) -> Result<()> {
        let key = key.as_ref();
        if key.len() != KEY_SIZE {
            return Err(Error::InvalidKeyLength(key.len()));
        }
        check_sector(sector)?;
        let uid = self.require_uid()?;

        let mut frame = Zeroizing::new([0u8; 2 + KEY_SIZE + 4]);
        frame[0] = key_type.auth_command();
        frame[1] = first_block(sector);
        frame[2..2 + KEY_SIZE].copy_from_slice(key);
        frame[2 + KEY_SIZE..].copy_from_slice(uid.as_bytes());

        self.transceive(frame.as_slice(), "authenticate")?;
        Ok(())
    }

    /// Authenticate `sector` with key A: the factory key, then the provider's key
    pub fn authenticate_sector(&mut self, sector: u8) -> Result<()> {
        check_sector(sector)?;
        if self.authenticate(sector, KeyType::A, Key::FACTORY).is_ok() {
            return Ok(());
        }
        let uid = self.require_uid()?;
        if let Some(key) = self.key_provider.0.key_a(sector, &uid) {
            if self.authenticate(sector, KeyType::A, &key).is_ok() {
                return Ok(());
            }
        }
        debug!(sector, "No key opened the sector");
        Err(Error::AuthenticationFailed { sector })
    }

    //
    // Block I/O
    //

    /// Exchange one frame, reselecting the target on failure
    fn transceive(&mut self, frame: &[u8], context: &'static str) -> Result<usize> {
        match self
            .adapter
            .transceive_bytes(frame, &mut self.rx[..], self.config.transceive_timeout)
        {
            Ok(received) => Ok(received),
            Err(e) => {
                if e.is_frame_rejected() {
                    // Usually authenticated on a sector whose access bits
                    // forbid the command
                    debug!(context, "Frame rejected by tag");
                } else {
                    self.adapter.report_error(context, &e);
                }
                self.reselect();
                Err(e.into())
            }
        }
    }

    /// Read one block of the authenticated sector
    #[instrument(level = "debug", skip(self))]
    pub fn read_block(&mut self, block: u8) -> Result<Block> {
        check_block(block)?;
        let received = self.transceive(&[cmd::READ, block], "read_block")?;
        if received != BLOCK_SIZE {
            self.reselect();
            return Err(Error::Framing {
                expected: BLOCK_SIZE,
                actual: received,
            });
        }
        Block::from_slice(&self.rx[..BLOCK_SIZE])
    }

    /// Write one block of the authenticated sector
    #[instrument(level = "debug", skip(self, data))]
    pub fn write_block<D: AsRef<[u8]>>(&mut self, block: u8, data: D) -> Result<()> {
        let data = data.as_ref();
        if data.len() != BLOCK_SIZE {
            return Err(Error::InvalidDataLength {
                expected: BLOCK_SIZE,
                actual: data.len(),
            });
        }
        check_block(block)?;

        let mut frame = [0u8; 2 + BLOCK_SIZE];
        frame[0] = cmd::WRITE;
        frame[1] = block;
        frame[2..].copy_from_slice(data);
        self.transceive(&frame, "write_block")?;
        Ok(())
    }

    //
    // Manufacturer block and access conditions
    //

    /// Read block 0
    #[instrument(level = "debug", skip(self))]
    pub fn read_manufacturer_block(&mut self) -> Result<Block> {
        self.authenticate_sector(0)?;
        self.read_block(0)
    }

    /// Read and decode block 0
    pub fn read_manufacturer_info(&mut self) -> Result<ManufacturerInfo> {
        self.read_manufacturer_block()
            .map(|block| ManufacturerInfo::from(&block))
    }

    /// Write block 0 through the path the detected magic generation allows
    ///
    /// Gen1 cards are written through the backdoor without authentication,
    /// Gen2 cards through an authenticated write.
    #[instrument(level = "debug", skip(self, data))]
    pub fn write_manufacturer_block<D: AsRef<[u8]>>(&mut self, data: D) -> Result<()> {
        let block = Block::from_slice(data.as_ref())?;
        match self.magic_card_type {
            MagicCardType::Gen1A | MagicCardType::Gen1B => {
                let unlocked = self.with_raw_framing(Self::send_unlock_sequence)?;
                if !unlocked.is_gen1() {
                    warn!(expected = %self.magic_card_type, "Backdoor did not answer");
                    return Err(Error::BackdoorRejected);
                }
                self.write_block(0, block)
            }
            MagicCardType::Gen2 => {
                self.authenticate_sector(0)?;
                self.write_block(0, block)
            }
            MagicCardType::None => {
                warn!("Manufacturer block is read-only on this card");
                Err(Error::UnsupportedCard(MagicCardType::None))
            }
        }
    }

    /// Read the access conditions of `sector`
    #[instrument(level = "debug", skip(self))]
    pub fn read_access_conditions(&mut self, sector: u8) -> Result<AccessConditions> {
        check_sector(sector)?;
        self.authenticate_sector(sector)?;
        self.read_trailer_access_conditions(sector)
    }

    /// Read the access conditions of `sector` on an already authenticated session
    ///
    /// No authentication frame is sent; the tag rejects the read unless the
    /// last authentication opened `sector`.
    #[instrument(level = "debug", skip(self))]
    pub fn read_access_conditions_unauthenticated(
        &mut self,
        sector: u8,
    ) -> Result<AccessConditions> {
        check_sector(sector)?;
        self.read_trailer_access_conditions(sector)
    }

    fn read_trailer_access_conditions(&mut self, sector: u8) -> Result<AccessConditions> {
        let trailer = self.read_block(trailer_block(first_block(sector)))?;
        Ok(AccessConditions::from_trailer(&trailer))
    }

    //
    // Sector and dump orchestration
    //

    fn log(&self, message: &str) {
        self.logger.0.log(message);
    }

    /// Write the 4 blocks of `sector`
    ///
    /// Block 0 of a Gen1 card is skipped, it is only writable through
    /// [`MifareClassic::write_manufacturer_block`]. The first failing block
    /// aborts the sector; blocks written before it stay written.
    #[instrument(level = "debug", skip(self, data))]
    pub fn write_sector<D: AsRef<[u8]>>(&mut self, sector: u8, data: D) -> Result<()> {
        let data = data.as_ref();
        check_sector(sector)?;
        if data.len() != SECTOR_SIZE {
            return Err(Error::InvalidDataLength {
                expected: SECTOR_SIZE,
                actual: data.len(),
            });
        }

        if let Err(e) = self.authenticate_sector(sector) {
            self.log(&format!("Error: Authenticating sector {sector} failed!"));
            return Err(e.in_sector(sector));
        }
        self.log(&format!("Sector {sector} authenticated successfully."));

        let start = if sector == 0 && self.magic_card_type.is_gen1() {
            1
        } else {
            0
        };
        for offset in start..BLOCKS_PER_SECTOR {
            let chunk = &data[offset as usize * BLOCK_SIZE..][..BLOCK_SIZE];
            if let Err(e) = self.write_block(first_block(sector) + offset, chunk) {
                self.log(&format!(
                    "Error: Writing sector {sector}, block {offset} failed!"
                ));
                return Err(e.in_sector(sector));
            }
            self.log(&format!(
                "Sector {sector}, block {offset} written successfully."
            ));
        }

        self.log(&format!("Sector {sector} written successfully."));
        Ok(())
    }

    /// Write a full 1024 byte image
    ///
    /// Sectors are written in order and the first failing one aborts the
    /// dump, leaving later sectors untouched. On magic cards block 0 is
    /// written last through the magic path.
    #[instrument(level = "debug", skip(self, data))]
    pub fn write_dump<D: AsRef<[u8]>>(&mut self, data: D) -> Result<()> {
        let dump = Dump::from_bytes(data.as_ref())?;
        self.log("Writing dump...");

        for (sector, bytes) in dump.sectors() {
            self.write_sector(sector, bytes)?;
        }

        if self.magic_card_type.is_magic() {
            match self.write_manufacturer_block(dump.manufacturer_block()) {
                Ok(()) => self.log("Manufacturer block written successfully."),
                Err(e) => {
                    self.log("Error: Writing manufacturer block failed!");
                    return Err(Error::ManufacturerBlock {
                        source: Box::new(e),
                    });
                }
            }
        }

        self.log("Dump written successfully.");
        Ok(())
    }

    /// Read the 4 blocks of `sector`
    #[instrument(level = "debug", skip(self))]
    pub fn read_sector(&mut self, sector: u8) -> Result<[Block; BLOCKS_PER_SECTOR as usize]> {
        check_sector(sector)?;
        self.authenticate_sector(sector)
            .map_err(|e| e.in_sector(sector))?;

        let mut blocks = [Block::EMPTY; BLOCKS_PER_SECTOR as usize];
        for (offset, block) in (0..BLOCKS_PER_SECTOR).zip(blocks.iter_mut()) {
            *block = self
                .read_block(first_block(sector) + offset)
                .map_err(|e| e.in_sector(sector))?;
        }
        Ok(blocks)
    }

    /// Read the whole card
    ///
    /// Trailers come back as the card returns them, usually with key A
    /// masked.
    #[instrument(level = "debug", skip(self))]
    pub fn read_dump(&mut self) -> Result<Dump> {
        self.log("Reading dump...");
        let mut dump = Dump::default();
        for sector in 0..SECTOR_COUNT {
            match self.read_sector(sector) {
                Ok(blocks) => {
                    dump.set_sector(sector, &blocks)?;
                    self.log(&format!("Sector {sector} read successfully."));
                }
                Err(e) => {
                    self.log(&format!("Error: Reading sector {sector} failed!"));
                    return Err(e);
                }
            }
        }
        self.log("Dump read successfully.");
        Ok(dump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::crc_a;
    use crate::constants::DUMP_SIZE;
    use crate::mock::{Exchange, MockReader, SimulatedCard};
    use crate::provider::StaticKeyProvider;
    use hex_literal::hex;
    use std::sync::{Arc, Mutex};

    const UID: [u8; 4] = hex!("DEADBEEF");

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();
    }

    fn session(card: SimulatedCard) -> MifareClassic<MockReader> {
        init_tracing();
        let mut card = MifareClassic::new(MockReader::new(card));
        assert!(card.select_card().unwrap());
        card
    }

    fn recorded_logger() -> (Arc<Mutex<Vec<String>>>, impl Logger + Send + 'static) {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        (messages, move |message: &str| {
            sink.lock().unwrap().push(message.to_string())
        })
    }

    /// Image with factory keys, transport access bits and patterned data
    fn sample_dump(uid: [u8; 4]) -> Vec<u8> {
        let mut dump = vec![0u8; DUMP_SIZE];
        for (index, block) in dump.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            if crate::types::is_trailer_block(index as u8) {
                block.copy_from_slice(&hex!("FFFFFFFFFFFF FF078069 FFFFFFFFFFFF"));
            } else {
                block.fill(index as u8 | 0x80);
            }
        }
        let bcc = uid.iter().fold(0, |acc, byte| acc ^ byte);
        dump[..8].copy_from_slice(&[uid[0], uid[1], uid[2], uid[3], bcc, 0x08, 0x04, 0x00]);
        dump
    }

    #[test]
    fn test_select_card_reads_uid() {
        let card = session(SimulatedCard::new(UID, MagicCardType::None));
        assert_eq!(card.uid(), Some(Uid::new(UID)));
        assert!(card.target().unwrap().ats.is_empty());
    }

    #[test]
    fn test_select_card_empty_field() {
        let mut card = MifareClassic::new(MockReader::empty());
        assert!(!card.select_card().unwrap());
        assert_eq!(card.uid(), None);
    }

    #[test]
    fn test_wait_for_card_polls_until_present() {
        let reader = MockReader::new(SimulatedCard::new(UID, MagicCardType::None))
            .with_select_misses(3);
        let mut card = MifareClassic::new(reader);
        card.wait_for_card().unwrap();
        assert_eq!(card.adapter().selections(), 4);
        assert_eq!(card.uid(), Some(Uid::new(UID)));
    }

    #[test]
    fn test_wait_for_card_cancelled() {
        let token = CancellationToken::new();
        let mut card = MifareClassic::builder(MockReader::empty())
            .cancellation(token.clone())
            .config(
                SessionConfig::new()
                    .with_poll_interval(Some(std::time::Duration::from_millis(1))),
            )
            .build();

        let remote = token.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(20));
            remote.cancel();
        });
        assert_eq!(card.wait_for_card(), Err(Error::Cancelled));
        canceller.join().unwrap();
        assert!(card.adapter().selections() >= 1);
    }

    #[test]
    fn test_initialize_device() {
        let mut card = MifareClassic::new(MockReader::empty());
        card.initialize_device().unwrap();
        assert_eq!(
            card.adapter().journal(),
            &[
                Exchange::Init,
                Exchange::SetProperty(Property::InfiniteSelect, false),
                Exchange::SetProperty(Property::AutoIso14443_4, false),
            ]
        );
    }

    #[test]
    fn test_authenticate_frame() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        card.adapter_mut().clear_journal();

        card.authenticate(2, KeyType::A, Key::FACTORY).unwrap();
        assert_eq!(
            card.adapter().frames(),
            vec![&hex!("60 08 FFFFFFFFFFFF DEADBEEF")[..]]
        );
    }

    #[test]
    fn test_authenticate_validation_without_io() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        card.adapter_mut().clear_journal();

        assert_eq!(
            card.authenticate(0, KeyType::A, [0xFF; 5]),
            Err(Error::InvalidKeyLength(5))
        );
        assert_eq!(
            card.authenticate(0, KeyType::A, vec![0xFF; 7]),
            Err(Error::InvalidKeyLength(7))
        );
        assert_eq!(
            card.authenticate(16, KeyType::A, Key::FACTORY),
            Err(Error::InvalidSector(16))
        );
        assert!(card.adapter().journal().is_empty());
    }

    #[test]
    fn test_authenticate_wrong_key_reports_and_reselects() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        card.adapter_mut().clear_journal();

        let err = card.authenticate(1, KeyType::A, [0x00; 6]).unwrap_err();
        assert_eq!(err, Error::Transport(AdapterError::MifareAuthFailed));
        assert_eq!(card.adapter().reported_errors().len(), 1);
        assert_eq!(card.adapter().selections(), 1);
    }

    #[test]
    fn test_frame_rejected_is_silent_but_reselects() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        card.adapter_mut().clear_journal();

        // Not authenticated on sector 3
        let err = card.read_block(12).unwrap_err();
        assert!(err.is_soft_rejection());
        assert!(card.adapter().reported_errors().is_empty());
        assert_eq!(card.adapter().selections(), 1);
    }

    #[test]
    fn test_write_transport_error_is_reported() {
        init_tracing();
        let reader = MockReader::new(SimulatedCard::new(UID, MagicCardType::None))
            .with_failing_write(5, AdapterError::Io);
        let mut card = MifareClassic::new(reader);
        card.select_card().unwrap();
        card.authenticate(1, KeyType::A, Key::FACTORY).unwrap();
        card.adapter_mut().clear_journal();

        let err = card.write_block(5, [0x55; 16]).unwrap_err();
        assert_eq!(err, Error::Transport(AdapterError::Io));
        assert!(!err.is_soft_rejection());
        let reported = card.adapter().reported_errors();
        assert_eq!(reported.len(), 1);
        assert!(reported[0].starts_with("write_block"));
        assert_eq!(card.adapter().selections(), 1);
        assert!(card.adapter().card().unwrap().written_blocks().is_empty());
    }

    #[test]
    fn test_read_transport_error_is_reported() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        card.authenticate(1, KeyType::A, Key::FACTORY).unwrap();
        // Card leaves the field
        card.adapter_mut().set_card(None);
        card.adapter_mut().clear_journal();

        let err = card.read_block(4).unwrap_err();
        assert_eq!(err, Error::Transport(AdapterError::Timeout));
        let reported = card.adapter().reported_errors();
        assert_eq!(reported.len(), 1);
        assert!(reported[0].starts_with("read_block"));
        assert_eq!(card.adapter().selections(), 1);
    }

    #[test]
    fn test_block_bounds_without_io() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        card.adapter_mut().clear_journal();

        assert_eq!(card.read_block(64), Err(Error::InvalidBlock(64)));
        assert_eq!(card.write_block(64, [0; 16]), Err(Error::InvalidBlock(64)));
        assert_eq!(
            card.write_block(1, [0; 15]),
            Err(Error::InvalidDataLength {
                expected: 16,
                actual: 15
            })
        );
        assert!(card.adapter().journal().is_empty());
    }

    #[test]
    fn test_write_then_read_block() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        let data = Block::new(hex!("00112233445566778899AABBCCDDEEFF"));

        for block in [1, 2, 4, 5, 6, 62] {
            card.authenticate(crate::types::sector_of(block), KeyType::A, Key::FACTORY)
                .unwrap();
            card.write_block(block, data).unwrap();
            assert_eq!(card.read_block(block).unwrap(), data);
        }

        let frames = card.adapter().frames();
        assert!(frames.contains(&&hex!("A0 01 00112233445566778899AABBCCDDEEFF")[..]));
        assert!(frames.contains(&&hex!("30 01")[..]));
    }

    #[test]
    fn test_short_read_is_framing_error() {
        let reader = MockReader::new(SimulatedCard::new(UID, MagicCardType::None))
            .with_short_read(1);
        let mut card = MifareClassic::new(reader);
        card.select_card().unwrap();
        card.authenticate(0, KeyType::A, Key::FACTORY).unwrap();
        let selections = card.adapter().selections();

        assert_eq!(
            card.read_block(1),
            Err(Error::Framing {
                expected: 16,
                actual: 4
            })
        );
        assert_eq!(card.adapter().selections(), selections + 1);
    }

    #[test]
    fn test_identify_gen1b() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::Gen1B));
        card.adapter_mut().clear_journal();

        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen1B));
        assert_eq!(card.magic_card_type(), MagicCardType::Gen1B);

        let mut halt = cmd::HALT.to_vec();
        halt.extend_from_slice(&crc_a(&cmd::HALT));
        assert_eq!(
            card.adapter().journal(),
            &[
                Exchange::SetProperty(Property::HandleCrc, false),
                Exchange::SetProperty(Property::EasyFraming, false),
                Exchange::Bytes(halt),
                Exchange::Bits(vec![0x40], 7),
                Exchange::Bytes(vec![0x43]),
                Exchange::SetProperty(Property::HandleCrc, true),
                Exchange::SetProperty(Property::EasyFraming, true),
            ]
        );
        assert_eq!(card.adapter().framing(), (true, true));
    }

    #[test]
    fn test_identify_gen1a() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::Gen1A));
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen1A));
        // The fallback never ran
        assert_eq!(card.adapter().selections(), 1);
    }

    #[test]
    fn test_identify_gen2_by_ats() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::Gen2).with_gen2_ats());
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen2));
        // Identified without touching block 0
        assert!(card.adapter().card().unwrap().written_blocks().is_empty());
    }

    #[test]
    fn test_identify_gen2_by_write_back() {
        let mut card =
            session(SimulatedCard::new(UID, MagicCardType::Gen2).with_ats(&[0x05, 0x78]));
        let before = card.adapter().card().unwrap().block(0);

        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen2));
        let simulated = card.adapter().card().unwrap();
        assert_eq!(simulated.written_blocks(), &[0]);
        assert_eq!(simulated.block(0), before);
    }

    #[test]
    fn test_identify_gen2_ats_only_skips_write_back() {
        init_tracing();
        let reader = MockReader::new(SimulatedCard::new(UID, MagicCardType::Gen2));
        let mut card = MifareClassic::builder(reader)
            .config(SessionConfig::new().with_gen2_probe(Gen2Probe::AtsOnly))
            .build();
        card.select_card().unwrap();

        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::None));
        assert!(card.adapter().card().unwrap().written_blocks().is_empty());
    }

    #[test]
    fn test_identify_generic_card() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::None));
        assert!(card.adapter().card().unwrap().written_blocks().is_empty());
        // Raw framing was left
        assert_eq!(card.adapter().framing(), (true, true));
    }

    #[test]
    fn test_identify_resets_previous_classification() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::Gen1A));
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen1A));

        card.adapter_mut().set_card(Some(SimulatedCard::new(UID, MagicCardType::None)));
        card.select_card().unwrap();
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::None));
    }

    #[test]
    fn test_unlock_aborts_when_framing_cannot_be_set() {
        init_tracing();
        let reader = MockReader::new(SimulatedCard::new(UID, MagicCardType::Gen1A))
            .with_failing_property(Property::EasyFraming);
        let mut card = MifareClassic::new(reader);
        card.select_card().unwrap();
        card.adapter_mut().clear_journal();

        assert_eq!(card.unlock_card(), MagicCardType::None);
        assert_eq!(card.adapter().reported_errors().len(), 1);
        assert!(card.adapter().frames().is_empty());
        // CRC handling turned back on
        assert_eq!(card.adapter().framing(), (true, true));
    }

    #[test]
    fn test_identify_keeps_gen1a_when_framing_restore_fails() {
        init_tracing();
        let reader = MockReader::new(SimulatedCard::new(UID, MagicCardType::Gen1A))
            .with_failing_restore(Property::EasyFraming);
        let mut card = MifareClassic::new(reader);
        card.select_card().unwrap();
        card.adapter_mut().clear_journal();

        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen1A));
        assert_eq!(card.magic_card_type(), MagicCardType::Gen1A);
        assert_eq!(card.adapter().reported_errors().len(), 1);
        // No fallback to the Gen2 checks
        assert_eq!(card.adapter().selections(), 0);
        assert!(card.adapter().card().unwrap().written_blocks().is_empty());
        assert!(
            card.adapter()
                .journal()
                .contains(&Exchange::SetProperty(Property::EasyFraming, true))
        );
    }

    #[test]
    fn test_read_manufacturer_block_gen1a() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::Gen1A));
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen1A));
        card.adapter_mut().clear_journal();

        let block = card.read_manufacturer_block().unwrap();
        assert_eq!(&block[..4], &UID);
        assert_eq!(
            card.adapter().frames(),
            vec![&hex!("60 00 FFFFFFFFFFFF DEADBEEF")[..], &hex!("30 00")[..]]
        );

        let info = card.read_manufacturer_info().unwrap();
        assert_eq!(info.uid, Uid::new(UID));
        assert!(info.is_bcc_valid());
    }

    #[test]
    fn test_read_manufacturer_block_with_provider_key() {
        init_tracing();
        let key = hex!("A0A1A2A3A4A5");
        let reader =
            MockReader::new(SimulatedCard::new(UID, MagicCardType::None).with_key_a(0, key));
        let mut card = MifareClassic::builder(reader)
            .key_provider(StaticKeyProvider::new(Key::new(key)))
            .build();
        card.select_card().unwrap();

        assert_eq!(&card.read_manufacturer_block().unwrap()[..4], &UID);
    }

    #[test]
    fn test_read_manufacturer_block_generic_card_unknown_key() {
        init_tracing();
        let reader = MockReader::new(
            SimulatedCard::new(UID, MagicCardType::None).with_key_a(0, hex!("A0A1A2A3A4A5")),
        );
        let mut card = MifareClassic::builder(reader)
            .key_provider(|_sector: u8, _uid: &Uid| Some(Key::new(hex!("B0B1B2B3B4B5"))))
            .build();
        card.select_card().unwrap();

        let result = card.read_manufacturer_block();
        assert_eq!(result, Err(Error::AuthenticationFailed { sector: 0 }));
        assert_eq!(result.unwrap_or_default(), Block::EMPTY);
        // Both keys tried, no read attempted
        let frames = card.adapter().frames();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|frame| frame[0] == cmd::AUTH_A));
    }

    #[test]
    fn test_read_access_conditions() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        let acs = card.read_access_conditions(5).unwrap();
        assert_eq!(acs, AccessConditions::TRANSPORT);
        assert_eq!(card.adapter().frames().last().unwrap(), &&hex!("30 17")[..]);

        assert_eq!(card.read_access_conditions(16), Err(Error::InvalidSector(16)));
    }

    #[test]
    fn test_read_access_conditions_uses_sector_key() {
        init_tracing();
        let key = hex!("010203040506");
        let reader =
            MockReader::new(SimulatedCard::new(UID, MagicCardType::None).with_key_a(9, key));
        let mut card = MifareClassic::builder(reader)
            .key_provider(move |sector: u8, _uid: &Uid| (sector == 9).then(|| Key::new(key)))
            .build();
        card.select_card().unwrap();

        assert!(card.read_access_conditions(9).unwrap().is_valid());
    }

    #[test]
    fn test_read_access_conditions_unauthenticated() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        card.authenticate(5, KeyType::A, Key::FACTORY).unwrap();
        card.adapter_mut().clear_journal();

        let acs = card.read_access_conditions_unauthenticated(5).unwrap();
        assert_eq!(acs, AccessConditions::TRANSPORT);
        assert_eq!(card.adapter().frames(), vec![&hex!("30 17")[..]]);
        assert_eq!(card.adapter().selections(), 0);

        assert_eq!(
            card.read_access_conditions_unauthenticated(16),
            Err(Error::InvalidSector(16))
        );
        assert_eq!(card.adapter().frames().len(), 1);
    }

    #[test]
    fn test_read_access_conditions_unauthenticated_other_sector() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        card.authenticate(5, KeyType::A, Key::FACTORY).unwrap();

        let err = card.read_access_conditions_unauthenticated(6).unwrap_err();
        assert!(err.is_soft_rejection());
        assert!(
            card.adapter()
                .frames()
                .iter()
                .all(|frame| frame[0] != cmd::AUTH_A || frame[1] == 20)
        );
    }

    #[test]
    fn test_write_sector_logs_progress() {
        init_tracing();
        let (messages, logger) = recorded_logger();
        let reader = MockReader::new(SimulatedCard::new(UID, MagicCardType::None));
        let mut card = MifareClassic::builder(reader).logger(logger).build();
        card.select_card().unwrap();

        let dump = sample_dump(UID);
        card.write_sector(1, &dump[64..128]).unwrap();
        assert_eq!(card.adapter().card().unwrap().written_blocks(), &[4, 5, 6, 7]);
        assert_eq!(
            *messages.lock().unwrap(),
            vec![
                "Sector 1 authenticated successfully.",
                "Sector 1, block 0 written successfully.",
                "Sector 1, block 1 written successfully.",
                "Sector 1, block 2 written successfully.",
                "Sector 1, block 3 written successfully.",
                "Sector 1 written successfully.",
            ]
        );
    }

    #[test]
    fn test_write_sector_validation() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        card.adapter_mut().clear_journal();
        assert_eq!(
            card.write_sector(0, [0u8; 63]),
            Err(Error::InvalidDataLength {
                expected: 64,
                actual: 63
            })
        );
        assert_eq!(card.write_sector(16, [0u8; 64]), Err(Error::InvalidSector(16)));
        assert!(card.adapter().journal().is_empty());
    }

    #[test]
    fn test_write_sector_zero_skips_block_zero_on_gen1() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::Gen1B));
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen1B));

        card.write_sector(0, &sample_dump(UID)[..64]).unwrap();
        assert_eq!(card.adapter().card().unwrap().written_blocks(), &[1, 2, 3]);
    }

    #[test]
    fn test_write_sector_authentication_failure() {
        init_tracing();
        let (messages, logger) = recorded_logger();
        let reader = MockReader::new(
            SimulatedCard::new(UID, MagicCardType::None).with_key_a(2, hex!("A0A1A2A3A4A5")),
        );
        let mut card = MifareClassic::builder(reader).logger(logger).build();
        card.select_card().unwrap();

        let err = card.write_sector(2, [0u8; 64]).unwrap_err();
        assert_eq!(err, Error::AuthenticationFailed { sector: 2 }.in_sector(2));
        assert_eq!(
            *messages.lock().unwrap(),
            vec!["Error: Authenticating sector 2 failed!"]
        );
        assert!(card.adapter().card().unwrap().written_blocks().is_empty());
    }

    #[test]
    fn test_write_dump_gen1a() {
        init_tracing();
        let (messages, logger) = recorded_logger();
        let new_uid = hex!("01020304");
        let reader = MockReader::new(SimulatedCard::new(UID, MagicCardType::Gen1A));
        let mut card = MifareClassic::builder(reader).logger(logger).build();
        card.select_card().unwrap();
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen1A));

        let dump = sample_dump(new_uid);
        card.write_dump(&dump).unwrap();

        let simulated = card.adapter().card().unwrap();
        assert_eq!(simulated.memory(), dump);
        assert_eq!(simulated.written_blocks().first(), Some(&1));
        assert_eq!(simulated.written_blocks().last(), Some(&0));

        let messages = messages.lock().unwrap();
        assert_eq!(messages.first().unwrap(), "Writing dump...");
        assert!(messages.contains(&"Manufacturer block written successfully.".to_string()));
        assert_eq!(messages.last().unwrap(), "Dump written successfully.");
    }

    #[test]
    fn test_write_dump_gen2() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::Gen2).with_gen2_ats());
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen2));

        let dump = sample_dump(hex!("CAFEBABE"));
        card.write_dump(&dump).unwrap();
        let simulated = card.adapter().card().unwrap();
        assert_eq!(simulated.memory(), dump);
        // Block 0 written in the sector loop and again through the magic path
        assert_eq!(simulated.written_blocks().iter().filter(|&&b| b == 0).count(), 2);
    }

    #[test]
    fn test_write_dump_is_idempotent() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::Gen1A));
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen1A));

        let dump = sample_dump(UID);
        card.write_dump(&dump).unwrap();
        let first = card.adapter().card().unwrap().memory();
        card.write_dump(&dump).unwrap();
        assert_eq!(card.adapter().card().unwrap().memory(), first);
    }

    #[test]
    fn test_write_dump_rejects_wrong_length_without_io() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::Gen1A));
        card.adapter_mut().clear_journal();

        assert_eq!(
            card.write_dump(vec![0u8; 1000]),
            Err(Error::InvalidDataLength {
                expected: 1024,
                actual: 1000
            })
        );
        assert!(card.adapter().journal().is_empty());
    }

    #[test]
    fn test_write_dump_stops_at_first_failed_sector() {
        init_tracing();
        let (messages, logger) = recorded_logger();
        // Sector 5, block 2
        let reader = MockReader::new(SimulatedCard::new(UID, MagicCardType::Gen1A))
            .with_failing_write(22, AdapterError::FrameRejected);
        let mut card = MifareClassic::builder(reader).logger(logger).build();
        card.select_card().unwrap();
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen1A));

        let err = card.write_dump(sample_dump(UID)).unwrap_err();
        assert_eq!(err.failed_sector(), Some(5));
        assert!(err.is_soft_rejection());

        let simulated = card.adapter().card().unwrap();
        let written = simulated.written_blocks();
        assert_eq!(written.last(), Some(&21));
        assert!(written.iter().all(|&block| block < 22));
        // Sectors 6 to 15 untouched, block 0 never rewritten
        assert!(!written.contains(&0));
        for block in 24..64 {
            let expected = if crate::types::is_trailer_block(block) {
                hex!("FFFFFFFFFFFF FF078069 FFFFFFFFFFFF")
            } else {
                [0; 16]
            };
            assert_eq!(simulated.block(block), expected);
        }

        let messages = messages.lock().unwrap();
        assert_eq!(messages.last().unwrap(), "Error: Writing sector 5, block 2 failed!");
        assert!(!messages.contains(&"Dump written successfully.".to_string()));
    }

    #[test]
    fn test_write_dump_generic_card_rejects_block_zero() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));

        let err = card.write_dump(sample_dump(UID)).unwrap_err();
        assert_eq!(err.failed_sector(), Some(0));
        assert!(err.is_soft_rejection());
        assert!(card.adapter().card().unwrap().written_blocks().is_empty());
    }

    #[test]
    fn test_write_manufacturer_block_requires_magic_card() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        assert_eq!(
            card.write_manufacturer_block([0u8; 16]),
            Err(Error::UnsupportedCard(MagicCardType::None))
        );
    }

    #[test]
    fn test_write_manufacturer_block_gen1_uses_backdoor() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::Gen1A));
        assert_eq!(card.identify_magic_card_type(), Ok(MagicCardType::Gen1A));
        card.adapter_mut().clear_journal();

        let block = Block::new(hex!("01020304 04 08 0400 0000000000000000"));
        card.write_manufacturer_block(block).unwrap();

        assert_eq!(card.adapter().card().unwrap().block(0), *block);
        // No authentication frame
        assert!(
            card.adapter()
                .frames()
                .iter()
                .all(|frame| frame[0] != cmd::AUTH_A)
        );
        assert!(card.adapter().journal().contains(&Exchange::Bits(vec![0x40], 7)));
    }

    #[test]
    fn test_read_dump() {
        let mut card = session(SimulatedCard::new(UID, MagicCardType::None));
        let dump = card.read_dump().unwrap();

        assert_eq!(dump.manufacturer_block().as_bytes(), &card.adapter().card().unwrap().block(0));
        // Key A masked by the card
        assert_eq!(
            dump.block(7).unwrap().as_bytes(),
            &hex!("000000000000 FF078069 FFFFFFFFFFFF")
        );
    }

    #[test]
    fn test_read_sector_failure_names_sector() {
        init_tracing();
        let reader = MockReader::new(
            SimulatedCard::new(UID, MagicCardType::None).with_key_a(3, hex!("A0A1A2A3A4A5")),
        );
        let mut card = MifareClassic::new(reader);
        card.select_card().unwrap();

        assert!(card.read_sector(2).is_ok());
        let err = card.read_dump().unwrap_err();
        assert_eq!(err.failed_sector(), Some(3));
    }
}
