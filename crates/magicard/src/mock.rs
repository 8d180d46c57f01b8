//! Simulated reader and Mifare Classic 1K card
//!
//! [`MockReader`] answers the frames the engine sends the way a PN53x reader
//! with a (possibly magic) card in the field would:
//!
//! - a failed command leaves the card unselected until the next selection
//! - the backdoor answers `0x40` (7 bits) after a HALT on Gen1 cards and
//!   `0x43` on Gen1A cards, in raw framing only
//! - block 0 is writable through normal writes on Gen2 cards only
//! - reading a trailer returns key A as zeros
//!
//! Every exchange is journaled for assertions.

use std::cell::RefCell;
use std::time::Duration;

use crate::adapter::{AdapterError, Modulation, Property, ReaderAdapter, Target, crc_a};
use crate::constants::{ACS_OFFSET, BLOCK_SIZE, BLOCKS_TOTAL, KEY_SIZE, UID_SIZE, cmd, magic};
use crate::types::{AccessConditions, MagicCardType, is_trailer_block, sector_of, trailer_block};

/// One exchange between engine and reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// Initiator initialisation
    Init,
    /// Property toggle
    SetProperty(Property, bool),
    /// Target selection attempt
    Select,
    /// Byte frame
    Bytes(Vec<u8>),
    /// Bit frame with its bit count
    Bits(Vec<u8>, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardState {
    /// Not answering until selected
    Idle,
    /// Selected, not authenticated
    Active,
    /// Halted, only wakes up for the backdoor
    Halted,
    /// Backdoor opened, every block readable and writable
    Unlocked,
    /// Authenticated on a sector
    Authenticated(u8),
}

/// A simulated Mifare Classic 1K card
#[derive(Debug, Clone)]
pub struct SimulatedCard {
    uid: [u8; UID_SIZE],
    ats: Vec<u8>,
    magic: MagicCardType,
    blocks: [[u8; BLOCK_SIZE]; BLOCKS_TOTAL as usize],
    state: CardState,
    written: Vec<u8>,
}

impl SimulatedCard {
    /// Blank card with factory keys and transport access bits
    pub fn new(uid: [u8; UID_SIZE], magic: MagicCardType) -> Self {
        let mut blocks = [[0u8; BLOCK_SIZE]; BLOCKS_TOTAL as usize];
        for (index, block) in blocks.iter_mut().enumerate() {
            if is_trailer_block(index as u8) {
                *block = blank_trailer();
            }
        }
        let bcc = uid.iter().fold(0, |acc, byte| acc ^ byte);
        blocks[0][..UID_SIZE].copy_from_slice(&uid);
        blocks[0][4] = bcc;
        blocks[0][5] = 0x08;
        blocks[0][6..8].copy_from_slice(&[0x04, 0x00]);
        blocks[0][8..].copy_from_slice(&[0x62, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69]);

        Self {
            uid,
            ats: Vec::new(),
            magic,
            blocks,
            state: CardState::Idle,
            written: Vec::new(),
        }
    }

    /// Report this ATS on selection
    pub fn with_ats(mut self, ats: &[u8]) -> Self {
        self.ats = ats.to_vec();
        self
    }

    /// Report the known Gen2 ATS fingerprint on selection
    pub fn with_gen2_ats(self) -> Self {
        let mut ats = magic::GEN2_ATS.to_vec();
        ats.extend_from_slice(&[0x00, 0x00]);
        self.with_ats(&ats)
    }

    /// Replace key A of a sector
    pub fn with_key_a(mut self, sector: u8, key: [u8; KEY_SIZE]) -> Self {
        let trailer = trailer_block(sector * 4) as usize;
        self.blocks[trailer][..KEY_SIZE].copy_from_slice(&key);
        self
    }

    /// Raw content of a block, keys included
    pub fn block(&self, block: u8) -> [u8; BLOCK_SIZE] {
        self.blocks[block as usize]
    }

    /// Raw content of the whole card
    pub fn memory(&self) -> Vec<u8> {
        self.blocks.iter().flatten().copied().collect()
    }

    /// Blocks written so far, in order
    pub fn written_blocks(&self) -> &[u8] {
        &self.written
    }

    const fn is_selected(&self) -> bool {
        !matches!(self.state, CardState::Idle | CardState::Halted)
    }

    const fn may_access(&self, block: u8) -> bool {
        match self.state {
            CardState::Unlocked => true,
            CardState::Authenticated(sector) => sector == sector_of(block),
            _ => false,
        }
    }

    fn authenticate(&mut self, frame: &[u8]) -> Result<usize, AdapterError> {
        if frame.len() != 12 || frame[1] >= BLOCKS_TOTAL || frame[8..12] != self.uid {
            return Err(AdapterError::MifareAuthFailed);
        }
        let trailer = self.blocks[trailer_block(frame[1]) as usize];
        let key = if frame[0] == cmd::AUTH_A {
            &trailer[..KEY_SIZE]
        } else {
            &trailer[BLOCK_SIZE - KEY_SIZE..]
        };
        if key != &frame[2..8] {
            return Err(AdapterError::MifareAuthFailed);
        }
        self.state = CardState::Authenticated(sector_of(frame[1]));
        Ok(0)
    }

    fn read(&self, frame: &[u8], rx: &mut [u8]) -> Result<usize, AdapterError> {
        let block = frame[1];
        if frame.len() != 2 || block >= BLOCKS_TOTAL || !self.may_access(block) {
            return Err(AdapterError::FrameRejected);
        }
        let mut data = self.blocks[block as usize];
        if is_trailer_block(block) {
            data[..KEY_SIZE].fill(0);
        }
        rx[..BLOCK_SIZE].copy_from_slice(&data);
        Ok(BLOCK_SIZE)
    }

    fn write(&mut self, frame: &[u8]) -> Result<usize, AdapterError> {
        let block = frame[1];
        if frame.len() != 2 + BLOCK_SIZE || block >= BLOCKS_TOTAL || !self.may_access(block) {
            return Err(AdapterError::FrameRejected);
        }
        let unlocked = matches!(self.state, CardState::Unlocked);
        if block == 0 && !unlocked && self.magic != MagicCardType::Gen2 {
            return Err(AdapterError::FrameRejected);
        }
        self.blocks[block as usize].copy_from_slice(&frame[2..]);
        self.written.push(block);
        Ok(0)
    }
}

fn blank_trailer() -> [u8; BLOCK_SIZE] {
    let mut trailer = [0xFF; BLOCK_SIZE];
    trailer[ACS_OFFSET..ACS_OFFSET + 4].copy_from_slice(AccessConditions::TRANSPORT.as_bytes());
    trailer
}

/// Simulated reader holding at most one card
#[derive(Debug, Default)]
pub struct MockReader {
    card: Option<SimulatedCard>,
    handle_crc: bool,
    easy_framing: bool,
    journal: Vec<Exchange>,
    reported: RefCell<Vec<String>>,
    select_misses: usize,
    failing_property: Option<Property>,
    failing_restore: Option<Property>,
    failing_write: Option<(u8, AdapterError)>,
    short_read: Option<u8>,
}

impl MockReader {
    /// Reader with `card` in the field
    pub fn new(card: SimulatedCard) -> Self {
        Self {
            card: Some(card),
            handle_crc: true,
            easy_framing: true,
            ..Default::default()
        }
    }

    /// Reader with an empty field
    pub fn empty() -> Self {
        Self {
            handle_crc: true,
            easy_framing: true,
            ..Default::default()
        }
    }

    /// Miss the card on the next `misses` selection attempts
    pub const fn with_select_misses(mut self, misses: usize) -> Self {
        self.select_misses = misses;
        self
    }

    /// Fail every attempt to set `property`
    pub const fn with_failing_property(mut self, property: Property) -> Self {
        self.failing_property = Some(property);
        self
    }

    /// Fail only attempts to enable `property`
    pub const fn with_failing_restore(mut self, property: Property) -> Self {
        self.failing_restore = Some(property);
        self
    }

    /// Answer writes to `block` with `error`
    pub const fn with_failing_write(mut self, block: u8, error: AdapterError) -> Self {
        self.failing_write = Some((block, error));
        self
    }

    /// Answer reads of `block` with a truncated response
    pub const fn with_short_read(mut self, block: u8) -> Self {
        self.short_read = Some(block);
        self
    }

    /// Card in the field
    pub const fn card(&self) -> Option<&SimulatedCard> {
        self.card.as_ref()
    }

    /// Place or remove a card
    pub fn set_card(&mut self, card: Option<SimulatedCard>) {
        self.card = card;
    }

    /// Exchanges so far
    pub fn journal(&self) -> &[Exchange] {
        &self.journal
    }

    /// Forget the exchanges so far
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Byte frames sent so far
    pub fn frames(&self) -> Vec<&[u8]> {
        self.journal
            .iter()
            .filter_map(|exchange| match exchange {
                Exchange::Bytes(frame) => Some(frame.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Number of selection attempts so far
    pub fn selections(&self) -> usize {
        self.journal
            .iter()
            .filter(|exchange| matches!(exchange, Exchange::Select))
            .count()
    }

    /// Contexts passed to the error sink
    pub fn reported_errors(&self) -> Vec<String> {
        self.reported.borrow().clone()
    }

    /// Current framing flags, `(handle_crc, easy_framing)`
    pub const fn framing(&self) -> (bool, bool) {
        (self.handle_crc, self.easy_framing)
    }

    const fn is_raw(&self) -> bool {
        !self.handle_crc && !self.easy_framing
    }

    fn fail(&mut self, error: AdapterError) -> Result<usize, AdapterError> {
        if let Some(card) = self.card.as_mut() {
            card.state = CardState::Idle;
        }
        Err(error)
    }
}

impl ReaderAdapter for MockReader {
    fn initiator_init(&mut self) -> Result<(), AdapterError> {
        self.journal.push(Exchange::Init);
        self.handle_crc = true;
        self.easy_framing = true;
        Ok(())
    }

    fn set_property(&mut self, property: Property, enable: bool) -> Result<(), AdapterError> {
        self.journal.push(Exchange::SetProperty(property, enable));
        if self.failing_property == Some(property)
            || (enable && self.failing_restore == Some(property))
        {
            return Err(AdapterError::Io);
        }
        match property {
            Property::HandleCrc => self.handle_crc = enable,
            Property::EasyFraming => self.easy_framing = enable,
            Property::InfiniteSelect | Property::AutoIso14443_4 => {}
        }
        Ok(())
    }

    fn select_passive_target(
        &mut self,
        _modulation: Modulation,
    ) -> Result<Option<Target>, AdapterError> {
        self.journal.push(Exchange::Select);
        if self.select_misses > 0 {
            self.select_misses -= 1;
            return Ok(None);
        }
        Ok(self.card.as_mut().map(|card| {
            card.state = CardState::Active;
            Target::new(card.uid.to_vec(), card.ats.clone())
        }))
    }

    fn do_transceive_bytes(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        _timeout: Option<Duration>,
    ) -> Result<usize, AdapterError> {
        self.journal.push(Exchange::Bytes(tx.to_vec()));
        let raw = self.is_raw();
        let (failing_write, short_read) = (self.failing_write, self.short_read);
        let Some(card) = self.card.as_mut() else {
            return Err(AdapterError::Timeout);
        };

        if raw {
            let mut halt = cmd::HALT.to_vec();
            halt.extend_from_slice(&crc_a(&cmd::HALT));
            if tx == halt.as_slice() {
                card.state = CardState::Halted;
                // A halted tag does not answer
                return Err(AdapterError::Timeout);
            }
            if tx == [magic::UNLOCK_2]
                && card.state == CardState::Unlocked
                && card.magic == MagicCardType::Gen1A
            {
                rx[0] = magic::ACK;
                return Ok(1);
            }
            return Err(AdapterError::Timeout);
        }

        if !card.is_selected() || tx.len() < 2 {
            return self.fail(AdapterError::Timeout);
        }

        let result = match tx[0] {
            cmd::AUTH_A | cmd::AUTH_B => card.authenticate(tx),
            cmd::READ if short_read == Some(tx[1]) && card.may_access(tx[1]) => {
                rx[..4].fill(0);
                Ok(4)
            }
            cmd::READ => card.read(tx, rx),
            cmd::WRITE => match failing_write {
                Some((block, error)) if block == tx[1] => Err(error),
                _ => card.write(tx),
            },
            _ => Err(AdapterError::FrameRejected),
        };
        match result {
            Ok(len) => Ok(len),
            Err(e) => self.fail(e),
        }
    }

    fn do_transceive_bits(
        &mut self,
        tx: &[u8],
        tx_bits: usize,
        rx: &mut [u8],
    ) -> Result<usize, AdapterError> {
        self.journal.push(Exchange::Bits(tx.to_vec(), tx_bits));
        let raw = self.is_raw();
        let Some(card) = self.card.as_mut() else {
            return Err(AdapterError::Timeout);
        };
        if raw
            && tx.first() == Some(&magic::UNLOCK_1)
            && tx_bits == magic::UNLOCK_1_BITS
            && card.state == CardState::Halted
            && card.magic.is_gen1()
        {
            card.state = CardState::Unlocked;
            rx[0] = magic::ACK;
            // 4-bit answer
            return Ok(4);
        }
        Err(AdapterError::Timeout)
    }

    fn report_error(&self, context: &str, error: &AdapterError) {
        self.reported
            .borrow_mut()
            .push(format!("{context}: {error}"));
    }
}
