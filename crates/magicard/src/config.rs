//! Configuration options for a card session

use std::time::Duration;

/// How far Gen2 detection may go when the ATS does not give the card away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gen2Probe {
    /// Only compare the ATS fingerprint
    AtsOnly,
    /// Also write block 0 back with its own content
    ///
    /// This is a real write to the card.
    #[default]
    WriteBack,
}

/// Configuration options for [`MifareClassic`](crate::MifareClassic)
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Timeout handed to the reader for each exchange, `None` uses the reader default
    pub transceive_timeout: Option<Duration>,

    /// Delay between selection attempts while waiting for a card
    pub poll_interval: Option<Duration>,

    /// Let the reader poll forever on selection
    pub infinite_select: bool,

    /// Let the reader switch to ISO14443-4 on compliant targets
    pub auto_iso14443_4: bool,

    /// Gen2 detection mode
    pub gen2_probe: Gen2Probe,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transceive_timeout: None,
            poll_interval: None,
            // Only try once to find a tag
            infinite_select: false,
            // Read cards that emulate Mifare Classic with ISO14443-4 compliance
            auto_iso14443_4: false,
            gen2_probe: Gen2Probe::WriteBack,
        }
    }
}

impl SessionConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transceive timeout
    pub const fn with_transceive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.transceive_timeout = timeout;
        self
    }

    /// Set the delay between selection attempts
    pub const fn with_poll_interval(mut self, interval: Option<Duration>) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set whether selection polls forever
    pub const fn with_infinite_select(mut self, enable: bool) -> Self {
        self.infinite_select = enable;
        self
    }

    /// Set whether to switch to ISO14443-4 automatically
    pub const fn with_auto_iso14443_4(mut self, enable: bool) -> Self {
        self.auto_iso14443_4 = enable;
        self
    }

    /// Set the Gen2 detection mode
    pub const fn with_gen2_probe(mut self, probe: Gen2Probe) -> Self {
        self.gen2_probe = probe;
        self
    }
}
