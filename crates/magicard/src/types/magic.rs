//! Magic card classification

/// Kind of "magic" clone detected on the field
///
/// There is no plain `Gen1` classification: code that applies to first
/// generation cards checks [`MagicCardType::is_gen1`], which covers both
/// Gen1A and Gen1B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, derive_more::Display)]
pub enum MagicCardType {
    /// No backdoor and no writable manufacturer block found
    #[default]
    #[display("Gen1 UID locked")]
    None,
    /// Answers both backdoor unlock commands
    #[display("Gen1A UID changeable (backdoor)")]
    Gen1A,
    /// Answers the first backdoor unlock command only
    #[display("Gen1B UID changeable (backdoor)")]
    Gen1B,
    /// Block 0 writable through a normal authenticated write ("CUID")
    #[display("Gen2 CUID")]
    Gen2,
}

impl MagicCardType {
    /// Gen1A or Gen1B, the backdoor generations
    pub const fn is_gen1(&self) -> bool {
        matches!(self, Self::Gen1A | Self::Gen1B)
    }

    /// Any magic generation
    pub const fn is_magic(&self) -> bool {
        !matches!(self, Self::None)
    }
}
