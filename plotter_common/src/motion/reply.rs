//! Reply tokens of the serial protocol.

/// One of the two textual tokens emitted for a command outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Command finished successfully.
    Finished,
    /// Command unknown or failed.
    Unknown,
}

impl Reply {
    pub const FINISHED_TOKEN: &'static str = "ACK\n";
    pub const UNKNOWN_TOKEN: &'static str = "NACK\n";

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Finished => Self::FINISHED_TOKEN,
            Self::Unknown => Self::UNKNOWN_TOKEN,
        }
    }

    /// Map a boolean outcome to a token.
    #[inline]
    pub const fn from_success(ok: bool) -> Self {
        if ok { Self::Finished } else { Self::Unknown }
    }
}
