//! Command frame classification.
//!
//! The engine dispatches on a small set of command shapes rather than a full
//! ISO 7816-4 parse: emulated cards are read-only identity tokens, so the
//! classification only needs the header bytes and, for SELECT, the requested
//! AID. Frames that match no known shape are still classified (`Other`) and
//! answered; the dispatch contract never rejects a frame outright.

use ghostcard_core::Aid;

/// The 4-byte SELECT-by-AID header: CLA=00, INS=A4, P1=04 (by DF name),
/// P2=00 (first or only occurrence).
pub const SELECT_HEADER: [u8; 4] = [0x00, 0xA4, 0x04, 0x00];

/// Minimum READ BINARY frame length: CLA, INS, P1, P2, Le.
pub const READ_BINARY_MIN_LENGTH: usize = 5;

/// The command shapes the engine distinguishes.
///
/// SELECT requires the full 4-byte header; the remaining shapes match on the
/// CLA/INS pair alone, as readers vary the parameter bytes freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// SELECT application by AID (`00 A4 04 00`).
    Select,

    /// READ BINARY (`00 B0`).
    ReadBinary,

    /// GET DATA (`00 CA`), answered with the card UID.
    GetData,

    /// UPDATE BINARY (`00 D6`), accepted as a no-op.
    UpdateBinary,

    /// VERIFY (`00 20`), accepted as a no-op.
    Verify,

    /// Anything else, including frames too short to carry a CLA/INS pair.
    Other,
}

impl CommandKind {
    /// Classify a raw command frame.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghostcard_apdu::CommandKind;
    ///
    /// assert_eq!(
    ///     CommandKind::classify(&[0x00, 0xA4, 0x04, 0x00, 0x02, 0x3F, 0x00]),
    ///     CommandKind::Select
    /// );
    /// assert_eq!(CommandKind::classify(&[0x00, 0xB0, 0x00]), CommandKind::ReadBinary);
    /// assert_eq!(CommandKind::classify(&[0x80, 0x60, 0x00, 0x00]), CommandKind::Other);
    /// ```
    #[must_use]
    pub fn classify(frame: &[u8]) -> Self {
        if frame.starts_with(&SELECT_HEADER) {
            return CommandKind::Select;
        }
        match frame {
            [0x00, 0xB0, ..] => CommandKind::ReadBinary,
            [0x00, 0xCA, ..] => CommandKind::GetData,
            [0x00, 0xD6, ..] => CommandKind::UpdateBinary,
            [0x00, 0x20, ..] => CommandKind::Verify,
            _ => CommandKind::Other,
        }
    }
}

/// Extract the requested AID from a SELECT frame.
///
/// Returns the AID when the frame carries a length byte at offset 4 and at
/// least that many AID bytes follow; a trailing Le byte is tolerated and
/// ignored. Returns `None` for a header-only SELECT, a truncated body, or an
/// AID whose length falls outside the ISO 7816-4 bounds; the dispatcher
/// treats all of these as "no application requested".
///
/// # Examples
///
/// ```
/// use ghostcard_apdu::select_aid;
///
/// let frame = [0x00, 0xA4, 0x04, 0x00, 0x05, 0xA0, 0x00, 0x00, 0x00, 0x03];
/// assert_eq!(select_aid(&frame).unwrap().as_str(), "A000000003");
///
/// // Header-only SELECT carries no AID
/// assert!(select_aid(&[0x00, 0xA4, 0x04, 0x00]).is_none());
/// ```
#[must_use]
pub fn select_aid(frame: &[u8]) -> Option<Aid> {
    let lc = *frame.get(4)? as usize;
    if lc == 0 {
        return None;
    }
    let body = frame.get(5..5 + lc)?;
    Aid::from_bytes(body).ok()
}
