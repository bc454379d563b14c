//! Core constants for the card-emulation engine.
//!
//! These bounds come from the contactless card standards the engine emulates:
//! UID lengths from ISO 14443-3 anticollision, AID lengths from ISO 7816-4
//! application selection, and the short-APDU frame maximum from ISO 7816-3.
//! The reply budget reflects the reality of a reader terminal holding a
//! transaction open while the phone computes a response.

/// Minimum UID length in bytes (ISO 14443 single-size UID).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (ISO 14443 triple-size UID).
pub const MAX_UID_LENGTH: usize = 10;

/// Minimum AID length in bytes (ISO 7816-4 registered application provider).
pub const MIN_AID_LENGTH: usize = 5;

/// Maximum AID length in bytes (ISO 7816-4).
pub const MAX_AID_LENGTH: usize = 16;

/// Maximum command frame length the engine will inspect in detail (bytes).
///
/// This is the short-APDU maximum: 4 header bytes + Lc + 255 data bytes +
/// Le. Longer frames are still answered (the protocol contract guarantees a
/// status word for every input) but their payload is never copied or parsed
/// beyond classification.
///
/// # Examples
///
/// ```
/// use ghostcard_core::constants::MAX_COMMAND_FRAME_LENGTH;
///
/// assert_eq!(MAX_COMMAND_FRAME_LENGTH, 4 + 1 + 255 + 1);
/// ```
pub const MAX_COMMAND_FRAME_LENGTH: usize = 261;

/// Command reply budget in milliseconds.
///
/// A reader terminal holds the radio link open for a strictly bounded time
/// per command; replies slower than this cause the terminal to abort the
/// transaction. Command dispatch therefore performs no network or disk I/O.
///
/// # Value: 100ms
pub const COMMAND_REPLY_BUDGET_MS: u64 = 100;
