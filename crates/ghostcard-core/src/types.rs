use crate::{
    Result,
    constants::{MAX_AID_LENGTH, MAX_UID_LENGTH, MIN_AID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card record identifier, assigned by the store at creation time.
///
/// "No card selected" is always expressed as `Option<CardId>`; the id value
/// `0` is never a sentinel and is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(i64);

impl CardId {
    /// Create a new card id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardId` if the id is not positive.
    pub fn new(id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(Error::InvalidCardId(id));
        }
        Ok(CardId(id))
    }

    /// Get the raw id as i64.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for CardId {
    type Error = Error;

    fn try_from(id: i64) -> Result<Self> {
        CardId::new(id)
    }
}

/// Card hardware identifier (4-10 bytes, ISO 14443).
///
/// Captured once at scan time and immutable afterwards. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardUid(Vec<u8>);

impl CardUid {
    /// Create a new UID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidUid` if the length is outside 4-10 bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidUid(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(CardUid(bytes))
    }

    /// Parse a UID from a hex string (case-insensitive, no separators).
    ///
    /// # Errors
    /// Returns `Error::InvalidUid` if the string is not valid hex or the
    /// decoded length is outside 4-10 bytes.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_hex(s).map_err(Error::InvalidUid)?;
        CardUid::new(bytes)
    }

    /// Get the raw UID bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Render the UID as an uppercase hex string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Application identifier a card advertises (ISO 7816-4 SELECT).
///
/// Stored as normalized uppercase hex so that set membership checks are
/// case-insensitive regardless of how the AID was captured or requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aid(String);

impl Aid {
    /// Create an AID from a hex string, normalizing to uppercase.
    ///
    /// # Errors
    /// Returns `Error::InvalidAid` if the string is not even-length hex or
    /// the decoded length is outside 5-16 bytes.
    pub fn new(hex: &str) -> Result<Self> {
        let bytes = decode_hex(hex).map_err(Error::InvalidAid)?;
        Self::from_bytes(&bytes)
    }

    /// Create an AID from raw bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidAid` if the length is outside 5-16 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let len = bytes.len();
        if !(MIN_AID_LENGTH..=MAX_AID_LENGTH).contains(&len) {
            return Err(Error::InvalidAid(format!(
                "AID must be {MIN_AID_LENGTH}-{MAX_AID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(Aid(encode_hex(bytes)))
    }

    /// Get the AID as its uppercase hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Aid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Aid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Aid::new(s)
    }
}

/// Why the host platform ended an emulation session.
///
/// Informational only: both reasons trigger the same usage accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationReason {
    /// The radio link to the terminal was lost (phone moved away).
    LinkLoss,

    /// The terminal deselected the emulated card.
    Deselected,
}

impl fmt::Display for DeactivationReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeactivationReason::LinkLoss => write!(f, "link loss"),
            DeactivationReason::Deselected => write!(f, "deselected"),
        }
    }
}

/// Render bytes as an uppercase hex string.
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join("")
}

/// Decode a hex string into bytes (case-insensitive, no separators).
fn decode_hex(s: &str) -> std::result::Result<Vec<u8>, String> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(format!("odd-length hex string: {s:?}"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|_| format!("invalid hex at offset {i}: {s:?}"))
        })
        .collect()
}
