use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Identifier errors
    #[error("Invalid card id: {0}")]
    InvalidCardId(i64),

    #[error("Invalid UID: {0}")]
    InvalidUid(String),

    #[error("Invalid AID: {0}")]
    InvalidAid(String),
}

pub type Result<T> = std::result::Result<T, Error>;
