//! The APDU command dispatcher.
//!
//! Effectively stateless between invocations: all durable state lives in the
//! selection handle and the card store. Each invocation is a step function
//! from a raw command frame to a response frame, with a separate deactivation
//! hook that triggers usage accounting.
//!
//! The dispatch contract guarantees a well-formed status-word response to
//! every input. Protocol-expected conditions (no card selected, record not
//! found, short frame) map to their defined status words; any internal
//! failure is downgraded to `6F00` and logged, never surfaced to the
//! terminal as a fault.
//!
//! # Compatibility posture
//!
//! Two behaviors here are deliberate compatibility choices, not bugs:
//!
//! - AID matching is permissive: a SELECT for an AID the card never
//!   advertised still succeeds, because many access-control readers send
//!   AIDs the original card never declared. The mismatch is only logged.
//! - Unknown commands succeed whenever the selected record is loadable, to
//!   maximize compatibility with reader probes the engine does not model.

use crate::bridge::HostCardService;
use crate::cache::CardLookup;
use crate::error::{EngineError, EngineResult};
use crate::selection::SelectionHandle;
use crate::usage::UsageEvent;
use chrono::Utc;
use ghostcard_apdu::{CommandKind, READ_BINARY_MIN_LENGTH, Response, Sw, select_aid};
use ghostcard_core::constants::{COMMAND_REPLY_BUDGET_MS, MAX_COMMAND_FRAME_LENGTH};
use ghostcard_core::{CardId, DeactivationReason, encode_hex};
use ghostcard_storage::CardRecord;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, warn};

/// Protocol state machine: `(command frame) -> response frame`.
///
/// Generic over the synchronous card lookup so tests can substitute a fixed
/// map for the engine's cache.
pub struct ApduDispatcher<L: CardLookup> {
    selection: SelectionHandle,
    cards: L,
    usage_tx: UnboundedSender<UsageEvent>,
    /// The id selected when this session started serving commands. Usage is
    /// accounted against this value, not the live selection, which may
    /// change before the deactivation signal arrives.
    session_card: Mutex<Option<CardId>>,
}

impl<L: CardLookup> ApduDispatcher<L> {
    /// Create a dispatcher over a selection handle and a card lookup.
    pub fn new(
        selection: SelectionHandle,
        cards: L,
        usage_tx: UnboundedSender<UsageEvent>,
    ) -> Self {
        Self {
            selection,
            cards,
            usage_tx,
            session_card: Mutex::new(None),
        }
    }

    /// Produce the response for one inbound command frame.
    ///
    /// Never panics and never returns fewer than 2 bytes; the final two
    /// bytes are always one of the five defined status words.
    pub fn process_command(&self, frame: &[u8]) -> Vec<u8> {
        let started = Instant::now();
        let response = match self.try_dispatch(frame) {
            Ok(response) => response,
            Err(e) => {
                error!("command dispatch failed internally: {e}");
                Response::error(Sw::UNKNOWN_ERROR)
            }
        };
        debug!(
            frame = %encode_hex(frame),
            sw = %format_args!("{:04X}", response.sw()),
            "dispatched command"
        );

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if elapsed_ms > COMMAND_REPLY_BUDGET_MS {
            warn!(elapsed_ms, "dispatch exceeded the reply budget, terminal may abort");
        }

        response.to_bytes()
    }

    /// The radio link ended; account usage for the card that served the
    /// session, if any. Fire-and-forget relative to the protocol path.
    pub fn on_deactivated(&self, reason: DeactivationReason) {
        let served = self.take_session_card();
        debug!(%reason, ?served, "emulation session ended");

        let Some(card_id) = served else {
            return;
        };
        let event = UsageEvent {
            card_id,
            occurred_at: Utc::now(),
        };
        if self.usage_tx.send(event).is_err() {
            // Accounting must never affect dispatch; a gone worker is only
            // log-worthy
            warn!(%card_id, "usage worker unavailable, session not accounted");
        }
    }

    fn try_dispatch(&self, frame: &[u8]) -> EngineResult<Response> {
        if frame.is_empty() {
            return Err(EngineError::EmptyFrame);
        }
        if frame.len() > MAX_COMMAND_FRAME_LENGTH {
            // Still answered; nothing past the classification bytes is read
            debug!(len = frame.len(), "frame exceeds the short-APDU maximum");
        }

        // Without a selection nothing is classified; every frame gets the
        // not-found status
        let Some(card_id) = self.selection.selected_card_id() else {
            return Ok(Response::error(Sw::FILE_NOT_FOUND));
        };
        self.note_session_card(card_id);

        let response = match CommandKind::classify(frame) {
            CommandKind::Select => match self.cards.get(card_id) {
                Some(card) => self.select(&card, frame),
                None => Response::error(Sw::FILE_NOT_FOUND),
            },
            CommandKind::ReadBinary => {
                // Length check first: READ BINARY requires P1, P2, Le
                if frame.len() < READ_BINARY_MIN_LENGTH {
                    Response::error(Sw::WRONG_LENGTH)
                } else {
                    match self.cards.get(card_id) {
                        Some(card) => {
                            Response::success(card.historical_bytes.clone().unwrap_or_default())
                        }
                        None => Response::error(Sw::FILE_NOT_FOUND),
                    }
                }
            }
            CommandKind::GetData => match self.cards.get(card_id) {
                Some(card) => Response::success(card.uid.as_bytes().to_vec()),
                None => Response::error(Sw::FILE_NOT_FOUND),
            },
            // Accepted as no-ops for terminals that probe write/verify
            // support before proceeding
            CommandKind::UpdateBinary | CommandKind::Verify => Response::ok(),
            CommandKind::Other => match self.cards.get(card_id) {
                Some(_) => Response::ok(),
                None => Response::error(Sw::COMMAND_NOT_ALLOWED),
            },
        };

        Ok(response)
    }

    fn select(&self, card: &CardRecord, frame: &[u8]) -> Response {
        if let Some(requested) = select_aid(frame)
            && !card.matches_aid(&requested)
        {
            // Permissive matching: log the mismatch, never reject
            warn!(
                card_id = card.id,
                requested = %requested,
                "terminal requested an AID the card does not advertise"
            );
        }
        Response::success(card.ats.clone().unwrap_or_default())
    }

    fn note_session_card(&self, card_id: CardId) {
        *self
            .session_card
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(card_id);
    }

    fn take_session_card(&self) -> Option<CardId> {
        self.session_card
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<L: CardLookup> HostCardService for ApduDispatcher<L> {
    fn handle_command(&self, frame: &[u8]) -> Vec<u8> {
        self.process_command(frame)
    }

    fn handle_deactivation(&self, reason: DeactivationReason) {
        self.on_deactivated(reason);
    }
}
