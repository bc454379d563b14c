//! The narrow host-facing service interface.
//!
//! The platform's card-emulation facility delivers inbound command frames on
//! a dedicated callback context and expects a synchronous response to each,
//! plus a deactivation signal when the radio link ends. Rather than
//! inheriting from a platform service base class, the engine exposes exactly
//! those two operations as a trait; the platform-specific adapter (outside
//! this crate) forwards its callbacks here.

use ghostcard_core::DeactivationReason;

/// What the host platform needs from a card emulation engine.
///
/// Implementations must answer every command: the terminal protocol is
/// strictly request/response, and an unanswered frame aborts the
/// transaction. `handle_command` is called serially, one frame at a time,
/// and must stay within the reply budget (no blocking I/O).
pub trait HostCardService: Send + Sync {
    /// Produce the response frame for one inbound command frame.
    fn handle_command(&self, frame: &[u8]) -> Vec<u8>;

    /// The radio link ended; account for the finished session.
    fn handle_deactivation(&self, reason: DeactivationReason);
}
