//! Mock reader terminal for testing and development.
//!
//! Simulates the terminal side of an emulation session without any radio
//! hardware: a scripted sequence of command frames is presented to a
//! [`HostCardService`], responses are collected, and the session ends with a
//! deactivation signal, exactly as the platform's host bridge would drive
//! the engine.

use crate::bridge::HostCardService;
use ghostcard_core::DeactivationReason;

/// One command/response exchange observed during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// The command frame the terminal sent
    pub command: Vec<u8>,

    /// The response frame the engine produced
    pub response: Vec<u8>,
}

/// A scripted reader terminal.
///
/// # Examples
///
/// ```no_run
/// use ghostcard_core::DeactivationReason;
/// use ghostcard_engine::{HostCardService, MockTerminal};
///
/// # fn example(engine: &impl HostCardService) {
/// let session = MockTerminal::new()
///     .command([0x00, 0xA4, 0x04, 0x00, 0x05, 0xA0, 0x00, 0x00, 0x00, 0x03])
///     .command([0x00, 0xCA, 0x00, 0x00])
///     .with_reason(DeactivationReason::Deselected)
///     .present_to(engine);
///
/// for exchange in &session {
///     assert!(exchange.response.len() >= 2);
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockTerminal {
    script: Vec<Vec<u8>>,
    reason: DeactivationReason,
}

impl MockTerminal {
    /// Create a terminal with an empty script, deactivating via link loss.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Vec::new(),
            reason: DeactivationReason::LinkLoss,
        }
    }

    /// Append a command frame to the script.
    #[must_use]
    pub fn command(mut self, frame: impl Into<Vec<u8>>) -> Self {
        self.script.push(frame.into());
        self
    }

    /// Set how the session ends.
    #[must_use]
    pub fn with_reason(mut self, reason: DeactivationReason) -> Self {
        self.reason = reason;
        self
    }

    /// Drive one full session: send every scripted command, then deliver
    /// the deactivation signal. Returns the observed exchanges.
    pub fn present_to<S: HostCardService>(&self, service: &S) -> Vec<Exchange> {
        let exchanges = self
            .script
            .iter()
            .map(|command| Exchange {
                command: command.clone(),
                response: service.handle_command(command),
            })
            .collect();
        service.handle_deactivation(self.reason);
        exchanges
    }
}

impl Default for MockTerminal {
    fn default() -> Self {
        Self::new()
    }
}
