//! Session lifecycle state and events.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the single backend session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    /// No connection attempt made yet.
    #[default]
    Uninitialized,
    /// Connecting; waiting for QR scan or stored-session handshake.
    AwaitingAuth,
    /// Authenticated and able to send.
    Ready,
    /// Authentication rejected. Terminal for this session instance;
    /// only an explicit re-pair resets it.
    AuthFailed,
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }
}

/// Lifecycle and inbound notifications emitted by the session.
///
/// Delivered over an mpsc channel and consumed by a single coordinating
/// task; the session itself never blocks on a consumer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A pairing QR code was issued (rotates periodically until scanned).
    QrChallenge(String),
    /// The session is authenticated and connected.
    Ready,
    /// Authentication was rejected by the backend.
    AuthFailure(String),
    /// A message arrived on the session.
    MessageReceived { sender: String, body: String },
}

/// Pure state transition applied for each lifecycle event.
///
/// `AuthFailed` is absorbing: once authentication is rejected, later
/// events do not revive the instance. `restart_for_pairing` resets the
/// state out of band when the operator re-pairs.
pub fn next_state(current: SessionState, event: &SessionEvent) -> SessionState {
    if current == SessionState::AuthFailed {
        return SessionState::AuthFailed;
    }
    match event {
        SessionEvent::QrChallenge(_) => SessionState::AwaitingAuth,
        SessionEvent::Ready => SessionState::Ready,
        SessionEvent::AuthFailure(_) => SessionState::AuthFailed,
        SessionEvent::MessageReceived { .. } => current,
    }
}
