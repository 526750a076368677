use crate::{error::GateError, message::Attachment, session::SessionEvent};
use async_trait::async_trait;

/// Messaging session trait — the single backend connection.
///
/// The HTTP handlers depend on this seam instead of the concrete WhatsApp
/// session so they can be exercised against a mock.
#[async_trait]
pub trait Session: Send + Sync {
    /// Human-readable session name.
    fn name(&self) -> &str;

    /// Start the backend connection. Called exactly once per process;
    /// returns a receiver of lifecycle and inbound-message events.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<SessionEvent>, GateError>;

    /// Whether the session is authenticated and able to send.
    async fn is_ready(&self) -> bool;

    /// Send a plain text body to a canonical recipient identifier.
    async fn send_text(&self, chat_id: &str, body: &str) -> Result<(), GateError>;

    /// Send a media attachment with a caption to a canonical recipient
    /// identifier.
    async fn send_media(
        &self,
        chat_id: &str,
        attachment: &Attachment,
        caption: &str,
    ) -> Result<(), GateError>;

    fn as_any(&self) -> &dyn std::any::Any;
}
