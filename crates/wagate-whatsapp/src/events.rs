//! Incoming message handling — unwrapping and forwarding as notifications.

use tokio::sync::mpsc;
use tracing::debug;

use wagate_core::session::SessionEvent;

/// Turn an incoming protocol message into a `MessageReceived` notification.
///
/// The gateway only observes incoming traffic (it is logged by the
/// lifecycle consumer); nothing downstream replies to it.
pub(super) async fn handle_incoming_message(
    msg: waproto::whatsapp::Message,
    info: wacore::types::message::MessageInfo,
    tx: &mpsc::Sender<SessionEvent>,
) {
    // Our own outgoing messages echo back on the socket; skip them.
    if info.source.is_from_me {
        return;
    }

    // Unwrap nested wrappers (device_sent, ephemeral, view_once).
    let inner = msg
        .device_sent_message
        .as_ref()
        .and_then(|d| d.message.as_deref())
        .or_else(|| {
            msg.ephemeral_message
                .as_ref()
                .and_then(|e| e.message.as_deref())
        })
        .or_else(|| {
            msg.view_once_message
                .as_ref()
                .and_then(|v| v.message.as_deref())
        })
        .unwrap_or(&msg);

    let body = inner
        .conversation
        .as_deref()
        .or_else(|| {
            inner
                .extended_text_message
                .as_ref()
                .and_then(|e| e.text.as_deref())
        })
        .unwrap_or("");

    if body.is_empty() {
        debug!("skipping incoming message without text body");
        return;
    }

    let event = SessionEvent::MessageReceived {
        sender: info.source.sender.to_string(),
        body: body.to_string(),
    };

    if tx.send(event).await.is_err() {
        debug!("session event receiver dropped");
    }
}
