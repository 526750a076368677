//! The owned session object and its send operations.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::info;
use whatsapp_rust::client::Client;
use whatsapp_rust::download::MediaType;

use wagate_core::config::{shellexpand, WhatsAppConfig};
use wagate_core::error::GateError;
use wagate_core::message::Attachment;
use wagate_core::session::{SessionEvent, SessionState};
use wagate_core::traits::Session;

use crate::jid::to_jid;

/// The single process-wide WhatsApp session.
///
/// Created once at startup and handed to the HTTP handlers behind
/// `Arc<dyn Session>`. All fields are `Arc`-shared with the running bot's
/// event handler.
pub struct WhatsAppSession {
    pub(crate) config: WhatsAppConfig,
    /// Client handle for sending — set once the backend reports connected.
    pub(crate) client: Arc<Mutex<Option<Arc<Client>>>>,
    /// Explicit lifecycle state, updated by the event handler.
    pub(crate) state: Arc<Mutex<SessionState>>,
    /// Event sender — stored so `restart_for_pairing()` can reuse it.
    pub(crate) event_tx: Arc<Mutex<Option<mpsc::Sender<SessionEvent>>>>,
    /// Sender for QR codes requested through the pairing endpoints.
    pub(crate) qr_tx: Arc<Mutex<Option<mpsc::Sender<String>>>>,
    /// Sender for pairing-done notifications.
    pub(crate) pair_done_tx: Arc<Mutex<Option<mpsc::Sender<bool>>>>,
    /// Last QR code data — buffered so `pairing_channels()` can replay it
    /// even if the QR event fired before anyone started listening.
    pub(crate) last_qr: Arc<Mutex<Option<String>>>,
}

impl WhatsAppSession {
    /// Create a new, uninitialized session from config.
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            config,
            client: Arc::new(Mutex::new(None)),
            state: Arc::new(Mutex::new(SessionState::Uninitialized)),
            event_tx: Arc::new(Mutex::new(None)),
            qr_tx: Arc::new(Mutex::new(None)),
            pair_done_tx: Arc::new(Mutex::new(None)),
            last_qr: Arc::new(Mutex::new(None)),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    /// Create fresh pairing channels. Returns `(qr_rx, done_rx)` receivers
    /// that yield QR code data and the pairing-done signal.
    ///
    /// If a QR code was already generated before this call (e.g. during
    /// startup), it is immediately replayed into `qr_rx`. Calling this
    /// replaces any previous senders (stale receivers get dropped).
    pub async fn pairing_channels(&self) -> (mpsc::Receiver<String>, mpsc::Receiver<bool>) {
        let (qr_tx, qr_rx) = mpsc::channel::<String>(4);
        let (done_tx, done_rx) = mpsc::channel::<bool>(1);

        if let Some(ref qr) = *self.last_qr.lock().await {
            let _ = qr_tx.send(qr.clone()).await;
        }

        *self.qr_tx.lock().await = Some(qr_tx);
        *self.pair_done_tx.lock().await = Some(done_tx);
        (qr_rx, done_rx)
    }

    /// Path of the session key database.
    pub(crate) fn session_db_path(&self) -> String {
        let dir = shellexpand(&self.config.data_dir);
        let session_dir = format!("{dir}/whatsapp_session");
        let _ = std::fs::create_dir_all(&session_dir);
        format!("{session_dir}/whatsapp.db")
    }

    /// Grab the connected client handle or fail with a session error.
    async fn connected_client(&self) -> Result<Arc<Client>, GateError> {
        self.client
            .lock()
            .await
            .clone()
            .ok_or_else(|| GateError::Session("whatsapp client not connected".into()))
    }
}

#[async_trait]
impl Session for WhatsAppSession {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn start(&self) -> Result<mpsc::Receiver<SessionEvent>, GateError> {
        let (tx, rx) = mpsc::channel(64);
        *self.event_tx.lock().await = Some(tx.clone());
        *self.state.lock().await = SessionState::AwaitingAuth;
        self.build_and_run_bot(tx).await?;
        info!("WhatsApp session started");
        Ok(rx)
    }

    async fn is_ready(&self) -> bool {
        self.state.lock().await.is_ready()
    }

    async fn send_text(&self, chat_id: &str, body: &str) -> Result<(), GateError> {
        let client = self.connected_client().await?;
        let jid = to_jid(chat_id)?;

        let msg = waproto::whatsapp::Message {
            conversation: Some(body.to_string()),
            ..Default::default()
        };

        client
            .send_message(jid, msg)
            .await
            .map_err(|e| GateError::Session(format!("whatsapp send failed: {e}")))?;

        Ok(())
    }

    async fn send_media(
        &self,
        chat_id: &str,
        attachment: &Attachment,
        caption: &str,
    ) -> Result<(), GateError> {
        let client = self.connected_client().await?;
        let jid = to_jid(chat_id)?;

        let is_image = attachment.mime_type.starts_with("image/");
        let media_type = if is_image {
            MediaType::Image
        } else {
            MediaType::Document
        };

        let upload = client
            .upload(attachment.data.clone(), media_type)
            .await
            .map_err(|e| GateError::Session(format!("whatsapp media upload failed: {e}")))?;

        let msg = if is_image {
            waproto::whatsapp::Message {
                image_message: Some(Box::new(waproto::whatsapp::message::ImageMessage {
                    mimetype: Some(attachment.mime_type.clone()),
                    caption: Some(caption.to_string()),
                    url: Some(upload.url),
                    direct_path: Some(upload.direct_path),
                    media_key: Some(upload.media_key),
                    file_enc_sha256: Some(upload.file_enc_sha256),
                    file_sha256: Some(upload.file_sha256),
                    file_length: Some(upload.file_length),
                    ..Default::default()
                })),
                ..Default::default()
            }
        } else {
            // Non-image payloads go out as documents so the filename and
            // MIME type survive on the receiving end.
            waproto::whatsapp::Message {
                document_message: Some(Box::new(waproto::whatsapp::message::DocumentMessage {
                    mimetype: Some(attachment.mime_type.clone()),
                    caption: Some(caption.to_string()),
                    file_name: Some(attachment.filename.clone()),
                    url: Some(upload.url),
                    direct_path: Some(upload.direct_path),
                    media_key: Some(upload.media_key),
                    file_enc_sha256: Some(upload.file_enc_sha256),
                    file_sha256: Some(upload.file_sha256),
                    file_length: Some(upload.file_length),
                    ..Default::default()
                })),
                ..Default::default()
            }
        };

        client
            .send_message(jid, msg)
            .await
            .map_err(|e| GateError::Session(format!("whatsapp send failed: {e}")))?;

        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
