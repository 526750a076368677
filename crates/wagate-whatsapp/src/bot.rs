//! Bot lifecycle — building, running, and restarting the protocol client.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use wacore::types::events::Event;
use whatsapp_rust::bot::Bot;
use whatsapp_rust_sqlite_storage::SqliteStore;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

use wagate_core::config::shellexpand;
use wagate_core::error::GateError;
use wagate_core::session::{next_state, SessionEvent, SessionState};

use super::events::handle_incoming_message;
use super::WhatsAppSession;

impl WhatsAppSession {
    /// Delete the stale session, build a fresh bot, and run it.
    ///
    /// Used when the phone unlinked this device and the stored keys are
    /// invalidated — the library won't issue new QR codes over stale keys.
    /// Resets the state machine out of its terminal `AuthFailed` state.
    pub async fn restart_for_pairing(&self) -> Result<(), GateError> {
        let dir = shellexpand(&self.config.data_dir);
        let session_dir = format!("{dir}/whatsapp_session");
        if std::path::Path::new(&session_dir).exists() {
            info!("deleting stale WhatsApp session at {session_dir}");
            let _ = std::fs::remove_dir_all(&session_dir);
        }

        // Old bot is now orphaned; its buffered QR is stale.
        *self.client.lock().await = None;
        *self.last_qr.lock().await = None;
        *self.state.lock().await = SessionState::AwaitingAuth;

        let tx = self
            .event_tx
            .lock()
            .await
            .clone()
            .ok_or_else(|| GateError::Session("session not started yet".into()))?;

        self.build_and_run_bot(tx).await
    }

    /// Build the protocol bot with the event handler and run it in the
    /// background.
    ///
    /// Shared by `start()` and `restart_for_pairing()`. The event handler
    /// updates the same `Arc`-wrapped fields regardless of which bot
    /// instance is running.
    pub(crate) async fn build_and_run_bot(
        &self,
        tx: mpsc::Sender<SessionEvent>,
    ) -> Result<(), GateError> {
        let db_path = self.session_db_path();
        info!("WhatsApp bot building (session: {db_path})...");

        let backend = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .map_err(|e| GateError::Session(format!("session store init failed: {e}")))?,
        );

        let client_handle = self.client.clone();
        let state_handle = self.state.clone();
        let qr_tx_handle = self.qr_tx.clone();
        let pair_done_tx_handle = self.pair_done_tx.clone();
        let last_qr_handle = self.last_qr.clone();

        let mut bot = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_device_props(
                Some(self.config.device_name.clone()),
                None,
                Some(waproto::whatsapp::device_props::PlatformType::Desktop),
            )
            .on_event(move |event, client| {
                let tx = tx.clone();
                let client_store = client_handle.clone();
                let state_store = state_handle.clone();
                let qr_fwd = qr_tx_handle.clone();
                let pair_done_fwd = pair_done_tx_handle.clone();
                let last_qr_buf = last_qr_handle.clone();
                async move {
                    match event {
                        Event::PairingQrCode { code, .. } => {
                            info!("WhatsApp QR code issued (scan to pair)");
                            // Buffer the latest QR for replay, then forward
                            // to anyone waiting on the pairing endpoints.
                            *last_qr_buf.lock().await = Some(code.clone());
                            if let Some(sender) = qr_fwd.lock().await.as_ref() {
                                let _ = sender.send(code.clone()).await;
                            }
                            let ev = SessionEvent::QrChallenge(code);
                            let mut st = state_store.lock().await;
                            *st = next_state(*st, &ev);
                            drop(st);
                            let _ = tx.send(ev).await;
                        }
                        Event::PairSuccess(_) => {
                            info!("WhatsApp pairing successful");
                            if let Some(sender) = pair_done_fwd.lock().await.as_ref() {
                                let _ = sender.send(true).await;
                            }
                        }
                        Event::Connected(_) => {
                            *client_store.lock().await = Some(client);
                            // Session is valid; no more QR needed.
                            *last_qr_buf.lock().await = None;
                            // Connected also fires after PairSuccess.
                            if let Some(sender) = pair_done_fwd.lock().await.as_ref() {
                                let _ = sender.send(true).await;
                            }
                            let mut st = state_store.lock().await;
                            *st = next_state(*st, &SessionEvent::Ready);
                            drop(st);
                            let _ = tx.send(SessionEvent::Ready).await;
                        }
                        Event::Disconnected(_) => {
                            warn!("WhatsApp disconnected");
                            *client_store.lock().await = None;
                            let mut st = state_store.lock().await;
                            if *st == SessionState::Ready {
                                *st = SessionState::AwaitingAuth;
                            }
                        }
                        Event::LoggedOut(_) => {
                            *client_store.lock().await = None;
                            let ev =
                                SessionEvent::AuthFailure("logged out by server".to_string());
                            let mut st = state_store.lock().await;
                            *st = next_state(*st, &ev);
                            drop(st);
                            let _ = tx.send(ev).await;
                        }
                        Event::Message(msg, msg_info) => {
                            handle_incoming_message(*msg, msg_info, &tx).await;
                        }
                        _ => {}
                    }
                }
            })
            .build()
            .await
            .map_err(|e| GateError::Session(format!("whatsapp bot build failed: {e}")))?;

        // Store the client handle immediately if already connected.
        *self.client.lock().await = Some(bot.client());

        let _handle = bot
            .run()
            .await
            .map_err(|e| GateError::Session(format!("whatsapp bot run failed: {e}")))?;

        info!("WhatsApp bot started");
        Ok(())
    }
}
